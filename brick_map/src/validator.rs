// Whole-map physical plausibility checks.
//
// Runs over a finished `BrickMap`, however it was built (manual placement,
// generation, or parsed from the wire), and reports problems as data:
//
// - Overlap: bricks are visited in list order while tracking, per cell, the
//   most recent brick to claim it. Re-claiming a cell reports that most
//   recent claimant and the new brick. Earlier claimants of the same cell are
//   not re-reported.
// - Support: a brick is supported when at least one of its cells has another
//   brick or the baseplate directly above or directly below it. Bricks with
//   no such cell are reported with their full footprint. The baseplate
//   defaults to the map's own width and depth.
//
// Validation never fails. An empty result means the map is consistent.
//
// See also: `map.rs` for `BrickMap`, `types.rs` for `Baseplate`,
// `generator.rs` whose output should always validate clean.

use crate::map::BrickMap;
use crate::types::{Baseplate, Point};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A single problem found in a map. Brick references are indices into
/// `BrickMap::bricks()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Overlap {
        /// Most recent earlier brick holding the cell.
        first: usize,
        second: usize,
        point: Point,
    },
    Unsupported {
        brick: usize,
        points: Vec<Point>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Overlap {
                first,
                second,
                point,
            } => write!(f, "bricks #{first} and #{second} overlap at {point}"),
            Violation::Unsupported { brick, points } => {
                write!(f, "brick #{brick} is unsupported (")?;
                for (i, p) in points.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Validate against a baseplate spanning the map's full width and depth,
/// which is the plate a generated map was built on.
pub fn validate(map: &BrickMap) -> Vec<Violation> {
    validate_with_baseplate(map, &Baseplate::new(map.width(), map.depth()))
}

pub fn validate_with_baseplate(map: &BrickMap, baseplate: &Baseplate) -> Vec<Violation> {
    let mut violations = overlap_violations(map);
    violations.extend(support_violations(map, baseplate));
    debug!(
        map = map.name(),
        bricks = map.brick_count(),
        violations = violations.len(),
        "validated map"
    );
    violations
}

pub fn is_valid(map: &BrickMap) -> bool {
    validate(map).is_empty()
}

fn overlap_violations(map: &BrickMap) -> Vec<Violation> {
    let mut claims: BTreeMap<Point, usize> = BTreeMap::new();
    let mut violations = Vec::new();
    for (index, brick) in map.bricks().iter().enumerate() {
        for &point in &brick.points {
            match claims.insert(point, index) {
                Some(previous) if previous != index => violations.push(Violation::Overlap {
                    first: previous,
                    second: index,
                    point,
                }),
                _ => {}
            }
        }
    }
    violations
}

fn support_violations(map: &BrickMap, baseplate: &Baseplate) -> Vec<Violation> {
    let mut claimants: BTreeMap<Point, Vec<usize>> = BTreeMap::new();
    for (index, brick) in map.bricks().iter().enumerate() {
        for &point in &brick.points {
            claimants.entry(point).or_default().push(index);
        }
    }

    let held_by_other = |cell: Point, index: usize| {
        baseplate.contains(cell)
            || claimants
                .get(&cell)
                .is_some_and(|owners| owners.iter().any(|&o| o != index))
    };

    map.bricks()
        .iter()
        .enumerate()
        .filter(|(index, brick)| {
            !brick.points.iter().any(|p| {
                // Cells past the edge of the coordinate range hold nothing.
                let above = p.checked_above().is_some_and(|c| held_by_other(c, *index));
                let below = p.checked_below().is_some_and(|c| held_by_other(c, *index));
                above || below
            })
        })
        .map(|(index, brick)| Violation::Unsupported {
            brick: index,
            points: brick.points.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brick::Brick;
    use crate::map::MapMetadata;

    fn metadata(height: u32) -> MapMetadata {
        MapMetadata {
            width: 6,
            height,
            depth: 6,
            name: "validator".into(),
            timestamp: None,
        }
    }

    #[test]
    fn empty_map_is_valid() {
        assert!(validate(&BrickMap::new(6, 1, 6, "empty")).is_empty());
    }

    #[test]
    fn grounded_stack_is_valid() {
        let mut map = BrickMap::new(6, 3, 6, "stack");
        map.add_brick(Point::new(0, 0, 0), 2, 2, "red").unwrap();
        map.add_brick(Point::new(1, 1, 1), 2, 2, "blue").unwrap();
        map.add_brick(Point::new(2, 2, 2), 1, 1, "green").unwrap();
        assert!(is_valid(&map));
    }

    #[test]
    fn shared_point_reports_one_overlap() {
        let bricks = vec![
            Brick::new("red", "a", [Point::new(2, 0, 3), Point::new(3, 0, 3)]).unwrap(),
            Brick::new("blue", "b", [Point::new(2, 0, 3), Point::new(2, 0, 4)]).unwrap(),
        ];
        let map = BrickMap::from_parts(metadata(1), bricks).unwrap();
        assert_eq!(
            validate(&map),
            vec![Violation::Overlap {
                first: 0,
                second: 1,
                point: Point::new(2, 0, 3)
            }]
        );
    }

    #[test]
    fn overlap_names_only_most_recent_claimant() {
        let cell = Point::new(1, 0, 1);
        let bricks = vec![
            Brick::new("red", "a", [cell]).unwrap(),
            Brick::new("blue", "b", [cell]).unwrap(),
            Brick::new("green", "c", [cell]).unwrap(),
        ];
        let map = BrickMap::from_parts(metadata(1), bricks).unwrap();
        let overlaps: Vec<_> = validate(&map)
            .into_iter()
            .filter(|v| matches!(v, Violation::Overlap { .. }))
            .collect();
        assert_eq!(
            overlaps,
            vec![
                Violation::Overlap {
                    first: 0,
                    second: 1,
                    point: cell
                },
                Violation::Overlap {
                    first: 1,
                    second: 2,
                    point: cell
                },
            ]
        );
    }

    #[test]
    fn floating_brick_is_unsupported() {
        let mut map = BrickMap::new(6, 7, 6, "float");
        map.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        map.add_brick(Point::new(3, 5, 3), 2, 1, "blue").unwrap();
        assert_eq!(
            validate(&map),
            vec![Violation::Unsupported {
                brick: 1,
                points: vec![Point::new(3, 5, 3), Point::new(4, 5, 3)],
            }]
        );
    }

    #[test]
    fn hanging_brick_is_supported_from_above() {
        let mut map = BrickMap::new(6, 3, 6, "hang");
        map.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        map.add_brick(Point::new(0, 1, 0), 1, 1, "yellow").unwrap();
        map.add_brick(Point::new(0, 2, 0), 2, 1, "blue").unwrap();
        // Nothing under (1,1,0); it hangs from the blue overhang.
        map.add_brick(Point::new(1, 1, 0), 1, 1, "green").unwrap();
        assert!(is_valid(&map));
    }

    #[test]
    fn layer_zero_outside_baseplate_needs_other_support() {
        let mut map = BrickMap::new(10, 1, 10, "wide");
        map.add_brick(Point::new(8, 0, 8), 1, 1, "red").unwrap();
        assert_eq!(
            validate_with_baseplate(&map, &Baseplate::standard()).len(),
            1
        );
        // The default plate spans the whole map.
        assert!(validate(&map).is_empty());
    }

    #[test]
    fn bricks_at_coordinate_extremes_do_not_overflow() {
        let metadata = MapMetadata {
            width: 1,
            height: u32::MAX,
            depth: 1,
            name: "extreme".into(),
            timestamp: None,
        };
        let bricks = vec![
            Brick::new("red", "top", [Point::new(0, i32::MAX, 0)]).unwrap(),
            Brick::new("blue", "bottom", [Point::new(0, i32::MIN, 0)]).unwrap(),
        ];
        let map = BrickMap::from_parts(metadata, bricks).unwrap();
        let violations = validate(&map);
        assert_eq!(violations.len(), 2);
        assert!(
            violations
                .iter()
                .all(|v| matches!(v, Violation::Unsupported { .. }))
        );
    }

    #[test]
    fn side_contact_is_not_support() {
        let mut map = BrickMap::new(6, 3, 6, "side");
        map.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        map.add_brick(Point::new(0, 1, 0), 1, 1, "blue").unwrap();
        map.add_brick(Point::new(1, 1, 0), 1, 1, "green").unwrap();
        let violations = validate(&map);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::Unsupported { brick: 2, .. }));
    }

    #[test]
    fn violations_serialize_with_kind_tag() {
        let v = Violation::Overlap {
            first: 0,
            second: 1,
            point: Point::new(2, 0, 3),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "overlap");
        assert_eq!(json["point"]["z"], 3);
        assert_eq!(v.to_string(), "bricks #0 and #1 overlap at (2, 0, 3)");
    }
}
