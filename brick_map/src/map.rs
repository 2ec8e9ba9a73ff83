// Brick maps and the spatial occupancy model.
//
// A `BrickMap` is a bounded `width × height × depth` grid plus the ordered
// list of bricks placed in it. Alongside the brick list it keeps an
// `OccupancyGrid`: a sparse ordered index from each occupied in-bounds cell
// to the brick that owns it. Map dimensions only bound coordinates; they
// never size an allocation.
//
// Single-brick operations:
// - `add_brick()`  : place a `width × depth` block at an anchor. Every cell is
//   checked (bounds first, then occupancy) before anything is written, so a
//   failed placement never leaves a partial brick behind.
// - `remove_brick()`: release every cell of the brick owning a point and drop
//   the brick. Later bricks shift down one index; the grid is re-indexed.
//
// The grid is transient: it is skipped on serialization and rebuilt from the
// brick list on load (`rebuild_occupancy()`). A parsed map may be
// inconsistent (overlaps, cells out of bounds). The rebuild tolerates that:
// out-of-bounds cells are skipped and the most recent claimant wins a
// contested cell. Use `validator.rs` to report such problems.
//
// Wire format (see `to_json()` / `from_json()`):
//   {"metadata": {width, height, depth, name, timestamp}, "bricks": [...]}
//
// See also: `brick.rs` for `Brick`, `validator.rs` for whole-map checks,
// `generator.rs` which materializes generated placements into a `BrickMap`.

use crate::brick::{Brick, MAX_BRICK_CELLS, block_footprint};
use crate::error::{BrickError, Result};
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

// ---------------------------------------------------------------------------
// Occupancy grid
// ---------------------------------------------------------------------------

/// Sparse cell → owning-brick-index grid.
///
/// Memory follows the number of occupied cells, not the map volume, so a map
/// parsed with enormous dimensions costs no more than its bricks.
#[derive(Clone, Debug, Default)]
pub struct OccupancyGrid {
    cells: BTreeMap<Point, usize>,
    size_x: u32,
    size_y: u32,
    size_z: u32,
}

impl OccupancyGrid {
    /// Create an empty grid.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        Self {
            cells: BTreeMap::new(),
            size_x,
            size_y,
            size_z,
        }
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.z >= 0
            && (point.x as u32) < self.size_x
            && (point.y as u32) < self.size_y
            && (point.z as u32) < self.size_z
    }

    /// Owner of a cell. `None` for empty or out-of-bounds cells.
    pub fn get(&self, point: Point) -> Option<usize> {
        self.cells.get(&point).copied()
    }

    /// Write a cell. No-op for out-of-bounds points.
    pub fn set(&mut self, point: Point, owner: Option<usize>) {
        if !self.in_bounds(point) {
            return;
        }
        match owner {
            Some(index) => {
                self.cells.insert(point, index);
            }
            None => {
                self.cells.remove(&point);
            }
        }
    }

    /// After brick `removed` is deleted from the list, every later brick moves
    /// down one slot.
    fn shift_down_after(&mut self, removed: usize) {
        for owner in self.cells.values_mut() {
            if *owner > removed {
                *owner -= 1;
            }
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// Occupied cells ordered by layer, then z, then x.
    fn by_layer(&self) -> BTreeMap<(i32, i32, i32), (Point, usize)> {
        self.cells
            .iter()
            .map(|(&p, &owner)| ((p.y, p.z, p.x), (p, owner)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Opposite corner of a `width × depth` block anchored at `anchor`, or `None`
/// if it lies beyond the coordinate range. Both extents must be non-zero.
fn far_corner(anchor: Point, width: u32, depth: u32) -> Option<Point> {
    let dx = i32::try_from(width - 1).ok()?;
    let dz = i32::try_from(depth - 1).ok()?;
    Some(Point::new(
        anchor.x.checked_add(dx)?,
        anchor.y,
        anchor.z.checked_add(dz)?,
    ))
}

/// Map-level metadata, serialized under `"metadata"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapMetadata {
    pub width: u32,
    /// Vertical extent (number of layers).
    pub height: u32,
    pub depth: u32,
    pub name: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Raw wire document; validated into a `BrickMap` on deserialization.
#[derive(Deserialize)]
pub struct MapDocument {
    pub metadata: MapMetadata,
    pub bricks: Vec<Brick>,
}

/// A bounded grid owning an ordered list of bricks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "MapDocument")]
pub struct BrickMap {
    pub metadata: MapMetadata,
    bricks: Vec<Brick>,
    #[serde(skip)]
    occupancy: OccupancyGrid,
}

impl TryFrom<MapDocument> for BrickMap {
    type Error = BrickError;

    fn try_from(doc: MapDocument) -> Result<Self> {
        Self::from_parts(doc.metadata, doc.bricks)
    }
}

impl BrickMap {
    /// Create an empty map.
    pub fn new(width: u32, height: u32, depth: u32, name: impl Into<String>) -> Self {
        Self {
            metadata: MapMetadata {
                width,
                height,
                depth,
                name: name.into(),
                timestamp: None,
            },
            bricks: Vec::new(),
            occupancy: OccupancyGrid::new(width, height, depth),
        }
    }

    /// Assemble a map from metadata and an existing brick list without
    /// placement checks. Each brick's footprint invariant is still enforced.
    pub fn from_parts(metadata: MapMetadata, bricks: Vec<Brick>) -> Result<Self> {
        for brick in &bricks {
            brick.check_footprint()?;
        }
        let mut map = Self {
            occupancy: OccupancyGrid::default(),
            metadata,
            bricks,
        };
        map.rebuild_occupancy();
        Ok(map)
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.metadata.timestamp = Some(timestamp.into());
        self
    }

    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    pub fn depth(&self) -> u32 {
        self.metadata.depth
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        self.occupancy.in_bounds(point)
    }

    /// Index of the brick owning `point`, if any.
    pub fn owner_of(&self, point: Point) -> Option<usize> {
        self.occupancy.get(point)
    }

    pub fn brick_at(&self, point: Point) -> Option<&Brick> {
        self.owner_of(point).map(|i| &self.bricks[i])
    }

    /// Place a `width × depth` brick whose minimum corner is `anchor`.
    ///
    /// Fails with `OutOfBounds` if any cell leaves the map, or `CellOccupied`
    /// if any cell is taken. Bounds are checked for every cell before
    /// occupancy is checked for any, and nothing is written until both pass.
    /// Blocks larger than `MAX_BRICK_CELLS` fail with `MalformedBrick`.
    pub fn add_brick(
        &mut self,
        anchor: Point,
        width: u32,
        depth: u32,
        color: impl Into<String>,
    ) -> Result<&Brick> {
        let color = color.into();
        let name = format!("{color} {width}x{depth}");
        if u64::from(width) * u64::from(depth) > MAX_BRICK_CELLS {
            return Err(BrickError::MalformedBrick(format!(
                "brick `{name}` exceeds {MAX_BRICK_CELLS} cells"
            )));
        }
        if width > 0 && depth > 0 {
            // The map is a box, so both corners in bounds means every cell is.
            let outside = if !self.in_bounds(anchor) {
                Some(anchor)
            } else {
                match far_corner(anchor, width, depth) {
                    Some(corner) if self.in_bounds(corner) => None,
                    Some(corner) => Some(corner),
                    None => Some(anchor),
                }
            };
            if let Some(point) = outside {
                return Err(self.out_of_bounds(point));
            }
        }
        let brick = Brick::new(color, name, block_footprint(anchor, width, depth))?;
        let index = self.place_brick(brick)?;
        Ok(&self.bricks[index])
    }

    /// Place an arbitrary single-layer brick. Returns its index.
    pub fn place_brick(&mut self, brick: Brick) -> Result<usize> {
        brick.check_footprint()?;
        if let Some(&point) = brick.points.iter().find(|&&p| !self.in_bounds(p)) {
            return Err(self.out_of_bounds(point));
        }
        for &point in &brick.points {
            if let Some(owner) = self.occupancy.get(point) {
                return Err(BrickError::CellOccupied { point, owner });
            }
        }

        let index = self.bricks.len();
        for &point in &brick.points {
            self.occupancy.set(point, Some(index));
        }
        debug!(index, name = %brick.name, cells = brick.points.len(), "placed brick");
        self.bricks.push(brick);
        Ok(index)
    }

    fn out_of_bounds(&self, point: Point) -> BrickError {
        BrickError::OutOfBounds {
            point,
            width: self.width(),
            height: self.height(),
            depth: self.depth(),
        }
    }

    /// Remove the brick owning `point`, releasing all of its cells.
    pub fn remove_brick(&mut self, point: Point) -> Result<Brick> {
        let index = self
            .occupancy
            .get(point)
            .ok_or(BrickError::BrickNotFound(point))?;
        let brick = self.bricks.remove(index);
        for &cell in &brick.points {
            if self.occupancy.get(cell) == Some(index) {
                self.occupancy.set(cell, None);
            }
        }
        self.occupancy.shift_down_after(index);
        debug!(index, name = %brick.name, "removed brick");
        Ok(brick)
    }

    /// Recompute the occupancy grid from the brick list.
    pub fn rebuild_occupancy(&mut self) {
        let mut grid = OccupancyGrid::new(self.width(), self.height(), self.depth());
        for (index, brick) in self.bricks.iter().enumerate() {
            for &point in &brick.points {
                grid.set(point, Some(index));
            }
        }
        self.occupancy = grid;
    }

    /// Occupied cells with their owner's description, grouped by layer.
    /// Diagnostic only.
    pub fn describe(&self) -> String {
        let mut layers: BTreeMap<i32, Vec<(Point, usize)>> = BTreeMap::new();
        for ((y, _, _), cell) in self.occupancy.by_layer() {
            layers.entry(y).or_default().push(cell);
        }

        if layers.is_empty() {
            return format!("Map `{}` is empty.\n", self.name());
        }
        let mut out = String::new();
        for (y, cells) in &layers {
            let _ = writeln!(out, "Layer {y}:");
            for (point, owner) in cells {
                let _ = writeln!(
                    out,
                    "  {point}: #{owner} {}",
                    self.bricks[*owner].describe()
                );
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the wire format. Rejects bricks with empty or multi-layer
    /// footprints and rebuilds the occupancy grid.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: MapDocument = serde_json::from_str(json)?;
        Self::try_from(doc)
    }

    /// Bricks in canonical order, for order-insensitive comparison.
    fn canonical_bricks(&self) -> Vec<&Brick> {
        let mut bricks: Vec<&Brick> = self.bricks.iter().collect();
        bricks.sort_by(|a, b| a.canonical_cmp(b));
        bricks
    }
}

/// Same metadata and the same multiset of bricks, in any order.
impl PartialEq for BrickMap {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.bricks.len() == other.bricks.len()
            && self.canonical_bricks() == other.canonical_bricks()
    }
}

impl Eq for BrickMap {}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> BrickMap {
        BrickMap::new(6, 1, 6, "test")
    }

    #[test]
    fn add_brick_claims_every_cell() {
        let mut map = small_map();
        map.add_brick(Point::new(0, 0, 0), 2, 1, "red").unwrap();
        assert_eq!(map.owner_of(Point::new(0, 0, 0)), Some(0));
        assert_eq!(map.owner_of(Point::new(1, 0, 0)), Some(0));
        assert_eq!(map.owner_of(Point::new(2, 0, 0)), None);
        assert_eq!(map.brick_count(), 1);
    }

    #[test]
    fn occupied_then_freed_scenario() {
        let mut map = small_map();
        map.add_brick(Point::new(0, 0, 0), 2, 1, "red").unwrap();

        let err = map.add_brick(Point::new(0, 0, 0), 1, 1, "blue").unwrap_err();
        assert!(matches!(
            err,
            BrickError::CellOccupied { point, owner: 0 } if point == Point::new(0, 0, 0)
        ));

        map.remove_brick(Point::new(1, 0, 0)).unwrap();
        let blue = map.add_brick(Point::new(0, 0, 0), 1, 1, "blue").unwrap();
        assert_eq!(blue.color, "blue");
        assert_eq!(map.brick_count(), 1);
    }

    #[test]
    fn out_of_bounds_is_reported_before_occupancy() {
        let mut map = small_map();
        map.add_brick(Point::new(4, 0, 0), 1, 1, "red").unwrap();
        // Overlaps the red brick at (4,0,0) AND pokes out at x=6.
        let err = map.add_brick(Point::new(4, 0, 0), 3, 1, "blue").unwrap_err();
        assert!(matches!(err, BrickError::OutOfBounds { .. }));
    }

    #[test]
    fn out_of_bounds_layer_and_negative_coords() {
        let mut map = small_map();
        assert!(matches!(
            map.add_brick(Point::new(0, 1, 0), 1, 1, "red"),
            Err(BrickError::OutOfBounds { .. })
        ));
        assert!(matches!(
            map.add_brick(Point::new(-1, 0, 0), 2, 1, "red"),
            Err(BrickError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn failed_placement_leaves_no_partial_brick() {
        let mut map = small_map();
        map.add_brick(Point::new(1, 0, 1), 1, 1, "red").unwrap();
        // 2x2 at (0,0,0) collides only on its last cell.
        assert!(map.add_brick(Point::new(0, 0, 0), 2, 2, "blue").is_err());
        assert_eq!(map.owner_of(Point::new(0, 0, 0)), None);
        assert_eq!(map.owner_of(Point::new(1, 0, 0)), None);
        assert_eq!(map.brick_count(), 1);
        assert_eq!(map.occupancy.occupied_count(), 1);
    }

    #[test]
    fn remove_empty_cell_is_not_found() {
        let mut map = small_map();
        let err = map.remove_brick(Point::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, BrickError::BrickNotFound(_)));
    }

    #[test]
    fn remove_reindexes_later_bricks() {
        let mut map = small_map();
        map.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        map.add_brick(Point::new(2, 0, 0), 1, 2, "green").unwrap();
        map.add_brick(Point::new(4, 0, 0), 2, 2, "blue").unwrap();

        let removed = map.remove_brick(Point::new(0, 0, 0)).unwrap();
        assert_eq!(removed.color, "red");
        assert_eq!(map.owner_of(Point::new(2, 0, 1)), Some(0));
        assert_eq!(map.owner_of(Point::new(5, 0, 1)), Some(1));
        assert_eq!(map.brick_at(Point::new(5, 0, 1)).unwrap().color, "blue");
    }

    #[test]
    fn describe_groups_by_layer() {
        let mut map = BrickMap::new(5, 2, 5, "layers");
        map.add_brick(Point::new(0, 0, 0), 2, 1, "red").unwrap();
        map.add_brick(Point::new(2, 1, 2), 1, 1, "blue").unwrap();
        let text = map.describe();
        assert!(text.contains("Layer 0:"));
        assert!(text.contains("Layer 1:"));
        assert!(text.contains("A red brick of size 2x1."));
        assert!(text.contains("(2, 1, 2): #1 A blue brick of size 1x1."));
        assert!(text.find("Layer 0:").unwrap() < text.find("Layer 1:").unwrap());
    }

    #[test]
    fn describe_empty_map() {
        assert!(small_map().describe().contains("is empty"));
    }

    #[test]
    fn json_roundtrip_preserves_map() {
        let mut map = BrickMap::new(6, 3, 6, "roundtrip").with_timestamp("2026-01-01T00:00:00Z");
        map.add_brick(Point::new(0, 0, 0), 2, 1, "red").unwrap();
        map.add_brick(Point::new(2, 1, 2), 2, 2, "blue").unwrap();

        let json = map.to_json().unwrap();
        let restored = BrickMap::from_json(&json).unwrap();
        assert_eq!(restored, map);
        // Transient grid is rebuilt.
        assert_eq!(restored.owner_of(Point::new(3, 1, 3)), Some(1));
    }

    #[test]
    fn equality_ignores_brick_order() {
        let mut a = small_map();
        a.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        a.add_brick(Point::new(3, 0, 3), 1, 1, "blue").unwrap();
        let mut b = small_map();
        b.add_brick(Point::new(3, 0, 3), 1, 1, "blue").unwrap();
        b.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wire_document_shape() {
        let mut map = small_map();
        map.add_brick(Point::new(0, 0, 0), 1, 1, "red").unwrap();
        let value: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(value["metadata"]["width"], 6);
        assert_eq!(value["metadata"]["height"], 1);
        assert_eq!(value["metadata"]["timestamp"], serde_json::Value::Null);
        assert_eq!(value["bricks"][0]["points"][0]["x"], 0);
        assert!(value.get("occupancy").is_none());
    }

    #[test]
    fn from_json_rejects_empty_points() {
        let json = r#"{
            "metadata": {"width": 6, "height": 1, "depth": 6, "name": "bad", "timestamp": null},
            "bricks": [{"color": "red", "name": "ghost", "points": []}]
        }"#;
        assert!(matches!(
            BrickMap::from_json(json),
            Err(BrickError::MalformedBrick(_))
        ));
    }

    #[test]
    fn from_json_rejects_wrong_schema() {
        assert!(matches!(
            BrickMap::from_json(r#"{"bricks": []}"#),
            Err(BrickError::Json(_))
        ));
    }

    #[test]
    fn from_json_tolerates_inconsistent_maps() {
        // Overlapping bricks parse fine; the most recent claimant owns the cell.
        let json = r#"{
            "metadata": {"width": 6, "height": 1, "depth": 6, "name": "overlap"},
            "bricks": [
                {"color": "red", "name": "a", "points": [{"x": 2, "y": 0, "z": 3}]},
                {"color": "blue", "name": "b", "points": [
                    {"x": 2, "y": 0, "z": 3},
                    {"x": 9, "y": 0, "z": 3}
                ]}
            ]
        }"#;
        let map = BrickMap::from_json(json).unwrap();
        assert_eq!(map.brick_count(), 2);
        assert_eq!(map.owner_of(Point::new(2, 0, 3)), Some(1));
        assert_eq!(map.metadata.timestamp, None);
    }

    #[test]
    fn maximal_dimensions_parse_without_sizing_a_grid() {
        let json = r#"{
            "metadata": {
                "width": 4294967295, "height": 4294967295, "depth": 4294967295,
                "name": "vast"
            },
            "bricks": [{"color": "red", "name": "r", "points": [{"x": 7, "y": 0, "z": 9}]}]
        }"#;
        let map = BrickMap::from_json(json).unwrap();
        assert_eq!(map.owner_of(Point::new(7, 0, 9)), Some(0));
        assert_eq!(map.occupancy.occupied_count(), 1);
        assert!(map.describe().contains("(7, 0, 9): #0"));
    }

    #[test]
    fn large_new_map_accepts_bricks_anywhere_in_range() {
        let mut map = BrickMap::new(100_000, 100_000, 1, "wide");
        map.add_brick(Point::new(99_998, 0, 99_990), 2, 4, "blue").unwrap();
        assert_eq!(map.owner_of(Point::new(99_999, 0, 99_993)), Some(0));
        assert!(matches!(
            map.add_brick(Point::new(99_999, 0, 0), 2, 1, "red"),
            Err(BrickError::OutOfBounds { point, .. }) if point == Point::new(100_000, 0, 0)
        ));
    }

    #[test]
    fn add_brick_near_coordinate_limit_is_out_of_bounds() {
        let mut map = BrickMap::new(u32::MAX, 1, u32::MAX, "edge");
        let anchor = Point::new(i32::MAX, 0, 0);
        assert!(matches!(
            map.add_brick(anchor, 2, 1, "red"),
            Err(BrickError::OutOfBounds { point, .. }) if point == anchor
        ));
        assert_eq!(map.brick_count(), 0);
    }

    #[test]
    fn add_brick_rejects_oversized_blocks() {
        let mut map = BrickMap::new(100_000, 1, 100_000, "huge");
        assert!(matches!(
            map.add_brick(Point::new(0, 0, 0), 100_000, 100_000, "red"),
            Err(BrickError::MalformedBrick(_))
        ));
        assert!(matches!(
            map.add_brick(Point::new(0, 0, 0), 0, 3, "red"),
            Err(BrickError::MalformedBrick(_))
        ));
    }

    #[test]
    fn serde_deserialize_goes_through_validation() {
        let json = r#"{
            "metadata": {"width": 2, "height": 1, "depth": 2, "name": "x", "timestamp": null},
            "bricks": [{"color": "red", "name": "r", "points": [{"x": 0, "y": 0, "z": 0}]}]
        }"#;
        let map: BrickMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.owner_of(Point::new(0, 0, 0)), Some(0));
    }
}
