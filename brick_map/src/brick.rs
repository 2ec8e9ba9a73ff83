// Brick entities.
//
// Two shapes of the same idea:
//
// - `Brick`: a persisted brick inside a `BrickMap`: color tag, display name,
//   and the footprint cells it occupies. Bricks exist only inside a map and
//   are addressed by their index in `BrickMap::bricks`, never by value.
// - `BrickDef`: a generation-time placement produced by `generator.rs`,
//   carrying the catalog color and placed dimensions. Materialized into a
//   `Brick` via `into_brick()` once a run succeeds.
//
// Footprint invariant: non-empty, and every cell on the same y layer. Enforced
// by `Brick::new()` and re-checked for bricks parsed from the wire (see
// `map.rs`). Footprint equality is set-based: two bricks listing the same
// cells in a different order are the same brick.
//
// See also: `map.rs` for the owning container, `catalog.rs` for where
// `BrickDef` dimensions come from.

use crate::error::{BrickError, Result};
use crate::types::{BrickColor, Point};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Footprint storage. The largest catalog brick (2×4) has 8 cells.
pub type Footprint = SmallVec<[Point; 8]>;

/// Largest block `BrickMap::add_brick` will build.
pub const MAX_BRICK_CELLS: u64 = 4096;

/// The `width × depth` block of cells on `anchor`'s layer whose minimum
/// corner is `anchor`. Width runs along X, depth along Z.
pub fn block_footprint(anchor: Point, width: u32, depth: u32) -> Footprint {
    let mut cells = Footprint::with_capacity((width * depth) as usize);
    for dz in 0..depth as i32 {
        for dx in 0..width as i32 {
            cells.push(anchor + (dx, 0, dz));
        }
    }
    cells
}

// ---------------------------------------------------------------------------
// Brick
// ---------------------------------------------------------------------------

/// A brick stored in a map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Brick {
    pub color: String,
    pub name: String,
    pub points: Footprint,
}

impl Brick {
    /// Build a brick, checking the footprint invariant.
    pub fn new(
        color: impl Into<String>,
        name: impl Into<String>,
        points: impl IntoIterator<Item = Point>,
    ) -> Result<Self> {
        let brick = Self {
            color: color.into(),
            name: name.into(),
            points: points.into_iter().collect(),
        };
        brick.check_footprint()?;
        Ok(brick)
    }

    /// Verify the footprint is non-empty and lies on a single layer.
    pub fn check_footprint(&self) -> Result<()> {
        let Some(first) = self.points.first() else {
            return Err(BrickError::MalformedBrick(format!(
                "brick `{}` has an empty footprint",
                self.name
            )));
        };
        if let Some(stray) = self.points.iter().find(|p| p.y != first.y) {
            return Err(BrickError::MalformedBrick(format!(
                "brick `{}` spans layers {} and {}",
                self.name, first.y, stray.y
            )));
        }
        Ok(())
    }

    /// Bounding-box extent along X and Z, as `(width, depth)`.
    pub fn dimensions(&self) -> (u32, u32) {
        let Some(first) = self.points.first() else {
            return (0, 0);
        };
        let (mut min_x, mut max_x, mut min_z, mut max_z) = (first.x, first.x, first.z, first.z);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_z = min_z.min(p.z);
            max_z = max_z.max(p.z);
        }
        // In i64: a parsed footprint may span the whole i32 range.
        let extent = |min: i32, max: i32| {
            u32::try_from(i64::from(max) - i64::from(min) + 1).unwrap_or(u32::MAX)
        };
        (extent(min_x, max_x), extent(min_z, max_z))
    }

    pub fn occupies(&self, point: Point) -> bool {
        self.points.contains(&point)
    }

    /// Human-readable one-liner, e.g. "A red brick of size 2x1."
    pub fn describe(&self) -> String {
        let (width, depth) = self.dimensions();
        format!("A {} brick of size {}x{}.", self.color, width, depth)
    }

    /// Footprint in ascending point order, for set-based comparison.
    pub fn sorted_points(&self) -> Footprint {
        let mut points = self.points.clone();
        points.sort_unstable();
        points.dedup();
        points
    }

    /// Total order used to compare maps as brick multisets.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.color
            .cmp(&other.color)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.sorted_points().cmp(&other.sorted_points()))
    }
}

impl PartialEq for Brick {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }
}

impl Eq for Brick {}

// ---------------------------------------------------------------------------
// BrickDef
// ---------------------------------------------------------------------------

/// A brick placed by the generator, before materialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrickDef {
    /// Extent along X as placed (after orientation).
    pub width: u32,
    /// Extent along Z as placed (after orientation).
    pub depth: u32,
    pub color: BrickColor,
    pub points: Footprint,
}

impl BrickDef {
    /// Display name used once materialized, e.g. "Red 2x4".
    pub fn display_name(&self) -> String {
        format!("{} {}x{}", self.color, self.width, self.depth)
    }

    pub fn into_brick(self) -> Brick {
        let name = self.display_name();
        Brick {
            color: self.color.as_str().to_owned(),
            name,
            points: self.points,
        }
    }
}
