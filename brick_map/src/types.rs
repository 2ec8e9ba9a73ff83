// Core spatial types shared across the crate.
//
// Defines grid coordinates (`Point`), the catalog colors (`BrickColor`), and
// the implicit `Baseplate` that every map sits on. All types derive
// `Serialize`/`Deserialize`; `Point` serializes as `{"x":..,"y":..,"z":..}`,
// which is exactly the wire shape of a footprint cell.
//
// Coordinate conventions:
// - X and Z are horizontal grid axes.
// - Y is the vertical layer. Bricks are one layer tall.
// - The baseplate lives on layer `BASEPLATE_LAYER` (-1), directly beneath
//   the first map layer (0).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Layer occupied by the baseplate, one below the lowest map layer.
pub const BASEPLATE_LAYER: i32 = -1;

/// Side length of the standard square baseplate.
pub const STANDARD_BASEPLATE_SIZE: u32 = 6;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A cell in the 3D grid. Immutable value type; `Ord` gives a total order so
/// points can key `BTreeMap`s and `BTreeSet`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell directly above (y + 1).
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    /// The cell directly below (y - 1).
    pub const fn below(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    /// Like `above`, but `None` at the top of the coordinate range.
    pub fn checked_above(self) -> Option<Self> {
        Some(Self::new(self.x, self.y.checked_add(1)?, self.z))
    }

    /// Like `below`, but `None` at the bottom of the coordinate range.
    pub fn checked_below(self) -> Option<Self> {
        Some(Self::new(self.x, self.y.checked_sub(1)?, self.z))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Add<(i32, i32, i32)> for Point {
    type Output = Point;

    fn add(self, (dx, dy, dz): (i32, i32, i32)) -> Point {
        Point::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Colors available in the generation catalog.
///
/// Persisted bricks carry their color as a free-form string (manually placed
/// bricks may use any color name); this enum only enumerates the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BrickColor {
    Yellow,
    Red,
    Green,
    Blue,
}

impl BrickColor {
    /// Catalog order. Catalog construction iterates colors in this order.
    pub const ALL: [BrickColor; 4] = [
        BrickColor::Yellow,
        BrickColor::Red,
        BrickColor::Green,
        BrickColor::Blue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BrickColor::Yellow => "Yellow",
            BrickColor::Red => "Red",
            BrickColor::Green => "Green",
            BrickColor::Blue => "Blue",
        }
    }
}

impl fmt::Display for BrickColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Baseplate
// ---------------------------------------------------------------------------

/// The implicit, unremovable ground plate under every map.
///
/// Covers `x in [0, width)`, `z in [0, depth)` on layer `BASEPLATE_LAYER`.
/// It is never stored as a brick; the generator seeds its frontier from the
/// baseplate's top face and the validator counts it as support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseplate {
    pub width: u32,
    pub depth: u32,
}

impl Baseplate {
    pub const fn new(width: u32, depth: u32) -> Self {
        Self { width, depth }
    }

    /// The standard 6×6 plate.
    pub const fn standard() -> Self {
        Self::new(STANDARD_BASEPLATE_SIZE, STANDARD_BASEPLATE_SIZE)
    }

    /// Whether `point` is one of the baseplate's own cells.
    pub fn contains(&self, point: Point) -> bool {
        point.y == BASEPLATE_LAYER && self.covers_column(point.x, point.z)
    }

    /// Whether the column `(x, z)` lies over the plate.
    pub fn covers_column(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as u32) < self.width && (z as u32) < self.depth
    }

    /// All baseplate cells, x inner, z outer.
    pub fn footprint(&self) -> Vec<Point> {
        let mut cells = Vec::with_capacity(self.width as usize * self.depth as usize);
        for z in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                cells.push(Point::new(x, BASEPLATE_LAYER, z));
            }
        }
        cells
    }
}

impl Default for Baseplate {
    fn default() -> Self {
        Self::standard()
    }
}
