// The fixed brick catalog.
//
// Generation draws from 28 canonical entries: the cross product of the four
// catalog colors with seven sizes (1×1, 1×2, 1×3, 1×4, 2×2, 2×3, 2×4). Each
// entry can be used at most once per run, so a run can place at most
// `CATALOG_SIZE` bricks.
//
// `full_catalog()` builds the list deterministically (colors outer, sizes
// inner); `sample_catalog()` draws distinct entries without replacement. The
// draw order is also the placement order.

use crate::error::GenerationFailure;
use crate::prng::BrickRng;
use crate::types::BrickColor;
use std::fmt;

/// Catalog sizes as `(width, depth)`, narrow side first.
pub const CATALOG_SIZES: [(u32, u32); 7] = [(1, 1), (1, 2), (1, 3), (1, 4), (2, 2), (2, 3), (2, 4)];

pub const CATALOG_SIZE: usize = CATALOG_SIZES.len() * BrickColor::ALL.len();

/// One kind of brick the generator may place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    pub width: u32,
    pub depth: u32,
    pub color: BrickColor,
}

impl CatalogEntry {
    pub const fn new(width: u32, depth: u32, color: BrickColor) -> Self {
        Self {
            width,
            depth,
            color,
        }
    }

    /// Both placements of the brick: as listed, and rotated a quarter turn.
    /// Square bricks yield the same shape twice.
    pub fn orientations(&self) -> [(u32, u32); 2] {
        [(self.width, self.depth), (self.depth, self.width)]
    }

    pub fn cell_count(&self) -> u32 {
        self.width * self.depth
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.color, self.width, self.depth)
    }
}

/// All 28 entries, colors outer, sizes inner.
pub fn full_catalog() -> Vec<CatalogEntry> {
    BrickColor::ALL
        .iter()
        .flat_map(|&color| {
            CATALOG_SIZES
                .iter()
                .map(move |&(width, depth)| CatalogEntry::new(width, depth, color))
        })
        .collect()
}

/// Draw `count` distinct entries uniformly without replacement.
///
/// Fails with `CatalogExhausted` when `count` exceeds the catalog, before any
/// random number is consumed.
pub fn sample_catalog(
    count: usize,
    rng: &mut BrickRng,
) -> Result<Vec<CatalogEntry>, GenerationFailure> {
    let catalog = full_catalog();
    if count > catalog.len() {
        return Err(GenerationFailure::CatalogExhausted {
            requested: count,
            available: catalog.len(),
        });
    }
    let picks = rng
        .sample_indices(catalog.len(), count)
        .ok_or(GenerationFailure::CatalogExhausted {
            requested: count,
            available: catalog.len(),
        })?;
    Ok(picks.into_iter().map(|i| catalog[i]).collect())
}
