// Procedural brick map generation.
//
// Fills a baseplate with a requested number of distinct catalog bricks, one at
// a time, with no backtracking. The generator keeps a *frontier* of pegs,
// meaning cells where a new brick cell may go, and grows it as bricks land.
//
// ## Algorithm
//
// 1. Draw `nr_bricks` distinct catalog entries (`catalog::sample_catalog`).
//    Draw order is placement order.
// 2. Seed the frontier with the baseplate's top face: every cell on layer 0
//    above the plate.
// 3. For each entry:
//    a. Enumerate candidates: for every peg, both orientations, and every
//       cell offset within the brick (the peg may sit under any cell of the
//       brick), build the footprint and keep it if it stays over the
//       baseplate's columns and touches no placed brick. Candidates reached
//       through several (peg, orientation, offset) triples are kept once per
//       triple. That duplication weights the random pick toward busier
//       spots and is intentional.
//    b. No candidates: the run fails with `GenerationFailure::NoPlacement`.
//    c. Otherwise pick one uniformly and commit it.
//    d. Drop the brick's cells from the frontier. Add the free cell above
//       each of its cells (below the height cap), and, for bricks above
//       layer 0, the free cell below each of its cells so later bricks can
//       hang underneath.
// 4. Re-check that all placed footprints are pairwise disjoint. A failure here
//    is a generator bug and surfaces as `InvariantViolation`.
//
// Peg semantics: a peg names the cell a brick occupies, so a brick placed
// through peg `p` sits on layer `p.y`. The baseplate itself is layer -1.
//
// See also: `catalog.rs` for the draw, `config.rs` for plate size and height
// cap, `map.rs` for `BrickMap` (the materialized result), `validator.rs` for
// the independent whole-map check.
//
// **Critical constraint: determinism.** All randomness comes from the
// `BrickRng` passed by the caller. The frontier is a `BTreeSet` so candidate
// enumeration order, and therefore the pick for a given random draw, is
// stable.

use crate::brick::{BrickDef, Footprint, block_footprint};
use crate::catalog::{CatalogEntry, sample_catalog};
use crate::config::GeneratorConfig;
use crate::error::{BrickError, GenerationFailure, InvariantViolation, Result};
use crate::map::BrickMap;
use crate::prng::BrickRng;
use crate::types::{BASEPLATE_LAYER, Baseplate, Point};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// A footprint the current brick could take, with the orientation that
/// produced it.
#[derive(Clone, Debug)]
struct Candidate {
    width: u32,
    depth: u32,
    points: Footprint,
}

/// Ephemeral state of one generation run.
struct PlacementState {
    baseplate: Baseplate,
    max_height: Option<u32>,
    frontier: BTreeSet<Point>,
    placed: Vec<BrickDef>,
    /// Cell → index into `placed`.
    occupied: BTreeMap<Point, usize>,
}

impl PlacementState {
    fn new(config: &GeneratorConfig) -> Self {
        let baseplate = config.baseplate();
        let frontier = baseplate.footprint().into_iter().map(Point::above).collect();
        Self {
            baseplate,
            max_height: config.max_height,
            frontier,
            placed: Vec::new(),
            occupied: BTreeMap::new(),
        }
    }

    fn below_height_cap(&self, point: Point) -> bool {
        self.max_height
            .is_none_or(|cap| i64::from(point.y) < i64::from(cap))
    }

    fn is_free(&self, point: Point) -> bool {
        !self.occupied.contains_key(&point)
    }

    /// Every (peg, orientation, offset) placement that fits. Not deduplicated.
    fn candidates(&self, entry: &CatalogEntry) -> Vec<Candidate> {
        let mut found = Vec::new();
        for &peg in &self.frontier {
            for (width, depth) in entry.orientations() {
                for x_offset in 0..width as i32 {
                    for z_offset in 0..depth as i32 {
                        let anchor = peg + (-x_offset, 0, -z_offset);
                        let points = block_footprint(anchor, width, depth);
                        let fits = points.iter().all(|&p| {
                            self.baseplate.covers_column(p.x, p.z) && self.is_free(p)
                        });
                        if fits {
                            found.push(Candidate {
                                width,
                                depth,
                                points,
                            });
                        }
                    }
                }
            }
        }
        found
    }

    /// Record a placement and update the frontier.
    fn commit(&mut self, def: BrickDef) {
        let index = self.placed.len();
        for &p in &def.points {
            self.frontier.remove(&p);
            self.occupied.insert(p, index);
        }
        for &p in &def.points {
            let above = p.above();
            if self.is_free(above) && self.below_height_cap(above) {
                self.frontier.insert(above);
            }
            let below = p.below();
            if below.y > BASEPLATE_LAYER && self.is_free(below) {
                self.frontier.insert(below);
            }
        }
        self.placed.push(def);
    }
}

/// Confirm no two bricks share a cell.
fn check_disjoint(placed: &[BrickDef]) -> std::result::Result<(), InvariantViolation> {
    for (i, a) in placed.iter().enumerate() {
        for (j, b) in placed.iter().enumerate().skip(i + 1) {
            if let Some(&point) = a.points.iter().find(|p| b.points.contains(p)) {
                return Err(InvariantViolation {
                    first: i,
                    second: j,
                    point,
                });
            }
        }
    }
    Ok(())
}

/// Place `nr_bricks` distinct catalog bricks on the configured baseplate.
///
/// Returns the placements in placement order. Fails with
/// `GenerationFailure::CatalogExhausted` if `nr_bricks` exceeds the catalog
/// (before any placement), or `GenerationFailure::NoPlacement` if some brick
/// in the draw has nowhere to go.
pub fn generate_bricks(
    nr_bricks: usize,
    config: &GeneratorConfig,
    rng: &mut BrickRng,
) -> Result<Vec<BrickDef>> {
    config.validate()?;
    let draw = sample_catalog(nr_bricks, rng)?;
    let mut state = PlacementState::new(config);

    for (step, entry) in draw.iter().enumerate() {
        let mut candidates = state.candidates(entry);
        let Some(choice) = rng.choose_index(candidates.len()) else {
            warn!(step, %entry, placed = state.placed.len(), "no valid placement");
            return Err(GenerationFailure::NoPlacement {
                step,
                requested: nr_bricks,
                entry: *entry,
            }
            .into());
        };
        let picked = candidates.swap_remove(choice);
        debug!(
            step,
            %entry,
            candidates = candidates.len() + 1,
            layer = picked.points[0].y,
            frontier = state.frontier.len(),
            "placing brick"
        );
        state.commit(BrickDef {
            width: picked.width,
            depth: picked.depth,
            color: entry.color,
            points: picked.points,
        });
    }

    check_disjoint(&state.placed)?;
    info!(bricks = state.placed.len(), "generation complete");
    Ok(state.placed)
}

/// Turn a finished run into a `BrickMap` the size of the baseplate.
///
/// Height is the configured cap if there is one, otherwise just tall enough
/// for the highest brick (at least one layer).
pub fn materialize(placed: Vec<BrickDef>, config: &GeneratorConfig) -> Result<BrickMap> {
    let top = placed
        .iter()
        .flat_map(|def| def.points.iter().map(|p| p.y))
        .max()
        .unwrap_or(0);
    let height = config.max_height.unwrap_or((top + 1).max(1) as u32);
    let mut map = BrickMap::new(
        config.baseplate_width,
        height,
        config.baseplate_depth,
        config.map_name.clone(),
    );
    for def in placed {
        map.place_brick(def.into_brick())?;
    }
    Ok(map)
}

/// Generate and materialize a map in one go.
pub fn generate_map(
    nr_bricks: usize,
    config: &GeneratorConfig,
    rng: &mut BrickRng,
) -> Result<BrickMap> {
    let placed = generate_bricks(nr_bricks, config, rng)?;
    materialize(placed, config)
}

/// Like `generate_map`, but redraws the catalog after a `NoPlacement`, up to
/// `config.max_attempts` runs in total. Any other error returns immediately.
pub fn generate_map_with_retries(
    nr_bricks: usize,
    config: &GeneratorConfig,
    rng: &mut BrickRng,
) -> Result<BrickMap> {
    let mut attempt = 1;
    loop {
        match generate_map(nr_bricks, config, rng) {
            Err(err) if err.is_retryable() && attempt < config.max_attempts => {
                warn!(attempt, max_attempts = config.max_attempts, %err, "retrying generation");
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Convenience for callers holding a `BrickError`: did generation fail in an
/// expected way?
pub fn is_generation_failure(err: &BrickError) -> bool {
    matches!(err, BrickError::Generation(_))
}
