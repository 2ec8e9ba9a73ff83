// brick_map: bounded 3D brick grids and a random placement generator.
//
// This crate holds all brick-map logic. It performs no network I/O and never
// reads the clock or OS entropy; the only filesystem access is the optional
// `JsonFileStore` in `storage.rs`.
//
// Module overview:
// - `types.rs`:     Point, BrickColor, Baseplate.
// - `brick.rs`:     Brick (persisted) and BrickDef (generation-time) entities.
// - `map.rs`:       BrickMap + the sparse occupancy grid; single-brick add/remove.
// - `validator.rs`: Whole-map overlap and support checks, returning violations.
// - `catalog.rs`:   The fixed 28-entry color × size catalog and sampling.
// - `generator.rs`: Frontier-driven randomized placement of catalog bricks.
// - `config.rs`:    GeneratorConfig, tunable generation parameters.
// - `storage.rs`:   MapStore trait with in-memory and JSON-file backends.
// - `error.rs`:     BrickError and the generation failure taxonomy.
// - `prng`:         Re-exported from `brick_prng` (xoshiro256++ with SplitMix64 seeding).
//
// **Critical constraint: determinism.** Generation is a pure function of
// `(config, request, rng state)`. All randomness comes from the `BrickRng`
// passed by the caller. Ordered collections (`BTreeMap`/`BTreeSet`) are used
// wherever iteration order can influence a random choice.

pub mod brick;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod map;
pub use brick_prng as prng;
pub mod storage;
pub mod types;
pub mod validator;

pub use error::{BrickError, Result};
