// Error taxonomy for brick map operations.
//
// `BrickError` is the single error type returned by fallible library calls.
// Generation has two outcomes worth telling apart from everything else:
//
// - `GenerationFailure`: the expected "this draw could not be placed" (or
//   "more bricks requested than the catalog holds") result. Callers match on
//   it and may retry with a fresh draw.
// - `InvariantViolation`: the post-generation disjointness check failed.
//   That is a generator bug, never a normal outcome.
//
// `ErrorClass` maps each variant onto the client/internal split a request
// layer needs (4xx vs 5xx). Validation findings are not errors at all; see
// `validator::Violation`.

use crate::catalog::CatalogEntry;
use crate::types::Point;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrickError>;

/// Whether an error is the caller's fault or ours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad request or unlucky draw; safe to report back to the caller.
    Client,
    /// Broken invariant or failed I/O.
    Internal,
}

#[derive(Debug, Error)]
pub enum BrickError {
    #[error("cell {point} lies outside the {width}x{height}x{depth} map")]
    OutOfBounds {
        point: Point,
        width: u32,
        height: u32,
        depth: u32,
    },
    #[error("cell {point} is already occupied by brick #{owner}")]
    CellOccupied { point: Point, owner: usize },
    #[error("no brick occupies {0}")]
    BrickNotFound(Point),
    #[error("map `{0}` not found")]
    MapNotFound(String),
    #[error("malformed brick: {0}")]
    MalformedBrick(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Generation(#[from] GenerationFailure),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Malformed JSON in a request payload or map file.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The backing store file could not be parsed or encoded.
    #[error("map store {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BrickError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BrickError::OutOfBounds { .. }
            | BrickError::CellOccupied { .. }
            | BrickError::BrickNotFound(_)
            | BrickError::MapNotFound(_)
            | BrickError::MalformedBrick(_)
            | BrickError::Config(_)
            | BrickError::Generation(_)
            | BrickError::Json(_) => ErrorClass::Client,
            BrickError::Invariant(_) | BrickError::Io(_) | BrickError::Store { .. } => {
                ErrorClass::Internal
            }
        }
    }

    /// True for both "not found" flavors (empty cell, unknown map id).
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrickError::BrickNotFound(_) | BrickError::MapNotFound(_))
    }

    /// Only a failed placement is worth retrying with a fresh random draw.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrickError::Generation(GenerationFailure::NoPlacement { .. })
        )
    }
}

/// Expected generation outcomes other than success.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// More bricks requested than the catalog holds. Raised before any
    /// placement is attempted.
    #[error("requested {requested} bricks but the catalog only holds {available}")]
    CatalogExhausted { requested: usize, available: usize },
    /// No candidate footprint for the brick at position `step` of the draw.
    #[error("no valid placement for {entry} (brick {step} of {requested})")]
    NoPlacement {
        step: usize,
        requested: usize,
        entry: CatalogEntry,
    },
}

/// Two generated bricks share a cell. Indicates a generator defect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("generated bricks #{first} and #{second} both occupy {point}")]
pub struct InvariantViolation {
    pub first: usize,
    pub second: usize,
    pub point: Point,
}
