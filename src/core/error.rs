use std::fmt;

use thiserror::Error;

use crate::core::model::RegionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Hypothesis,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Reference => write!(f, "reference"),
            Side::Hypothesis => write!(f, "hypothesis"),
        }
    }
}

/// Failures of the matching and scoring core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// A correspondence unit reached a cardinality shape the algorithm cannot produce.
    #[error("unrecognized correspondence shape: {n_ref} reference(s) to {n_hyp} hypothesis region(s)")]
    InvariantViolation { n_ref: usize, n_hyp: usize },

    /// The reference set has no area, so the score cannot be normalized.
    #[error("total reference area is zero, score is undefined")]
    ZeroReferenceArea,

    #[error("threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("{side} region {id} is not part of its region set")]
    UnknownRegion { side: Side, id: RegionId },
}

pub type Result<T> = std::result::Result<T, ScoreError>;
