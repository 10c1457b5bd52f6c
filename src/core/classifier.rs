use crate::core::error::{Result, ScoreError};
use crate::core::model::ErrorClass;

/// Maps a correspondence shape `(n_ref, n_hyp)` to its error class.
///
/// Shapes outside the recognized table (for example `0:0` or `0:N`) are an
/// invariant violation and are reported with the offending cardinalities.
pub fn classify(n_ref: usize, n_hyp: usize) -> Result<ErrorClass> {
    match (n_ref, n_hyp) {
        (0, 1) => Ok(ErrorClass::FalseAlarm),
        (1, 0) => Ok(ErrorClass::Miss),
        (1, 1) => Ok(ErrorClass::Match),
        (1, n) if n > 1 => Ok(ErrorClass::Split),
        (n, 1) if n > 1 => Ok(ErrorClass::Merge),
        (r, h) if r > 1 && h > 1 => Ok(ErrorClass::Multiple),
        _ => Err(ScoreError::InvariantViolation { n_ref, n_hyp }),
    }
}
