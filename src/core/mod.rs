pub mod classifier;
pub mod error;
pub mod geometry;
pub mod model;
pub mod weights;

pub use classifier::classify;
pub use error::{ScoreError, Side};
pub use weights::ScoreWeights;
