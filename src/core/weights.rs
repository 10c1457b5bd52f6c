use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Penalty coefficients applied by the scorer.
///
/// `split` and `merge` are multiplied by the number of fragments on the
/// fragmented side, `multiple` by the sum of both cardinalities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub matched: f64,
    pub miss: f64,
    pub false_alarm: f64,
    pub split: f64,
    pub merge: f64,
    pub multiple: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            matched: 1.0,
            miss: 1.0,
            false_alarm: 1.0,
            split: 0.5,
            merge: 0.5,
            multiple: 0.5,
        }
    }
}

impl ScoreWeights {
    /// Reads weight overrides from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read weights file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse weights file: {}", path.display()))
    }

    pub fn split_area(&self, area: f64, n_hyp: usize) -> f64 {
        area * self.split * n_hyp as f64
    }

    pub fn merge_area(&self, area: f64, n_ref: usize) -> f64 {
        area * self.merge * n_ref as f64
    }

    pub fn multiple_area(&self, area: f64, ref_card: usize, hyp_card: usize) -> f64 {
        area * self.multiple * (ref_card + hyp_card) as f64
    }
}
