use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::error::ScoreError;
use crate::core::model::{CountRecord, ScoreRecord};
use crate::core::weights::ScoreWeights;
use crate::corpus::{self, DocumentPair};
use crate::export::json_export::JsonExporter;
use crate::export::text_export::TextExporter;
use crate::export::Exporter;
use crate::matching::{Evaluation, Matcher, UnitSummary, ZoneMap, ZoneMapAlt};
use crate::parser::{GediLoader, RegionLoader, ZoneFileLoader};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    ZoneMap,
    ZoneMapAlt { threshold: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Gedi,
    Zones,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub reference: PathBuf,
    pub hypothesis: PathBuf,
    pub output: PathBuf,
    pub algorithm: Algorithm,
    pub weights: ScoreWeights,
    pub format: InputFormat,
    pub gedi_type: String,
}

impl PipelineConfig {
    pub fn new(reference: PathBuf, hypothesis: PathBuf, output: PathBuf, algorithm: Algorithm) -> Self {
        Self {
            reference,
            hypothesis,
            output,
            algorithm,
            weights: ScoreWeights::default(),
            format: InputFormat::Gedi,
            gedi_type: crate::parser::gedi::DEFAULT_GEDI_TYPE.to_string(),
        }
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_gedi_type(mut self, gedi_type: String) -> Self {
        self.gedi_type = gedi_type;
        self
    }

    pub fn loader(&self) -> Box<dyn RegionLoader + Send + Sync> {
        match self.format {
            InputFormat::Gedi => Box::new(GediLoader::new(self.gedi_type.clone())),
            InputFormat::Zones => Box::new(ZoneFileLoader::new()),
        }
    }

    pub fn matcher(&self) -> Box<dyn Matcher + Send + Sync> {
        match self.algorithm {
            Algorithm::ZoneMap => Box::new(ZoneMap::new(self.weights)),
            Algorithm::ZoneMapAlt { threshold } => Box::new(ZoneMapAlt::new(threshold, self.weights)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    pub algorithm: String,
    pub scores: ScoreRecord,
    pub counts: CountRecord,
    pub units: Vec<UnitSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub algorithm: String,
    pub documents: Vec<DocumentReport>,
    /// Documents left out because their reference area is zero.
    pub skipped: Vec<String>,
    pub sum: BTreeMap<String, f64>,
    pub mean: BTreeMap<String, f64>,
    pub counts: BTreeMap<String, usize>,
}

impl CorpusReport {
    fn from_documents(algorithm: String, documents: Vec<DocumentReport>, skipped: Vec<String>) -> Self {
        let entries: Vec<_> = documents.iter().map(|doc| doc.scores.to_entries()).collect();
        let counts: Vec<_> = documents.iter().map(|doc| doc.counts.to_entries()).collect();
        Self {
            algorithm,
            sum: corpus::sum(&entries),
            mean: corpus::mean(&entries),
            counts: corpus::sum_counts(&counts),
            documents,
            skipped,
        }
    }
}

pub fn evaluate_document(
    config: &PipelineConfig,
    name: &str,
    reference: &Path,
    hypothesis: &Path,
) -> Result<DocumentReport> {
    let loader = config.loader();
    let refs = loader
        .load_regions(reference)
        .with_context(|| format!("failed to load reference regions of {name}"))?;
    let hyps = loader
        .load_regions(hypothesis)
        .with_context(|| format!("failed to load hypothesis regions of {name}"))?;

    let matcher = config.matcher();
    let Evaluation {
        scores,
        counts,
        units,
    } = matcher.evaluate(&refs, &hyps)?;
    info!(
        "{name}: {} reference / {} hypothesis regions, score {:.2}",
        refs.len(),
        hyps.len(),
        scores.score
    );

    Ok(DocumentReport {
        name: name.to_string(),
        algorithm: matcher.name().to_string(),
        scores,
        counts,
        units,
    })
}

/// Scores every document pair of the configured folders in parallel.
///
/// Documents whose reference area is zero are skipped and listed in the
/// report; any other failure aborts the run.
pub fn evaluate_corpus(config: &PipelineConfig) -> Result<CorpusReport> {
    let pairs = corpus::pair_documents(&config.reference, &config.hypothesis)?;
    info!("evaluating {} document pair(s)", pairs.len());

    let outcomes: Vec<(String, Result<DocumentReport>)> = pairs
        .par_iter()
        .map(|pair: &DocumentPair| {
            (
                pair.name.clone(),
                evaluate_document(config, &pair.name, &pair.reference, &pair.hypothesis),
            )
        })
        .collect();

    let mut documents = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(report) => documents.push(report),
            Err(err) if matches!(err.downcast_ref::<ScoreError>(), Some(ScoreError::ZeroReferenceArea)) => {
                warn!("skipping {name}: {err}");
                skipped.push(name);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(CorpusReport::from_documents(
        config.matcher().name().to_string(),
        documents,
        skipped,
    ))
}

/// Evenly spaced thresholds from 0 to 1 inclusive.
pub fn sweep_thresholds(step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0 && step <= 1.0) {
        anyhow::bail!("sweep step must lie in (0, 1], got {step}");
    }
    let steps = (1.0 / step + 1e-9).floor() as usize;
    Ok((0..=steps).map(|i| (i as f64 * step).min(1.0)).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub threshold: f64,
    pub mean: BTreeMap<String, f64>,
    pub skipped: usize,
}

/// Runs the threshold matcher over the corpus once per threshold.
pub fn threshold_sweep(config: &PipelineConfig, thresholds: &[f64]) -> Result<Vec<SweepPoint>> {
    thresholds
        .iter()
        .map(|&threshold| {
            let mut run = config.clone();
            run.algorithm = Algorithm::ZoneMapAlt { threshold };
            let report = evaluate_corpus(&run)?;
            Ok(SweepPoint {
                threshold,
                mean: report.mean,
                skipped: report.skipped.len(),
            })
        })
        .collect()
}

pub fn export_report(report: &CorpusReport, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(report)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(report)?;

    Ok(())
}
