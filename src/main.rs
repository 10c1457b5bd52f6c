use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use zonemap::core::weights::ScoreWeights;
use zonemap::export::JsonExporter;
use zonemap::matching::DEFAULT_THRESHOLD;
use zonemap::parser::gedi::DEFAULT_GEDI_TYPE;
use zonemap::pipeline::{
    evaluate_corpus, evaluate_document, export_report, sweep_thresholds, threshold_sweep,
    Algorithm, InputFormat, PipelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "zonemap")]
#[command(version, about = "Region correspondence scoring of page segmentation results", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct ScoringArgs {
    /// Correspondence algorithm
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Zonemap)]
    algorithm: AlgorithmArg,

    /// Overlap threshold, zonemap-alt only [default: 0.15]
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Input file format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Gedi)]
    format: FormatArg,

    /// Zone kind read from GEDI files
    #[arg(long, default_value = DEFAULT_GEDI_TYPE)]
    gedi_type: String,

    /// JSON file overriding penalty weights
    #[arg(long)]
    weights: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one reference/hypothesis pair
    Score {
        /// Reference (ground truth) file
        reference: PathBuf,

        /// Hypothesis file
        hypothesis: PathBuf,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Print the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score every same-named file pair of two directories
    Batch {
        reference_dir: PathBuf,
        hypothesis_dir: PathBuf,

        /// Output directory for report.json and summary.txt
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Run zonemap-alt over a range of thresholds
    Sweep {
        reference_dir: PathBuf,
        hypothesis_dir: PathBuf,

        /// Distance between consecutive thresholds in [0, 1]
        #[arg(long, default_value_t = 0.1)]
        step: f64,

        /// Output directory for sweep.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum AlgorithmArg {
    Zonemap,
    ZonemapAlt,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum FormatArg {
    Gedi,
    Zones,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Score {
            reference,
            hypothesis,
            scoring,
            json,
        } => score_single(reference, hypothesis, &scoring, json),
        Commands::Batch {
            reference_dir,
            hypothesis_dir,
            output,
            scoring,
        } => score_batch(reference_dir, hypothesis_dir, output, &scoring),
        Commands::Sweep {
            reference_dir,
            hypothesis_dir,
            step,
            output,
            scoring,
        } => run_sweep(reference_dir, hypothesis_dir, step, output, &scoring),
    }
}

fn build_config(
    reference: PathBuf,
    hypothesis: PathBuf,
    output: PathBuf,
    scoring: &ScoringArgs,
) -> Result<PipelineConfig> {
    let algorithm = match (scoring.algorithm, scoring.threshold) {
        (AlgorithmArg::Zonemap, Some(_)) => {
            anyhow::bail!("--threshold only applies to --algorithm zonemap-alt")
        }
        (AlgorithmArg::Zonemap, None) => Algorithm::ZoneMap,
        (AlgorithmArg::ZonemapAlt, threshold) => Algorithm::ZoneMapAlt {
            threshold: threshold.unwrap_or(DEFAULT_THRESHOLD),
        },
    };
    let weights = match &scoring.weights {
        Some(path) => ScoreWeights::from_json_file(path)?,
        None => ScoreWeights::default(),
    };
    let format = match scoring.format {
        FormatArg::Gedi => InputFormat::Gedi,
        FormatArg::Zones => InputFormat::Zones,
    };
    Ok(PipelineConfig::new(reference, hypothesis, output, algorithm)
        .with_weights(weights)
        .with_format(format)
        .with_gedi_type(scoring.gedi_type.clone()))
}

fn print_areas(areas: impl IntoIterator<Item = (String, f64)>) {
    for (key, value) in areas {
        println!("  {key:<22} {value:>12.2}");
    }
}

fn score_single(
    reference: PathBuf,
    hypothesis: PathBuf,
    scoring: &ScoringArgs,
    json: bool,
) -> Result<()> {
    for path in [&reference, &hypothesis] {
        if !path.is_file() {
            anyhow::bail!("Input file does not exist: {}", path.display());
        }
    }

    let name = reference
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.display().to_string());
    let config = build_config(reference.clone(), hypothesis.clone(), PathBuf::new(), scoring)?;
    let report = evaluate_document(&config, &name, &reference, &hypothesis)
        .with_context(|| format!("Failed to score: {}", reference.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("[*] Reference: {}", reference.display());
    println!("[*] Hypothesis: {}", hypothesis.display());
    println!("[*] Algorithm: {}\n", report.algorithm);
    print_areas(report.scores.to_entries());
    println!();
    for (category, count) in &report.counts.counts {
        println!("  {:<22} {:>12}", category.as_str(), count);
    }
    println!("\n[✓] Score: {:.2}", report.scores.score);

    Ok(())
}

fn score_batch(
    reference_dir: PathBuf,
    hypothesis_dir: PathBuf,
    output: Option<PathBuf>,
    scoring: &ScoringArgs,
) -> Result<()> {
    for dir in [&reference_dir, &hypothesis_dir] {
        if !dir.is_dir() {
            anyhow::bail!("Input directory does not exist: {}", dir.display());
        }
    }
    let output_dir = output.unwrap_or_else(|| PathBuf::from("zonemap_output"));

    println!("[*] Reference: {}", reference_dir.display());
    println!("[*] Hypothesis: {}", hypothesis_dir.display());
    println!("[*] Output: {}", output_dir.display());

    let config = build_config(reference_dir, hypothesis_dir, output_dir.clone(), scoring)?;

    println!("\n[+] Scoring documents...");
    let report = evaluate_corpus(&config)?;

    println!(
        "[+] {} scored, {} skipped",
        report.documents.len(),
        report.skipped.len()
    );
    for name in &report.skipped {
        eprintln!("  [!] Skipped {name}: reference has no area");
    }

    println!("[+] Exporting results...");
    export_report(&report, &config.output)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    println!("\n[*] Mean over documents:");
    print_areas(report.mean.clone());
    println!("\n[✓] Done! Results saved to: {}", output_dir.display());

    Ok(())
}

fn run_sweep(
    reference_dir: PathBuf,
    hypothesis_dir: PathBuf,
    step: f64,
    output: Option<PathBuf>,
    scoring: &ScoringArgs,
) -> Result<()> {
    if scoring.threshold.is_some() {
        anyhow::bail!("--threshold cannot be combined with sweep; use --step");
    }
    let thresholds = sweep_thresholds(step)?;
    let output_dir = output.unwrap_or_else(|| PathBuf::from("zonemap_sweep"));
    let config = build_config(reference_dir, hypothesis_dir, output_dir.clone(), scoring)?;

    println!("[*] Sweeping {} threshold(s)", thresholds.len());
    let points = threshold_sweep(&config, &thresholds)?;

    for point in &points {
        let score = point.mean.get("score").copied().unwrap_or(0.0);
        println!("  threshold {:>5.2}  mean score {:>10.2}", point.threshold, score);
    }

    JsonExporter::new(output_dir.clone())
        .export_sweep(&points)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;
    println!("\n[✓] Done! Results saved to: {}", output_dir.display());

    Ok(())
}
