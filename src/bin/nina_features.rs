//! NinaPro feature extraction
//!
//! Loads one recording, runs the configured preprocessing pipeline and writes the
//! per-window feature matrix as CSV.
//!
//! # Usage
//!
//! ```bash
//! # Default configuration search (nina_emg.toml, nina_emg.local.toml, NINA_EMG_* variables)
//! nina-features --input S1_A1_E1.mat --output features.csv
//!
//! # Explicit configuration, also dumping the window labels
//! nina-features --config pipeline.toml --input s1.csv --output features.csv --labels labels.csv
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use nina_emg::config::{ConfigLoader, PipelineConfig};
use nina_emg::dataset::{load_csv, load_mat, Recording};
use nina_emg::processing::SignalPipeline;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Extract window features from a NinaPro recording
#[derive(Parser, Debug)]
#[command(name = "nina-features")]
#[command(author, version, about = "NinaPro EMG window feature extraction", long_about = None)]
struct Cli {
    /// Pipeline configuration (TOML); the default search path is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recording to process (.mat or .csv)
    #[arg(short, long)]
    input: PathBuf,

    /// Feature matrix destination (CSV)
    #[arg(short, long)]
    output: PathBuf,

    /// Optional per-window label destination (CSV with label and repetition columns)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("nina-features v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    let recording = load_recording(&cli.input)?;

    let mut pipeline = SignalPipeline::new(config).context("invalid pipeline configuration")?;
    let output = pipeline
        .process(&recording)
        .with_context(|| format!("processing {}", cli.input.display()))?;

    output
        .features
        .write_csv(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(
        path = %cli.output.display(),
        rows = output.features.n_rows(),
        columns = output.features.n_cols(),
        "Wrote feature matrix"
    );

    if let Some(ref path) = cli.labels {
        write_labels(path, &output.windows.labels.to_vec(), &output.windows.repetitions.to_vec())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let metrics = pipeline.get_performance_metrics();
    info!(
        filtering_ms = metrics.filtering_ms,
        windowing_ms = metrics.windowing_ms,
        feature_extraction_ms = metrics.feature_extraction_ms,
        "Done"
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::new().load()?,
    };
    Ok(config)
}

fn load_recording(path: &Path) -> anyhow::Result<Recording> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let recording = match extension.as_deref() {
        Some("mat") => load_mat(path)?,
        Some("csv") => load_csv(path)?,
        _ => bail!("unsupported recording format: {}", path.display()),
    };
    Ok(recording)
}

fn write_labels(path: &Path, labels: &[i32], repetitions: &[i32]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["label", "repetition"])?;
    for (label, repetition) in labels.iter().zip(repetitions) {
        writer.write_record([label.to_string(), repetition.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
