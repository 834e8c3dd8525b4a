//! pagedup - forensic PDF corpus processor.
//!
//! Usage:
//!   pagedup scan --input corpus/ [--threshold 80] [--output report.json]
//!   pagedup ocr --input corpus/ --output searchable/

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use pagedup::config::PagedupConfig;
use pagedup::custody::{CustodyEvent, CustodyLog};
use pagedup::export::export_clusters;
use pagedup::ocr::run_ocr;
use pagedup::{ScanOutput, scan_corpus, write_report};

#[derive(Parser)]
#[command(name = "pagedup")]
#[command(about = "Forensic PDF corpus processor: OCR and near-duplicate page detection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a corpus for near-duplicate pages and write a similarity report
    Scan {
        /// Corpus root to scan
        #[arg(long)]
        input: PathBuf,

        /// Minimum similarity score (0-100) for a pair to count as a match
        #[arg(long)]
        threshold: Option<u32>,

        /// Report destination (defaults to report.path from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Export matched cluster pages as PNGs under this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// OCR every PDF under the input root into a mirrored output tree
    Ocr {
        /// Corpus root to OCR
        #[arg(long)]
        input: PathBuf,

        /// Output root; mirrors the input layout
        #[arg(long)]
        output: PathBuf,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PagedupConfig> {
    match path {
        Some(path) => PagedupConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PagedupConfig::default()),
    }
}

/// A relative custody path lives beside whatever the command produces:
/// the report for `scan`, the output tree for `ocr`.
fn resolve_custody_path(config: &PagedupConfig, anchor: &Path) -> PathBuf {
    let configured = Path::new(&config.custody.path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        anchor.join(configured)
    }
}

fn command_line() -> String {
    env::args().collect::<Vec<_>>().join(" ")
}

fn cmd_scan(
    input: PathBuf,
    threshold: Option<u32>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let threshold = threshold.unwrap_or(config.index.default_threshold);
    if threshold > 100 {
        bail!("threshold must be between 0 and 100, got {threshold}");
    }
    let report_path = output.unwrap_or_else(|| PathBuf::from(&config.report.path));
    let anchor = report_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let custody_path = resolve_custody_path(&config, anchor);

    let mut custody = CustodyLog::open(&custody_path)?;
    custody.record(CustodyEvent::RunStarted {
        command: command_line(),
        input_root: input.display().to_string(),
        settings: serde_json::json!({
            "threshold": threshold,
            "dpi": config.raster.dpi,
            "color_mode": config.raster.color_mode,
        }),
    })?;
    info!(input = %input.display(), threshold, "scan starting");

    let ScanOutput { report, clusters } = scan_corpus(&input, &config, threshold, &mut custody)?;

    let report_sha = write_report(&report, &report_path)?;
    custody.record(CustodyEvent::ReportWritten {
        path: report_path.display().to_string(),
        sha256: report_sha,
    })?;

    if let Some(export_dir) = export_dir {
        let raster_config = config.raster.to_raster_config()?;
        if let Err(err) = export_clusters(&input, &export_dir, &clusters, &raster_config) {
            warn!(export_dir = %export_dir.display(), error = %err, "cluster export skipped");
        }
    }

    println!(
        "report written to {} ({} clusters, {} matched pairs)",
        report_path.display(),
        report.summary.clusters,
        report.summary.matched_pairs
    );
    Ok(())
}

fn cmd_ocr(input: PathBuf, output: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let custody_path = resolve_custody_path(&config, &output);

    let mut custody = CustodyLog::open(&custody_path)?;
    custody.record(CustodyEvent::RunStarted {
        command: command_line(),
        input_root: input.display().to_string(),
        settings: serde_json::json!({
            "binary": config.ocr.binary,
            "languages": config.ocr.languages,
            "jobs": config.ocr.jobs,
            "retry_limit": config.ocr.retry_limit,
        }),
    })?;
    info!(input = %input.display(), output = %output.display(), "ocr starting");

    let summary = run_ocr(&input, &output, &config.ocr, &mut custody)?;

    println!(
        "ocr finished: {} completed, {} skipped, {} failed",
        summary.completed, summary.skipped, summary.failed
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            input,
            threshold,
            output,
            config,
            export_dir,
        } => cmd_scan(input, threshold, output, config, export_dir),
        Commands::Ocr {
            input,
            output,
            config,
        } => cmd_ocr(input, output, config),
    }
}
