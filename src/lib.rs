//! Workspace umbrella crate for pagedup.
//!
//! This crate stitches corpus walking, page rasterization, fuzzy digesting,
//! and similarity indexing into a single scan entry point, and carries the
//! OCR driver, custody log, and cluster export the CLI builds on.

pub mod config;
pub mod custody;
pub mod export;
pub mod ocr;
pub mod walker;

pub use ctph::{CtphConfig, CtphError, FuzzyHash, digest};
pub use raster::{ColorMode, RasterConfig, RasterError, rasterize, render_page};
pub use report::{Report, ReportError};
pub use simindex::{
    IndexConfig, IndexError, PageDigest, PageKey, SimilarityCluster, SimilarityIndex,
    SimilarityRecord,
};

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use report::{Exclusion, ExclusionKind, RasterSettings, ScanCounts};
use tracing::{info, warn};

use crate::config::{ConfigLoadError, PagedupConfig};
use crate::custody::{CustodyError, CustodyEvent, CustodyLog};
use crate::walker::{CorpusDocument, WalkError, walk_corpus};

/// Errors that can abort a corpus scan.
#[derive(Debug)]
pub enum PipelineError {
    Walk(WalkError),
    Raster(RasterError),
    Digest(CtphError),
    Index(IndexError),
    Report(ReportError),
    Custody(CustodyError),
    Config(ConfigLoadError),
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Walk(err) => write!(f, "corpus walk failure: {err}"),
            PipelineError::Raster(err) => write!(f, "rasterization failure: {err}"),
            PipelineError::Digest(err) => write!(f, "digest failure: {err}"),
            PipelineError::Index(err) => write!(f, "similarity index failure: {err}"),
            PipelineError::Report(err) => write!(f, "report assembly failure: {err}"),
            PipelineError::Custody(err) => write!(f, "custody log failure: {err}"),
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
            PipelineError::ReportWrite { path, source } => {
                write!(f, "cannot write report {}: {source}", path.display())
            }
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Walk(err) => Some(err),
            PipelineError::Raster(err) => Some(err),
            PipelineError::Digest(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Report(err) => Some(err),
            PipelineError::Custody(err) => Some(err),
            PipelineError::Config(err) => Some(err),
            PipelineError::ReportWrite { source, .. } => Some(source),
        }
    }
}

impl From<WalkError> for PipelineError {
    fn from(value: WalkError) -> Self {
        PipelineError::Walk(value)
    }
}

impl From<RasterError> for PipelineError {
    fn from(value: RasterError) -> Self {
        PipelineError::Raster(value)
    }
}

impl From<CtphError> for PipelineError {
    fn from(value: CtphError) -> Self {
        PipelineError::Digest(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<ReportError> for PipelineError {
    fn from(value: ReportError) -> Self {
        PipelineError::Report(value)
    }
}

impl From<CustodyError> for PipelineError {
    fn from(value: CustodyError) -> Self {
        PipelineError::Custody(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

/// Everything a worker learned about one document.
struct ProcessedDocument {
    document: String,
    sha256: String,
    page_count: usize,
    digests: Vec<(usize, FuzzyHash)>,
    render_failures: Vec<(usize, String)>,
    unscorable: Vec<(usize, String)>,
}

enum DocumentOutcome {
    Processed(ProcessedDocument),
    Failed { document: String, reason: String },
    EngineUnavailable(RasterError),
}

/// Result of a full corpus scan: the report plus the clusters it was
/// assembled from, kept around for the PNG export step.
#[derive(Debug)]
pub struct ScanOutput {
    pub report: Report,
    pub clusters: Vec<SimilarityCluster>,
}

fn color_mode_name(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Grayscale => "grayscale",
        ColorMode::Rgb => "rgb",
    }
}

/// Renders and digests one document. Infallible on purpose: anything short
/// of a missing render engine is folded into the outcome so one bad
/// document never stops the corpus.
fn process_document(
    doc: &CorpusDocument,
    raster_config: &RasterConfig,
    ctph_config: &CtphConfig,
) -> DocumentOutcome {
    let sha256 = match custody::sha256_hex(&doc.path) {
        Ok(digest) => digest,
        Err(err) => {
            return DocumentOutcome::Failed {
                document: doc.document.clone(),
                reason: err.to_string(),
            };
        }
    };

    let rendered = match raster::rasterize(&doc.path, raster_config) {
        Ok(rendered) => rendered,
        Err(err @ RasterError::EngineUnavailable { .. }) => {
            return DocumentOutcome::EngineUnavailable(err);
        }
        Err(err) => {
            return DocumentOutcome::Failed {
                document: doc.document.clone(),
                reason: err.to_string(),
            };
        }
    };

    let mut digests = Vec::with_capacity(rendered.pages.len());
    let mut unscorable = Vec::new();
    for page in &rendered.pages {
        match ctph::digest(&page.canonical_bytes(), ctph_config) {
            Ok(hash) => digests.push((page.page_index, hash)),
            Err(err) => unscorable.push((page.page_index, err.to_string())),
        }
    }

    DocumentOutcome::Processed(ProcessedDocument {
        document: doc.document.clone(),
        sha256,
        page_count: rendered.page_count,
        digests,
        render_failures: rendered
            .failures
            .into_iter()
            .map(|failure| (failure.page_index, failure.reason))
            .collect(),
        unscorable,
    })
}

/// Scans every PDF under `input_root` and assembles the similarity report.
///
/// Documents are processed in parallel; the coordinator folds outcomes back
/// in corpus order, so custody events and the report are stable across runs.
/// `threshold` is the 0-100 score floor for a pair to count as a match.
pub fn scan_corpus(
    input_root: &Path,
    config: &PagedupConfig,
    threshold: u32,
    custody: &mut CustodyLog,
) -> Result<ScanOutput, PipelineError> {
    let raster_config = config.raster.to_raster_config()?;
    raster_config.validate()?;
    let ctph_config = config.digest.to_ctph_config();
    ctph_config.validate()?;
    let index_config = config.index.to_index_config();

    let documents = walk_corpus(input_root)?;
    info!(documents = documents.len(), "corpus walk complete");

    let outcomes: Vec<DocumentOutcome> = documents
        .par_iter()
        .map(|doc| process_document(doc, &raster_config, &ctph_config))
        .collect();

    let mut index = SimilarityIndex::new(index_config)?;
    let mut counts = ScanCounts {
        documents_total: documents.len(),
        ..ScanCounts::default()
    };
    let mut exclusions = Vec::new();

    for outcome in outcomes {
        match outcome {
            DocumentOutcome::EngineUnavailable(err) => return Err(PipelineError::Raster(err)),
            DocumentOutcome::Failed { document, reason } => {
                warn!(document = %document, reason = %reason, "document failed");
                custody.record(CustodyEvent::DocumentFailed {
                    document: document.clone(),
                    reason: reason.clone(),
                })?;
                exclusions.push(Exclusion {
                    document,
                    page_index: None,
                    kind: ExclusionKind::DocumentFailed,
                    reason,
                });
                counts.documents_failed += 1;
            }
            DocumentOutcome::Processed(processed) => {
                custody.record(CustodyEvent::DocumentIngested {
                    document: processed.document.clone(),
                    sha256: processed.sha256.clone(),
                    page_count: processed.page_count,
                })?;
                counts.pages_rendered += processed.digests.len() + processed.unscorable.len();
                counts.pages_render_failed += processed.render_failures.len();
                counts.pages_unscorable += processed.unscorable.len();

                for (page_index, reason) in processed.render_failures {
                    exclusions.push(Exclusion {
                        document: processed.document.clone(),
                        page_index: Some(page_index),
                        kind: ExclusionKind::PageRenderFailed,
                        reason,
                    });
                }
                for (page_index, reason) in processed.unscorable {
                    custody.record(CustodyEvent::PageUnscorable {
                        document: processed.document.clone(),
                        page_index,
                        reason: reason.clone(),
                    })?;
                    exclusions.push(Exclusion {
                        document: processed.document.clone(),
                        page_index: Some(page_index),
                        kind: ExclusionKind::PageUnscorable,
                        reason,
                    });
                }
                for (page_index, digest) in processed.digests {
                    index.insert(PageDigest {
                        key: PageKey {
                            document: processed.document.clone(),
                            page_index,
                        },
                        digest,
                    });
                }
            }
        }
    }

    let records = index.query(threshold);
    let clusters = index.cluster(threshold);
    info!(
        pages = index.len(),
        pairs = records.len(),
        clusters = clusters.len(),
        "similarity pass complete"
    );

    let raster_settings = RasterSettings {
        dpi: raster_config.dpi,
        color_mode: color_mode_name(raster_config.color_mode).to_string(),
    };
    let report = report::build(
        threshold,
        raster_settings,
        counts,
        &clusters,
        &records,
        exclusions,
    );
    Ok(ScanOutput { report, clusters })
}

/// Writes the report as pretty JSON and returns the SHA-256 of the bytes
/// written. Identical scans produce byte-identical files.
pub fn write_report(report: &Report, path: &Path) -> Result<String, PipelineError> {
    let rendered = report.to_json_pretty()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::ReportWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, rendered.as_bytes()).map_err(|source| PipelineError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(custody::sha256_hex_bytes(rendered.as_bytes()))
}
