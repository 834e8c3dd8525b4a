//! OCR pass over a PDF corpus.
//!
//! Drives an external `ocrmypdf` binary over every PDF under the input
//! root, writing results into an output tree that mirrors the input
//! layout. Progress is persisted in `ocr_state.json` inside the output
//! root so completed files are skipped on re-runs and failed files resume
//! their attempt count until the retry limit is exhausted. Files run in
//! parallel; custody events are recorded by the coordinator only.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OcrYamlConfig;
use crate::custody::{CustodyError, CustodyEvent, CustodyLog, sha256_hex};
use crate::walker::{WalkError, walk_corpus};

/// Progress file kept inside the output root.
pub const OCR_STATE_FILE: &str = "ocr_state.json";

/// Errors that abort an OCR run.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The configured binary could not be launched at all.
    #[error("ocr binary {binary:?} not found; install ocrmypdf or point ocr.binary at it")]
    BinaryUnavailable { binary: String },

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The progress file exists but cannot be parsed. Delete it to reset.
    #[error("ocr state {} is not valid JSON: {source}", path.display())]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

/// Per-run totals reported after an OCR pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OcrSummary {
    /// Files OCR produced output for during this run.
    pub completed: usize,
    /// Files already completed by an earlier run.
    pub skipped: usize,
    /// Files recorded as failed, whether this run or an earlier one
    /// exhausted their attempts.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OcrStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct StateEntry {
    status: OcrStatus,
    attempts: u32,
}

struct WorkItem {
    rel: String,
    input: PathBuf,
    prior_attempts: u32,
}

enum Outcome {
    Completed { attempts: u32 },
    Failed { reason: String, attempts: u32 },
    Unavailable,
}

/// Runs OCR over every PDF under `input_root`, mirroring results under
/// `output_root`. An input tree without PDFs yields an all-zero summary.
pub fn run_ocr(
    input_root: &Path,
    output_root: &Path,
    config: &OcrYamlConfig,
    custody: &mut CustodyLog,
) -> Result<OcrSummary, OcrError> {
    let documents = match walk_corpus(input_root) {
        Ok(documents) => documents,
        Err(WalkError::NoDocuments { .. }) => Vec::new(),
        Err(err) => return Err(err.into()),
    };
    fs::create_dir_all(output_root).map_err(|source| OcrError::Io {
        path: output_root.to_path_buf(),
        source,
    })?;
    let state_path = output_root.join(OCR_STATE_FILE);
    let mut state = load_state(&state_path)?;

    let mut summary = OcrSummary::default();
    let mut work = Vec::new();
    for doc in documents {
        match state.get(&doc.document) {
            Some(entry) if entry.status == OcrStatus::Completed => {
                debug!(input = %doc.document, "already completed, skipping");
                summary.skipped += 1;
            }
            Some(entry) if entry.attempts >= config.retry_limit => {
                warn!(
                    input = %doc.document,
                    attempts = entry.attempts,
                    "retry limit exhausted, leaving as failed"
                );
                summary.failed += 1;
            }
            entry => {
                work.push(WorkItem {
                    rel: doc.document,
                    input: doc.path,
                    prior_attempts: entry.map(|e| e.attempts).unwrap_or(0),
                });
            }
        }
    }

    // Input hashes are taken before the workers start so the started
    // events land in corpus order.
    let mut runnable = Vec::new();
    for item in work {
        match sha256_hex(&item.input) {
            Ok(digest) => {
                custody.record(CustodyEvent::OcrStarted {
                    input: item.rel.clone(),
                    input_sha256: digest,
                })?;
                runnable.push(item);
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(input = %item.rel, reason = %reason, "input cannot be checksummed");
                custody.record(CustodyEvent::OcrFailed {
                    input: item.rel.clone(),
                    reason,
                    attempts: item.prior_attempts,
                })?;
                state.insert(
                    item.rel,
                    StateEntry {
                        status: OcrStatus::Failed,
                        attempts: item.prior_attempts,
                    },
                );
                summary.failed += 1;
            }
        }
    }

    let results: Vec<(WorkItem, Outcome)> = runnable
        .into_par_iter()
        .map(|item| {
            let output_path = output_root.join(&item.rel);
            let outcome = ocr_one(&item, config, &output_path);
            (item, outcome)
        })
        .collect();

    for (item, outcome) in results {
        let output_path = output_root.join(&item.rel);
        match outcome {
            Outcome::Unavailable => {
                return Err(OcrError::BinaryUnavailable {
                    binary: config.binary.clone(),
                });
            }
            Outcome::Completed { attempts } => match sha256_hex(&output_path) {
                Ok(digest) => {
                    info!(input = %item.rel, attempts, "ocr completed");
                    custody.record(CustodyEvent::OcrCompleted {
                        input: item.rel.clone(),
                        output: output_path.display().to_string(),
                        output_sha256: digest,
                        attempts,
                    })?;
                    state.insert(
                        item.rel,
                        StateEntry {
                            status: OcrStatus::Completed,
                            attempts,
                        },
                    );
                    summary.completed += 1;
                }
                Err(err) => {
                    let reason = format!("output checksum failed: {err}");
                    warn!(input = %item.rel, reason = %reason, "ocr output unreadable");
                    custody.record(CustodyEvent::OcrFailed {
                        input: item.rel.clone(),
                        reason,
                        attempts,
                    })?;
                    state.insert(
                        item.rel,
                        StateEntry {
                            status: OcrStatus::Failed,
                            attempts,
                        },
                    );
                    summary.failed += 1;
                }
            },
            Outcome::Failed { reason, attempts } => {
                warn!(input = %item.rel, attempts, reason = %reason, "ocr failed");
                custody.record(CustodyEvent::OcrFailed {
                    input: item.rel.clone(),
                    reason,
                    attempts,
                })?;
                state.insert(
                    item.rel,
                    StateEntry {
                        status: OcrStatus::Failed,
                        attempts,
                    },
                );
                summary.failed += 1;
            }
        }
    }

    save_state(&state_path, &state)?;
    info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "ocr run finished"
    );
    Ok(summary)
}

fn ocr_one(item: &WorkItem, config: &OcrYamlConfig, output_path: &Path) -> Outcome {
    if let Some(parent) = output_path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            return Outcome::Failed {
                reason: format!("failed to create output directory: {err}"),
                attempts: item.prior_attempts,
            };
        }
    }

    let mut attempts = item.prior_attempts;
    let mut last_reason = String::from("retry limit exhausted");
    while attempts < config.retry_limit {
        attempts += 1;
        match build_command(config, &item.input, output_path).output() {
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Outcome::Unavailable,
            Err(err) => {
                last_reason = format!("failed to launch {}: {err}", config.binary);
            }
            Ok(output) if output.status.success() => {
                return Outcome::Completed { attempts };
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let trimmed = stderr.trim();
                last_reason = if trimmed.is_empty() {
                    format!("{} exited with {}", config.binary, output.status)
                } else {
                    trimmed.to_string()
                };
            }
        }
        debug!(input = %item.rel, attempt = attempts, reason = %last_reason, "ocr attempt failed");
    }
    Outcome::Failed {
        reason: last_reason,
        attempts,
    }
}

fn build_command(config: &OcrYamlConfig, input: &Path, output: &Path) -> Command {
    let mut command = Command::new(&config.binary);
    command.arg("-l").arg(config.languages.join("+"));
    if config.rotate_pages {
        command.arg("--rotate-pages");
    }
    if config.deskew {
        command.arg("--deskew");
    }
    command.arg("--jobs").arg(config.jobs.to_string());
    command.arg("--output-type").arg(&config.output_type);
    command.arg(input).arg(output);
    command
}

fn load_state(path: &Path) -> Result<BTreeMap<String, StateEntry>, OcrError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path).map_err(|source| OcrError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| OcrError::State {
        path: path.to_path_buf(),
        source,
    })
}

fn save_state(path: &Path, state: &BTreeMap<String, StateEntry>) -> Result<(), OcrError> {
    let mut encoded = serde_json::to_string_pretty(state).map_err(|source| OcrError::State {
        path: path.to_path_buf(),
        source,
    })?;
    encoded.push('\n');
    fs::write(path, encoded).map_err(|source| OcrError::Io {
        path: path.to_path_buf(),
        source,
    })
}
