//! Chain-of-custody event log.
//!
//! Append-only JSONL file written by a single coordinator. Every line is
//! one event wrapped in an envelope carrying an RFC 3339 UTC timestamp and
//! the run id. The log is evidence, not state: nothing in the pipeline
//! reads it back, and a fresh run appends a new `run_started` event rather
//! than truncating.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced while writing custody evidence.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// The log file could not be created or appended to.
    #[error("custody log {} unwritable: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file to be checksummed could not be read.
    #[error("failed to checksum {}: {source}", path.display())]
    Checksum {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An event could not be encoded as JSON.
    #[error("failed to encode custody event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One custody event. The serialized form carries the variant name in an
/// `event` field next to the variant's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CustodyEvent {
    /// A pipeline run began. `settings` carries the effective knobs of
    /// whichever command is running.
    RunStarted {
        command: String,
        input_root: String,
        settings: serde_json::Value,
    },
    /// A document was rendered and digested.
    DocumentIngested {
        document: String,
        sha256: String,
        page_count: usize,
    },
    /// A document could not be processed at all.
    DocumentFailed { document: String, reason: String },
    /// A page rendered but produced no digest.
    PageUnscorable {
        document: String,
        page_index: usize,
        reason: String,
    },
    /// OCR began for one file.
    OcrStarted { input: String, input_sha256: String },
    /// OCR produced an output file.
    OcrCompleted {
        input: String,
        output: String,
        output_sha256: String,
        attempts: u32,
    },
    /// OCR gave up on one file.
    OcrFailed {
        input: String,
        reason: String,
        attempts: u32,
    },
    /// The similarity report was written to disk.
    ReportWritten { path: String, sha256: String },
}

#[derive(Serialize)]
struct Envelope<'a> {
    timestamp: DateTime<Utc>,
    run_id: Uuid,
    #[serde(flatten)]
    event: &'a CustodyEvent,
}

/// Append-only writer for the custody log.
pub struct CustodyLog {
    path: PathBuf,
    file: File,
    run_id: Uuid,
}

impl CustodyLog {
    /// Opens (creating if needed) the log at `path` and assigns this run a
    /// fresh run id. Parent directories are created as needed.
    pub fn open(path: &Path) -> Result<Self, CustodyError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CustodyError::LogWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CustodyError::LogWrite {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            run_id: Uuid::new_v4(),
        })
    }

    /// The run id stamped on every event this writer records.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Where the log lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one event and flushes it to disk.
    pub fn record(&mut self, event: CustodyEvent) -> Result<(), CustodyError> {
        let envelope = Envelope {
            timestamp: Utc::now(),
            run_id: self.run_id,
            event: &event,
        };
        let mut line = serde_json::to_string(&envelope)?;
        line.push('\n');
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), CustodyError> {
        self.file
            .write_all(line.as_bytes())
            .map_err(|source| CustodyError::LogWrite {
                path: self.path.clone(),
                source,
            })?;
        self.file.flush().map_err(|source| CustodyError::LogWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_hex(path: &Path) -> Result<String, CustodyError> {
    let mut file = File::open(path).map_err(|source| CustodyError::Checksum {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| CustodyError::Checksum {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hex-encoded SHA-256 of an in-memory byte slice.
pub fn sha256_hex_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
