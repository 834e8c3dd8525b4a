//! Corpus enumeration.
//!
//! Walks an input directory recursively and returns every PDF document in a
//! deterministic order. The returned corpus key (path relative to the input
//! root) is the identity a document keeps through the index, the custody
//! log, and the report.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Errors that make a corpus walk impossible.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The input root does not exist or is not a directory.
    #[error("input path {} is not a readable directory", path.display())]
    RootUnreadable { path: PathBuf },

    /// The walk finished without finding a single PDF.
    #[error("no PDF documents found under {}", path.display())]
    NoDocuments { path: PathBuf },
}

/// One document discovered by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    /// Absolute (or caller-relative) path on disk.
    pub path: PathBuf,
    /// Path relative to the input root, used as the document key.
    pub document: String,
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Enumerates all PDF documents under `root`, sorted by corpus key.
///
/// Unreadable subtrees are logged and skipped; only an unusable root or an
/// empty corpus is an error.
pub fn walk_corpus(root: &Path) -> Result<Vec<CorpusDocument>, WalkError> {
    if !root.is_dir() {
        return Err(WalkError::RootUnreadable {
            path: root.to_path_buf(),
        });
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_pdf(entry.path()) {
            continue;
        }
        let document = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        documents.push(CorpusDocument {
            path: entry.path().to_path_buf(),
            document,
        });
    }

    if documents.is_empty() {
        return Err(WalkError::NoDocuments {
            path: root.to_path_buf(),
        });
    }

    documents.sort_by(|a, b| a.document.cmp(&b.document));
    Ok(documents)
}
