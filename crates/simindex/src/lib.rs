//! # Pagedup Similarity Index
//!
//! An in-memory index that accumulates page digests during a corpus scan
//! and answers similarity queries over the accumulated set.
//!
//! ## Contract
//!
//! - Two-phase use: all [`SimilarityIndex::insert`] calls happen before the
//!   first [`SimilarityIndex::query`] or [`SimilarityIndex::cluster`] call.
//! - Read results are a pure function of the accumulated set and the
//!   threshold. Records are internally sorted by key, so insertion order
//!   never shows through.
//! - Pairwise scoring is O(n²) over the set. Prefix blocking
//!   ([`BlockingConfig`]) can prune candidates at a documented recall
//!   cost; it is never applied unless explicitly enabled.
//!
//! ## Example
//!
//! ```
//! use simindex::{IndexConfig, PageDigest, PageKey, SimilarityIndex};
//!
//! let mut index = SimilarityIndex::new(IndexConfig::new())?;
//! index.insert(PageDigest {
//!     key: PageKey { document: "a.pdf".into(), page_index: 0 },
//!     digest: "6:ABCDEFGHIJ:QRSTUVWXYZ".parse()?,
//! });
//! index.insert(PageDigest {
//!     key: PageKey { document: "b.pdf".into(), page_index: 3 },
//!     digest: "6:ABCDEFGHIJ:0123456789".parse()?,
//! });
//!
//! let matches = index.query(20);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].score, 20);
//!
//! let clusters = index.cluster(20);
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].members.len(), 2);
//! # Ok::<(), simindex::IndexError>(())
//! ```

pub mod config;
pub mod index;
pub mod types;

mod blocking;

pub use crate::config::{BlockingConfig, IndexConfig, IndexError};
pub use crate::index::{compare, SimilarityIndex};
pub use crate::types::{PageDigest, PageKey, SimilarityCluster, SimilarityRecord};

/// Current index behavior version.
pub const SIMINDEX_VERSION: u16 = 1;
