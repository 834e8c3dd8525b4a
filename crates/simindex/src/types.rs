//! Record types accumulated and produced by the similarity index.

use ctph::FuzzyHash;
use serde::{Deserialize, Serialize};

/// Identity of one page within the corpus.
///
/// `document` is the corpus-relative path, so keys order by document path
/// first and page position second.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PageKey {
    /// Corpus-relative document path.
    pub document: String,
    /// Zero-based page position within the document.
    pub page_index: usize,
}

/// One scorable page: its identity and its fuzzy digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDigest {
    pub key: PageKey,
    pub digest: FuzzyHash,
}

/// An above-threshold pair of pages.
///
/// `a` always orders before `b`, so a pair appears exactly once.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SimilarityRecord {
    pub a: PageKey,
    pub b: PageKey,
    /// Similarity on the 0-100 scale.
    pub score: u32,
}

/// A connected component of the above-threshold match graph.
///
/// Every scorable page lands in exactly one cluster; a page with no
/// qualifying match forms a singleton. Members are sorted by key, clusters
/// are sorted by their first member, and ids number the clusters in that
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityCluster {
    pub id: usize,
    pub members: Vec<PageKey>,
}

impl SimilarityCluster {
    /// Clusters with a single member carry no duplication signal.
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}
