use serde::{Deserialize, Serialize};
use simindex::PageKey;
use thiserror::Error;

/// Version stamp embedded in every report.
///
/// Bump this when the report layout changes shape, not when runs merely
/// produce different findings.
pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Errors produced while serializing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be encoded as JSON.
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Echo of the raster settings a scan ran with.
///
/// The color mode is recorded by its wire name (`"grayscale"` or `"rgb"`)
/// so the report stays readable without the rendering crate on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterSettings {
    /// Render resolution in dots per inch.
    pub dpi: u32,
    /// Color mode name the pages were rendered in.
    pub color_mode: String,
}

/// Aggregate counters for a single scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Documents discovered by the corpus walk.
    pub documents_total: usize,
    /// Documents that could not be opened or rendered at all.
    pub documents_failed: usize,
    /// Pages rendered successfully.
    pub pages_rendered: usize,
    /// Pages that failed to render inside otherwise readable documents.
    pub pages_render_failed: usize,
    /// Pages rendered but too small to digest.
    pub pages_unscorable: usize,
    /// Similarity clusters found at the run threshold.
    pub clusters: usize,
    /// Page pairs at or above the run threshold.
    pub matched_pairs: usize,
}

/// One scored pair inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairEntry {
    /// First page of the pair. Always orders before `b`.
    pub a: PageKey,
    /// Second page of the pair.
    pub b: PageKey,
    /// Similarity score in `[threshold, 100]`.
    pub score: u32,
}

/// One similarity cluster and the pairwise evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// Stable cluster id, assigned in member order.
    pub id: usize,
    /// Member pages, sorted by document then page index.
    pub members: Vec<PageKey>,
    /// Scored pairs between members, sorted.
    pub pairs: Vec<PairEntry>,
}

/// Why an item was left out of similarity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    /// The whole document was unreadable.
    DocumentFailed,
    /// A single page failed to render.
    PageRenderFailed,
    /// The page rendered but produced no digest.
    PageUnscorable,
}

/// A document or page excluded from scoring, with the reason kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Exclusion {
    /// Document the exclusion applies to.
    pub document: String,
    /// Page index within the document, absent for whole-document failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    /// What kind of failure excluded the item.
    pub kind: ExclusionKind,
    /// Human-readable failure description.
    pub reason: String,
}

/// Complete findings of one scan run.
///
/// Every sequence is sorted at build time, so two runs over the same inputs
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report layout version.
    pub format_version: u32,
    /// Similarity threshold the run was scored at.
    pub threshold: u32,
    /// Raster settings the pages were rendered with.
    pub raster: RasterSettings,
    /// Aggregate run counters.
    pub summary: RunSummary,
    /// Similarity clusters, ordered by id.
    pub clusters: Vec<ClusterEntry>,
    /// Items excluded from scoring, sorted by document then page.
    pub exclusions: Vec<Exclusion>,
}

impl Report {
    /// Serializes the report as pretty-printed JSON with a trailing newline.
    ///
    /// The byte output is a pure function of the report contents.
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        let mut rendered = serde_json::to_string_pretty(self)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

// ==================== Tests ====================
