//! Deterministic report assembly for page similarity scans.
//!
//! ## Contract
//!
//! - **Pure assembly**: [`build`] turns scan counters, clusters, scored
//!   pairs, and exclusions into a [`Report`] without touching the
//!   filesystem or the clock.
//! - **Stable bytes**: every sequence in the report is sorted during
//!   assembly and the JSON encoding contains no maps or timestamps, so
//!   identical findings always serialize to identical bytes.
//! - **Evidence preserved**: each cluster lists its members and every
//!   scored pair between them, and every excluded document or page is
//!   listed with its verbatim failure reason.
//!
//! ## Example
//!
//! ```
//! use report::{build, RasterSettings, ScanCounts};
//! use simindex::{PageKey, SimilarityCluster, SimilarityRecord};
//!
//! let first = PageKey { document: "a.pdf".to_string(), page_index: 0 };
//! let second = PageKey { document: "b.pdf".to_string(), page_index: 4 };
//! let clusters = vec![SimilarityCluster {
//!     id: 0,
//!     members: vec![first.clone(), second.clone()],
//! }];
//! let records = vec![SimilarityRecord { a: first, b: second, score: 92 }];
//! let counts = ScanCounts {
//!     documents_total: 2,
//!     pages_rendered: 6,
//!     ..ScanCounts::default()
//! };
//! let raster = RasterSettings { dpi: 150, color_mode: "grayscale".to_string() };
//!
//! let report = build(80, raster, counts, &clusters, &records, Vec::new());
//! assert_eq!(report.summary.clusters, 1);
//! assert_eq!(report.summary.matched_pairs, 1);
//!
//! let rendered = report.to_json_pretty()?;
//! assert!(rendered.ends_with('\n'));
//! # Ok::<(), report::ReportError>(())
//! ```

pub mod builder;
pub mod types;

pub use builder::{build, ScanCounts};
pub use types::{
    ClusterEntry, Exclusion, ExclusionKind, PairEntry, RasterSettings, Report, ReportError,
    RunSummary, REPORT_FORMAT_VERSION,
};
