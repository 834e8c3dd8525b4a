use std::collections::HashSet;

use simindex::{SimilarityCluster, SimilarityRecord};

use crate::types::{
    ClusterEntry, Exclusion, PairEntry, RasterSettings, Report, RunSummary, REPORT_FORMAT_VERSION,
};

/// Counters collected while walking and rendering the corpus.
///
/// Cluster and pair counts are derived from the findings at build time, so
/// callers only report what the scan itself observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounts {
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
}

/// Assembles the findings of a scan run into a [`Report`].
///
/// The builder does all the ordering work itself: members, pairs, clusters,
/// and exclusions are sorted here regardless of the order they arrive in.
/// Each scored pair is attached to the cluster that contains both of its
/// pages; a pair with an endpoint outside every cluster is counted in the
/// summary but listed under no cluster.
pub fn build(
    threshold: u32,
    raster: RasterSettings,
    counts: ScanCounts,
    clusters: &[SimilarityCluster],
    records: &[SimilarityRecord],
    mut exclusions: Vec<Exclusion>,
) -> Report {
    let mut scored: Vec<&SimilarityRecord> = records.iter().collect();
    scored.sort();

    let mut entries: Vec<ClusterEntry> = clusters
        .iter()
        .map(|cluster| {
            let lookup: HashSet<_> = cluster.members.iter().collect();
            let mut members = cluster.members.clone();
            members.sort();
            let mut pairs: Vec<PairEntry> = scored
                .iter()
                .filter(|record| lookup.contains(&record.a) && lookup.contains(&record.b))
                .map(|record| PairEntry {
                    a: record.a.clone(),
                    b: record.b.clone(),
                    score: record.score,
                })
                .collect();
            pairs.sort();
            ClusterEntry {
                id: cluster.id,
                members,
                pairs,
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.id);

    exclusions.sort();

    Report {
        format_version: REPORT_FORMAT_VERSION,
        threshold,
        raster,
        summary: RunSummary {
            documents_total: counts.documents_total,
            documents_failed: counts.documents_failed,
            pages_rendered: counts.pages_rendered,
            pages_render_failed: counts.pages_render_failed,
            pages_unscorable: counts.pages_unscorable,
            clusters: clusters.len(),
            matched_pairs: records.len(),
        },
        clusters: entries,
        exclusions,
    }
}

// ==================== Tests ====================
