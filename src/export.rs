//! PNG evidence export for matched clusters.
//!
//! Re-renders every member page of each multi-member cluster into
//! `<export_dir>/cluster_<id>/`, one lossless PNG per page. Export is a
//! best-effort evidence step: a page that fails to render or save is
//! logged and skipped, and the run outcome is unaffected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use raster::{RasterConfig, render_page};
use simindex::SimilarityCluster;
use tracing::{info, warn};

/// Totals from one export pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    /// PNGs written.
    pub exported: usize,
    /// Member pages that could not be rendered or saved.
    pub failed: usize,
}

/// Flattens a corpus-relative document path into a single file name
/// component. ASCII alphanumerics, `-` and `.` pass through; everything
/// else, separators included, becomes `_`.
fn sanitize_component(document: &str) -> String {
    document
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn member_png_path(cluster_dir: &Path, document: &str, page_index: usize) -> PathBuf {
    cluster_dir.join(format!(
        "{}_p{}.png",
        sanitize_component(document),
        page_index
    ))
}

/// Exports every multi-member cluster under `export_dir`.
///
/// Only a failure to create `export_dir` itself is an error; everything
/// past that point is tallied in the summary.
pub fn export_clusters(
    input_root: &Path,
    export_dir: &Path,
    clusters: &[SimilarityCluster],
    config: &RasterConfig,
) -> Result<ExportSummary, io::Error> {
    fs::create_dir_all(export_dir)?;

    let mut summary = ExportSummary::default();
    for cluster in clusters {
        if cluster.is_singleton() {
            continue;
        }
        let cluster_dir = export_dir.join(format!("cluster_{}", cluster.id));
        if let Err(err) = fs::create_dir_all(&cluster_dir) {
            warn!(cluster = cluster.id, error = %err, "cannot create cluster directory");
            summary.failed += cluster.members.len();
            continue;
        }
        for member in &cluster.members {
            let source = input_root.join(&member.document);
            let target = member_png_path(&cluster_dir, &member.document, member.page_index);
            let result = render_page(&source, member.page_index, config)
                .and_then(|image| image.save_png(&target));
            match result {
                Ok(()) => summary.exported += 1,
                Err(err) => {
                    warn!(
                        document = %member.document,
                        page_index = member.page_index,
                        error = %err,
                        "cluster page export failed"
                    );
                    summary.failed += 1;
                }
            }
        }
    }
    info!(
        exported = summary.exported,
        failed = summary.failed,
        "cluster export finished"
    );
    Ok(summary)
}
