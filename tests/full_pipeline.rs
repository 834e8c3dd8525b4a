//! End-to-end scans over small synthesized corpora.

mod common;

use std::fs;

use common::{custody_lines, engine_ready, open_custody, write_test_pdf};
use pagedup::config::PagedupConfig;
use pagedup::export::export_clusters;
use pagedup::{PageKey, scan_corpus, write_report};
use tempfile::TempDir;

/// Three documents, eleven pages, exactly one planted duplicate: page 2 of
/// a.pdf carries the same text as page 5 of b.pdf.
fn write_three_document_corpus(root: &std::path::Path) {
    write_test_pdf(
        &root.join("a.pdf"),
        &[
            "Quarterly revenue audit",
            "Inventory reconciliation",
            "Shared closing statement",
        ],
    );
    write_test_pdf(
        &root.join("b.pdf"),
        &[
            "Cover sheet",
            "Exhibit list",
            "Witness summary",
            "Filing index",
            "Appendix notes",
            "Shared closing statement",
        ],
    );
    write_test_pdf(&root.join("c.pdf"), &["Memo header", "Distribution list"]);
}

#[test]
fn planted_duplicate_lands_in_a_two_member_cluster() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_three_document_corpus(&corpus);
    let mut custody = open_custody(dir.path());

    let output = scan_corpus(&corpus, &PagedupConfig::default(), 70, &mut custody).unwrap();
    let report = &output.report;

    assert_eq!(report.summary.documents_total, 3);
    assert_eq!(report.summary.documents_failed, 0);
    assert_eq!(report.summary.pages_rendered, 11);
    assert_eq!(report.summary.pages_unscorable, 0);
    assert_eq!(report.summary.matched_pairs, 1);

    let multi: Vec<_> = output
        .clusters
        .iter()
        .filter(|cluster| cluster.members.len() > 1)
        .collect();
    assert_eq!(multi.len(), 1);
    assert_eq!(
        multi[0].members,
        vec![
            PageKey {
                document: "a.pdf".to_string(),
                page_index: 2,
            },
            PageKey {
                document: "b.pdf".to_string(),
                page_index: 5,
            },
        ]
    );

    let entry = report
        .clusters
        .iter()
        .find(|cluster| cluster.id == multi[0].id)
        .unwrap();
    assert_eq!(entry.pairs.len(), 1);
    assert!(entry.pairs[0].score >= 70);
}

#[test]
fn scan_records_custody_evidence_per_document() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_three_document_corpus(&corpus);
    let mut custody = open_custody(dir.path());

    scan_corpus(&corpus, &PagedupConfig::default(), 70, &mut custody).unwrap();

    let lines = custody_lines(dir.path());
    let ingested: Vec<_> = lines
        .iter()
        .filter(|line| line["event"] == "document_ingested")
        .collect();
    assert_eq!(ingested.len(), 3);
    assert_eq!(ingested[0]["document"], "a.pdf");
    assert_eq!(ingested[0]["page_count"], 3);
    assert_eq!(ingested[1]["document"], "b.pdf");
    assert_eq!(ingested[1]["page_count"], 6);
    assert!(
        ingested
            .iter()
            .all(|line| line["sha256"].as_str().unwrap().len() == 64)
    );
}

#[test]
fn written_report_reparses_with_matching_checksum() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_three_document_corpus(&corpus);
    let mut custody = open_custody(dir.path());

    let output = scan_corpus(&corpus, &PagedupConfig::default(), 70, &mut custody).unwrap();
    let report_path = dir.path().join("report.json");
    let sha = write_report(&output.report, &report_path).unwrap();

    let bytes = fs::read(&report_path).unwrap();
    assert_eq!(sha, pagedup::custody::sha256_hex_bytes(&bytes));
    assert!(bytes.ends_with(b"\n"));

    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["format_version"], 1);
    assert_eq!(parsed["threshold"], 70);
    assert_eq!(parsed["raster"]["dpi"], 150);
    assert_eq!(parsed["raster"]["color_mode"], "grayscale");
}

#[test]
fn export_writes_pngs_for_the_matched_cluster_only() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_three_document_corpus(&corpus);
    let mut custody = open_custody(dir.path());

    let output = scan_corpus(&corpus, &PagedupConfig::default(), 70, &mut custody).unwrap();
    let export_dir = dir.path().join("exports");
    let summary = export_clusters(
        &corpus,
        &export_dir,
        &output.clusters,
        &pagedup::RasterConfig::new(),
    )
    .unwrap();

    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed, 0);

    let multi = output
        .clusters
        .iter()
        .find(|cluster| cluster.members.len() > 1)
        .unwrap();
    let cluster_dir = export_dir.join(format!("cluster_{}", multi.id));
    assert!(cluster_dir.join("a.pdf_p2.png").is_file());
    assert!(cluster_dir.join("b.pdf_p5.png").is_file());

    // Singleton clusters leave nothing behind.
    let entries = fs::read_dir(&export_dir).unwrap().count();
    assert_eq!(entries, 1);
}
