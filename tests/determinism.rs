//! Re-running a scan must reproduce the report byte for byte.

mod common;

use std::fs;
use std::path::Path;

use common::{engine_ready, open_custody, write_test_pdf};
use pagedup::config::PagedupConfig;
use pagedup::{scan_corpus, write_report};
use tempfile::TempDir;

fn write_corpus(root: &Path) {
    fs::create_dir_all(root.join("nested")).unwrap();
    write_test_pdf(
        &root.join("alpha.pdf"),
        &["Quarterly revenue audit", "Shared closing statement"],
    );
    write_test_pdf(
        &root.join("nested/bravo.pdf"),
        &["Cover sheet", "Exhibit list", "Shared closing statement"],
    );
}

#[test]
fn repeated_scans_serialize_to_identical_bytes() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);
    let config = PagedupConfig::default();

    let mut custody_a = open_custody(&dir.path().join("run-a"));
    let first = scan_corpus(&corpus, &config, 70, &mut custody_a).unwrap();
    let mut custody_b = open_custody(&dir.path().join("run-b"));
    let second = scan_corpus(&corpus, &config, 70, &mut custody_b).unwrap();

    let bytes_a = first.report.to_json_pretty().unwrap();
    let bytes_b = second.report.to_json_pretty().unwrap();
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn rewritten_report_files_match_byte_for_byte() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);
    let config = PagedupConfig::default();

    let mut custody = open_custody(dir.path());
    let output = scan_corpus(&corpus, &config, 70, &mut custody).unwrap();

    let path_a = dir.path().join("report-a.json");
    let path_b = dir.path().join("report-b.json");
    let sha_a = write_report(&output.report, &path_a).unwrap();
    let sha_b = write_report(&output.report, &path_b).unwrap();

    assert_eq!(sha_a, sha_b);
    assert_eq!(fs::read(&path_a).unwrap(), fs::read(&path_b).unwrap());
}

#[test]
fn report_is_independent_of_the_corpus_location() {
    if !engine_ready() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let corpus_a = dir.path().join("first-home/corpus");
    let corpus_b = dir.path().join("second-home/deeper/corpus");
    fs::create_dir_all(&corpus_a).unwrap();
    fs::create_dir_all(&corpus_b).unwrap();
    write_corpus(&corpus_a);
    write_corpus(&corpus_b);
    let config = PagedupConfig::default();

    let mut custody_a = open_custody(&dir.path().join("run-a"));
    let first = scan_corpus(&corpus_a, &config, 70, &mut custody_a).unwrap();
    let mut custody_b = open_custody(&dir.path().join("run-b"));
    let second = scan_corpus(&corpus_b, &config, 70, &mut custody_b).unwrap();

    assert_eq!(
        first.report.to_json_pretty().unwrap(),
        second.report.to_json_pretty().unwrap()
    );
}
