//! Shared helpers for the integration suite.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pagedup::custody::CustodyLog;
use pagedup::{RasterConfig, RasterError, rasterize};

/// One page per entry, each with a line of text, on a `width` x `height`
/// point media box.
pub fn write_test_pdf_sized(path: &Path, texts: &[&str], width: i64, height: i64) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 36.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// A4 pages, one per entry.
pub fn write_test_pdf(path: &Path, texts: &[&str]) {
    write_test_pdf_sized(path, texts, 595, 842);
}

/// Probes for a usable PDFium library. Scans that need a real render
/// engine skip when none is installed.
pub fn engine_ready() -> bool {
    match rasterize(Path::new("__pdfium_probe__.pdf"), &RasterConfig::new()) {
        Err(RasterError::EngineUnavailable { .. }) => {
            eprintln!("skipping: PDFium library not available");
            false
        }
        _ => true,
    }
}

pub fn open_custody(dir: &Path) -> CustodyLog {
    CustodyLog::open(&dir.join("custody.jsonl")).unwrap()
}

pub fn custody_lines(dir: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(dir.join("custody.jsonl"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
