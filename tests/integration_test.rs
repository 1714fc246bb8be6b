// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for accessscan

use accessscan::aggregate::{distinct_rule_ids, summarize};
use accessscan::engine::NullEngine;
use accessscan::export::{self, ExportFormat};
use accessscan::finding::Severity;
use accessscan::scanner;
use accessscan::store::{FileBackend, NewReport, ReportStore, SqliteBackend, StoreLimits};
use std::path::Path;

const MAX_UPLOAD: u64 = 1024 * 1024;

async fn analyze_fixture(name: &str) -> accessscan::finding::AnalysisResult {
    let markup = scanner::read_markup_file(&Path::new("tests/fixtures").join(name), MAX_UPLOAD)
        .expect("fixture should be readable");
    scanner::analyze_markup(&NullEngine, &markup)
        .await
        .expect("analysis should succeed")
}

#[tokio::test]
async fn test_accessible_fixture_is_clean() {
    let result = analyze_fixture("accessible.html").await;
    assert!(
        result.is_empty(),
        "Accessible fixture should have no findings, got {:?}",
        distinct_rule_ids(result.findings())
    );
}

#[tokio::test]
async fn test_inaccessible_fixture() {
    let result = analyze_fixture("inaccessible.html").await;

    assert_eq!(
        distinct_rule_ids(result.findings()),
        vec![
            "image-alt-missing",
            "label-missing",
            "color-contrast-poor",
            "skip-link-missing",
            "button-semantic",
            "focus-indicator-missing",
            "target-size-small",
            "link-name-descriptive",
        ]
    );

    let counts = summarize(result.findings());
    assert_eq!(counts.get(Severity::Critical), 4);
    assert_eq!(counts.get(Severity::Serious), 3);
    assert_eq!(counts.get(Severity::Moderate), 3);
    assert_eq!(counts.get(Severity::Minor), 1);
    assert_eq!(counts.total(), 11);
}

#[tokio::test]
async fn test_saved_report_survives_file_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.json");
    let result = analyze_fixture("inaccessible.html").await;

    let store = ReportStore::open(FileBackend::new(&path), StoreLimits::default())
        .await
        .unwrap();
    let id = store
        .save(NewReport::new("Sale page", result.clone()))
        .await
        .unwrap();
    store.close().await.unwrap();

    let store = ReportStore::open(FileBackend::new(&path), StoreLimits::default())
        .await
        .unwrap();
    let report = store.get(&id).await.expect("report should be stored");
    assert_eq!(report.result, result);
    assert_eq!(report.total_issues(), 11);
    assert_eq!(store.search("sale").await.len(), 1);
}

#[tokio::test]
async fn test_bundle_moves_between_backends() {
    let dir = tempfile::tempdir().unwrap();
    let result = analyze_fixture("inaccessible.html").await;

    let file_store = ReportStore::open(
        FileBackend::new(dir.path().join("reports.json")),
        StoreLimits::default(),
    )
    .await
    .unwrap();
    for title in ["first", "second"] {
        file_store
            .save(NewReport::new(title, result.clone()))
            .await
            .unwrap();
    }
    let bundle = file_store.export_all().await.unwrap();

    let url = format!("sqlite://{}", dir.path().join("reports.db").display());
    let sqlite_store = ReportStore::open(SqliteBackend::new(url), StoreLimits::default())
        .await
        .unwrap();
    let outcome = sqlite_store.import_bundle(&bundle).await.unwrap();
    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(sqlite_store.list().await, file_store.list().await);

    let stats = sqlite_store.statistics(7).await;
    assert_eq!(stats.total_reports, 2);
    assert_eq!(stats.total_issues, 22);
    assert_eq!(stats.average_issues_per_report, 11);
    assert_eq!(stats.most_frequent_rule_ids[0].rule_id, "image-alt-missing");

    sqlite_store.close().await.unwrap();
}

#[tokio::test]
async fn test_exports_of_fixture() {
    let result = analyze_fixture("inaccessible.html").await;

    let text = export::export(&result, ExportFormat::Text).unwrap();
    let text = String::from_utf8(text.bytes).unwrap();
    assert!(text.contains("Total Issues: 11"));
    assert!(text.contains("Rule: button-semantic"));

    let csv = export::export(&result, ExportFormat::Csv).unwrap();
    let csv = String::from_utf8(csv.bytes).unwrap();
    // Header plus one row per occurrence
    assert_eq!(csv.lines().count(), 12);
    assert!(csv.starts_with("Rule,Description,Severity,WCAG Tags,Element,Help\n"));

    let pdf = export::export(&result, ExportFormat::Pdf).unwrap();
    if cfg!(feature = "pdf") {
        assert_eq!(pdf.format, ExportFormat::Pdf);
        assert!(pdf.bytes.starts_with(b"%PDF-"));
    } else {
        assert_eq!(pdf.format, ExportFormat::Text);
    }
}

#[test]
fn test_upload_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    std::fs::write(&path, "x".repeat(2048)).unwrap();

    let err = scanner::read_markup_file(&path, 1024).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input: File size must be less than 1 KB"
    );
}
