// SPDX-License-Identifier: PMPL-1.0-or-later
//! Analysis pipeline: validate input, run the rule engine and the custom
//! checks, and aggregate their findings.

use crate::aggregate;
use crate::checks;
use crate::engine::{adapt_engine_result, RuleEngine};
use crate::error::{Error, Result};
use crate::finding::AnalysisResult;
use std::path::Path;
use tracing::info;

/// Accepted extensions for HTML file input
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Analyse a block of HTML
pub async fn analyze_markup(engine: &dyn RuleEngine, markup: &str) -> Result<AnalysisResult> {
    let markup = markup.trim();
    if markup.is_empty() {
        return Err(Error::InvalidInput("Please enter HTML code to analyze".to_string()));
    }

    let raw = engine.run(markup, None).await?;
    let engine_findings = adapt_engine_result(&raw)?;
    let custom_findings = checks::run_all(markup);

    info!(
        engine = engine.name(),
        engine_findings = engine_findings.len(),
        custom_findings = custom_findings.len(),
        "Analysis complete"
    );

    Ok(aggregate::aggregate(engine_findings, custom_findings, markup))
}

/// Read an HTML file for analysis, enforcing the upload rules
pub fn read_markup_file(path: &Path, max_bytes: u64) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !HTML_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::InvalidInput(
            "Please upload an HTML file (.html or .htm)".to_string(),
        ));
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(Error::InvalidInput(format!(
            "File size must be less than {}",
            crate::store::format_bytes(max_bytes)
        )));
    }

    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NullEngine;
    use crate::finding::Severity;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::io::Write;

    struct FixedEngine(Value);

    #[async_trait]
    impl RuleEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self, _html: &str, _base_url: Option<&str>) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = analyze_markup(&NullEngine, "   \n ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_engine_findings_come_first() {
        let engine = FixedEngine(json!({
            "violations": [{
                "id": "image-alt",
                "impact": "critical",
                "help": "Images must have alternate text",
                "nodes": [{ "html": "<img src=\"x.jpg\">", "target": ["img"] }]
            }]
        }));
        let result = analyze_markup(&engine, r##"<a href="#main">Skip to main</a><img src="x.jpg">"##)
            .await
            .unwrap();

        let ids: Vec<_> = result.findings().iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["image-alt", "image-alt-missing"]);
        assert!(result.findings().iter().all(|f| f.severity == Severity::Critical));
    }

    #[tokio::test]
    async fn test_source_is_trimmed() {
        let result = analyze_markup(&NullEngine, "  <p>hi</p>\n").await.unwrap();
        assert_eq!(result.source_markup(), "<p>hi</p>");
    }

    #[test]
    fn test_read_markup_file_rules() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("page.txt");
        std::fs::write(&txt, "<p>").unwrap();
        assert!(matches!(read_markup_file(&txt, 1024), Err(Error::InvalidInput(_))));

        let big = dir.path().join("big.HTML");
        let mut f = std::fs::File::create(&big).unwrap();
        f.write_all(&vec![b'a'; 2048]).unwrap();
        assert!(matches!(read_markup_file(&big, 1024), Err(Error::InvalidInput(_))));

        let ok = dir.path().join("ok.htm");
        std::fs::write(&ok, "<p>ok</p>").unwrap();
        assert_eq!(read_markup_file(&ok, 1024).unwrap(), "<p>ok</p>");
    }
}
