// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule engine boundary.
//!
//! The accessibility rule engine is an external program (axe-core running
//! in a headless DOM). This module defines the seam it is reached through
//! ([`RuleEngine`]), the result shape it is expected to return
//! ([`EngineReport`]) and the single adapter from that shape into
//! [`Finding`]s.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::finding::{Finding, Occurrence, Severity};

/// Environment variable carrying the document URL to the engine process
pub const BASE_URL_ENV: &str = "ACCESSSCAN_BASE_URL";

/// Something that can evaluate HTML and return a raw engine result
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Run the engine against `html`; `base_url` is the document's origin
    /// when it was fetched from the network
    async fn run(&self, html: &str, base_url: Option<&str>) -> Result<Value>;
}

/// Engine that never reports anything; used when no engine is configured
pub struct NullEngine;

#[async_trait]
impl RuleEngine for NullEngine {
    fn name(&self) -> &str {
        "none"
    }

    async fn run(&self, _html: &str, _base_url: Option<&str>) -> Result<Value> {
        Ok(serde_json::json!({ "violations": [] }))
    }
}

/// Engine run as a child process
///
/// The HTML is written to the child's stdin and an axe-shaped JSON result
/// is read from its stdout. The child (and the simulated document it owns)
/// is killed if the future is dropped or any step fails before it exits.
pub struct ExternalEngine {
    command: String,
    args: Vec<String>,
}

impl ExternalEngine {
    /// Create an engine invoking `command` with `args`
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl RuleEngine for ExternalEngine {
    fn name(&self) -> &str {
        &self.command
    }

    async fn run(&self, html: &str, base_url: Option<&str>) -> Result<Value> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(url) = base_url {
            cmd.env(BASE_URL_ENV, url);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::EngineExecution(format!("failed to start `{}`: {}", self.command, e))
        })?;

        // Feed stdin while collecting output so neither side stalls on a full pipe
        let stdin = child.stdin.take();
        let feed = async move {
            match stdin {
                Some(mut stdin) => {
                    let written = stdin.write_all(html.as_bytes()).await;
                    drop(stdin);
                    written
                }
                None => Ok(()),
            }
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| Error::EngineExecution(format!("engine did not complete: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::EngineExecution(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        match written {
            Ok(()) => {}
            // The engine may legitimately stop reading early
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!(engine = %self.command, "engine closed stdin early");
            }
            Err(e) => {
                return Err(Error::EngineExecution(format!("failed to send document: {}", e)));
            }
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::EngineExecution(format!("engine produced invalid JSON: {}", e)))
    }
}

/// Result shape returned by the engine (axe-core's `run` result)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReport {
    #[serde(default)]
    pub violations: Vec<EngineFinding>,
}

/// One engine violation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFinding {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<EngineNode>,
}

/// One element an engine violation applies to
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineNode {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub target: Vec<Value>,
    #[serde(default)]
    pub failure_summary: Option<String>,
}

impl EngineNode {
    /// Flatten the engine's target path into one selector string
    fn selector(&self) -> String {
        self.target
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                // Shadow DOM paths arrive as nested arrays
                Value::Array(parts) => parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" >>> "),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<EngineFinding> for Finding {
    fn from(v: EngineFinding) -> Self {
        let mut occurrences: Vec<Occurrence> = v
            .nodes
            .iter()
            .map(|node| Occurrence {
                markup_snippet: node.html.clone(),
                target_selector: node.selector(),
                failure_summary: node.failure_summary.clone(),
            })
            .collect();

        // A violation without nodes still counts as one document-level issue
        if occurrences.is_empty() {
            occurrences.push(Occurrence::new("", "html"));
        }

        Finding {
            rule_id: v.id,
            severity: Severity::from_impact(v.impact.as_deref()),
            description: v.description,
            help_text: v.help,
            help_url: v.help_url.filter(|u| !u.is_empty()),
            wcag_tags: v.tags.into_iter().filter(|t| t.starts_with("wcag")).collect(),
            occurrences,
        }
    }
}

/// Convert a raw engine result into findings
pub fn adapt_engine_result(raw: &Value) -> Result<Vec<Finding>> {
    let report = EngineReport::deserialize(raw)
        .map_err(|e| Error::EngineExecution(format!("unrecognised engine result: {}", e)))?;
    Ok(report.violations.into_iter().map(Finding::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> Value {
        json!({
            "testEngine": { "name": "axe-core", "version": "4.8.2" },
            "passes": [],
            "violations": [
                {
                    "id": "image-alt",
                    "impact": "critical",
                    "description": "Ensures <img> elements have alternate text",
                    "help": "Images must have alternate text",
                    "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/image-alt",
                    "tags": ["cat.text-alternatives", "wcag2a", "wcag111", "section508"],
                    "nodes": [
                        { "html": "<img src=\"a.png\">", "target": ["img"], "failureSummary": "Fix any of the following" },
                        { "html": "<img src=\"b.png\">", "target": [["my-widget", "img"]] }
                    ]
                },
                {
                    "id": "region",
                    "impact": null,
                    "description": "Ensures all page content is contained by landmarks",
                    "help": "All page content should be contained by landmarks",
                    "tags": ["best-practice"],
                    "nodes": []
                }
            ]
        })
    }

    #[test]
    fn test_adapt_engine_result() {
        let findings = adapt_engine_result(&sample_result()).unwrap();
        assert_eq!(findings.len(), 2);

        let alt = &findings[0];
        assert_eq!(alt.rule_id, "image-alt");
        assert_eq!(alt.severity, Severity::Critical);
        assert_eq!(alt.help_text, "Images must have alternate text");
        assert_eq!(alt.occurrences.len(), 2);
        assert_eq!(alt.occurrences[1].target_selector, "my-widget >>> img");
        assert!(alt.wcag_tags.contains("wcag111"));
        assert!(!alt.wcag_tags.contains("section508"));
    }

    #[test]
    fn test_missing_impact_and_nodes() {
        let findings = adapt_engine_result(&sample_result()).unwrap();
        let region = &findings[1];
        assert_eq!(region.severity, Severity::Minor);
        assert_eq!(region.occurrences.len(), 1);
        assert!(region.wcag_tags.is_empty());
        assert_eq!(region.help_url, None);
    }

    #[test]
    fn test_unrecognised_shape() {
        let err = adapt_engine_result(&json!({ "violations": "nope" })).unwrap_err();
        assert!(matches!(err, Error::EngineExecution(_)));
    }

    #[test]
    fn test_no_violations_field() {
        assert!(adapt_engine_result(&json!({})).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_engine() {
        let raw = NullEngine.run("<p>x</p>", None).await.unwrap();
        assert!(adapt_engine_result(&raw).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_engine_reads_stdout() {
        let engine = ExternalEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; printf '{"violations":[{"id":"x","impact":"serious","nodes":[{"html":"<b>","target":["b"]}]}]}'"#
                    .to_string(),
            ],
        );
        let raw = engine.run("<b>hi</b>", None).await.unwrap();
        let findings = adapt_engine_result(&raw).unwrap();
        assert_eq!(findings[0].rule_id, "x");
        assert_eq!(findings[0].severity, Severity::Serious);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_engine_receives_base_url() {
        let engine = ExternalEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; printf '{"url":"%s"}' "$ACCESSSCAN_BASE_URL""#.to_string(),
            ],
        );
        let raw = engine.run("<p>", Some("https://example.com/")).await.unwrap();
        assert_eq!(raw["url"], "https://example.com/");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_engine_failure() {
        let engine = ExternalEngine::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo boom >&2; exit 3".to_string()],
        );
        let err = engine.run("<p>", None).await.unwrap_err();
        match err {
            Error::EngineExecution(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_engine_chatty_stderr_with_large_document() {
        // Fills the stderr pipe before reading any input
        let engine = ExternalEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"head -c 200000 /dev/zero >&2; cat > /dev/null; echo '{"violations":[]}'"#
                    .to_string(),
            ],
        );
        let html = "<p>".repeat(100_000);
        let raw = tokio::time::timeout(std::time::Duration::from_secs(30), engine.run(&html, None))
            .await
            .expect("engine run should not stall")
            .unwrap();
        assert!(adapt_engine_result(&raw).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_engine_binary() {
        let engine = ExternalEngine::new("/definitely/not/an/engine", Vec::new());
        assert!(matches!(
            engine.run("<p>", None).await,
            Err(Error::EngineExecution(_))
        ));
    }
}
