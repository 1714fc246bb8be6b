// SPDX-License-Identifier: PMPL-1.0-or-later
//! Finding model shared by the rule engine adapter, the custom checks,
//! the report store and the exporters.
//!
//! All types serialize with camelCase field names so the persisted report
//! collection and the JSON bundle keep one stable shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Impact classification of a finding, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    /// Blocks access for some users
    Critical,
    /// Significant barrier
    Serious,
    /// Some users will struggle
    Moderate,
    /// Best-practice deviation
    Minor,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    /// Parse an engine impact value; missing or unknown values become `Minor`
    pub fn from_impact(impact: Option<&str>) -> Self {
        match impact.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("critical") => Severity::Critical,
            Some("serious") => Severity::Serious,
            Some("moderate") => Severity::Moderate,
            _ => Severity::Minor,
        }
    }

    /// Lowercase name as used in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }

    /// RGB colour used for severity labels in rendered documents
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Severity::Critical => (220, 38, 38),
            Severity::Serious => (234, 88, 12),
            Severity::Moderate => (202, 138, 4),
            Severity::Minor => (22, 163, 74),
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::from_impact(Some(&value))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "serious" => Ok(Severity::Serious),
            "moderate" => Ok(Severity::Moderate),
            "minor" => Ok(Severity::Minor),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// One concrete element where a rule was violated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// Outer markup of the offending element
    pub markup_snippet: String,
    /// Selector locating the element
    pub target_selector: String,
    /// Short explanation of what failed
    #[serde(default)]
    pub failure_summary: Option<String>,
}

impl Occurrence {
    /// Create an occurrence without a failure summary
    pub fn new(markup_snippet: impl Into<String>, target_selector: impl Into<String>) -> Self {
        Self {
            markup_snippet: markup_snippet.into(),
            target_selector: target_selector.into(),
            failure_summary: None,
        }
    }

    /// Set the failure summary
    pub fn with_failure_summary(mut self, summary: &str) -> Self {
        self.failure_summary = Some(summary.to_string());
        self
    }
}

/// A detected accessibility rule violation with one or more occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Rule identifier (e.g., "image-alt-missing")
    pub rule_id: String,
    /// Impact classification
    pub severity: Severity,
    /// What the rule requires
    pub description: String,
    /// How to fix it
    pub help_text: String,
    /// Reference documentation
    #[serde(default)]
    pub help_url: Option<String>,
    /// WCAG references (e.g., "wcag2a", "wcag111")
    #[serde(default)]
    pub wcag_tags: BTreeSet<String>,
    /// Offending elements, never empty
    pub occurrences: Vec<Occurrence>,
}

impl Finding {
    /// Create a finding with a single occurrence
    pub fn new(rule_id: &str, severity: Severity, description: &str, occurrence: Occurrence) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            description: description.to_string(),
            help_text: String::new(),
            help_url: None,
            wcag_tags: BTreeSet::new(),
            occurrences: vec![occurrence],
        }
    }

    /// Set the help text
    pub fn with_help(mut self, help_text: &str) -> Self {
        self.help_text = help_text.to_string();
        self
    }

    /// Set the help URL
    pub fn with_help_url(mut self, url: &str) -> Self {
        self.help_url = Some(url.to_string());
        self
    }

    /// Add WCAG reference tags
    pub fn with_wcag_tags(mut self, tags: &[&str]) -> Self {
        self.wcag_tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Number of offending elements
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }

    /// WCAG tags joined for display
    pub fn wcag_tags_joined(&self) -> String {
        self.wcag_tags.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Occurrence totals per severity, always derived from a finding sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl SeverityCounts {
    /// Count for one severity
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }

    pub(crate) fn add(&mut self, severity: Severity, count: usize) {
        match severity {
            Severity::Critical => self.critical += count,
            Severity::Serious => self.serious += count,
            Severity::Moderate => self.moderate += count,
            Severity::Minor => self.minor += count,
        }
    }

    /// Sum across all buckets
    pub fn total(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }

    /// No issues of any severity
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// The outcome of one analysis run
///
/// Created once by [`crate::aggregate::aggregate`] and never mutated; a new
/// analysis always produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    findings: Vec<Finding>,
    timestamp_utc: DateTime<Utc>,
    source_markup: String,
}

impl AnalysisResult {
    pub(crate) fn new(findings: Vec<Finding>, timestamp_utc: DateTime<Utc>, source_markup: String) -> Self {
        Self {
            findings,
            timestamp_utc,
            source_markup,
        }
    }

    /// Findings in report order (engine first, then custom checks)
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// When the analysis ran
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp_utc
    }

    /// The analysed HTML
    pub fn source_markup(&self) -> &str {
        &self.source_markup
    }

    /// Whether no findings were produced
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// A saved, named snapshot of one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier assigned by the store
    pub id: String,
    /// User-facing title
    pub title: String,
    /// When the report was saved
    pub created_at_utc: DateTime<Utc>,
    /// The analysis snapshot
    pub result: AnalysisResult,
    /// Summary computed at save time
    pub severity_counts: SeverityCounts,
}

impl Report {
    /// Total occurrences across all findings
    pub fn total_issues(&self) -> usize {
        self.severity_counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_defaults_to_minor() {
        assert_eq!(Severity::from_impact(None), Severity::Minor);
        assert_eq!(Severity::from_impact(Some("bogus")), Severity::Minor);
        assert_eq!(Severity::from_impact(Some("Critical")), Severity::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical < Severity::Serious);
        assert!(Severity::Moderate < Severity::Minor);
    }

    #[test]
    fn test_severity_lenient_deserialize() {
        let s: Severity = serde_json::from_str("\"serious\"").unwrap();
        assert_eq!(s, Severity::Serious);
        let s: Severity = serde_json::from_str("\"unheard-of\"").unwrap();
        assert_eq!(s, Severity::Minor);
        assert_eq!(serde_json::to_string(&Severity::Moderate).unwrap(), "\"moderate\"");
    }

    #[test]
    fn test_finding_serializes_camel_case() {
        let finding = Finding::new(
            "image-alt-missing",
            Severity::Critical,
            "Images must have alternate text",
            Occurrence::new("<img src=\"x.jpg\">", "img:nth-child(1)"),
        )
        .with_wcag_tags(&["wcag2a", "wcag111"]);

        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["ruleId"], "image-alt-missing");
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["occurrences"][0]["markupSnippet"], "<img src=\"x.jpg\">");
        assert!(value["wcagTags"].is_array());
    }

    #[test]
    fn test_counts_total() {
        let mut counts = SeverityCounts::default();
        assert!(counts.is_clean());
        counts.add(Severity::Critical, 2);
        counts.add(Severity::Minor, 3);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(Severity::Critical), 2);
    }
}
