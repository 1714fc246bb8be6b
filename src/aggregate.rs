// SPDX-License-Identifier: PMPL-1.0-or-later
//! Merging and summarising findings.
//!
//! This is the only place severity totals are computed; the exporters and
//! the report store call [`summarize`] rather than counting on their own.

use crate::finding::{AnalysisResult, Finding, Severity, SeverityCounts};
use chrono::Utc;
use std::collections::HashSet;

/// Merge engine and custom findings into a new analysis result
///
/// Engine findings come first; relative order is kept on both sides and
/// nothing is de-duplicated, so an issue flagged by both sources appears
/// twice.
pub fn aggregate(
    engine_findings: Vec<Finding>,
    custom_findings: Vec<Finding>,
    source_markup: &str,
) -> AnalysisResult {
    let mut findings = engine_findings;
    findings.extend(custom_findings);
    AnalysisResult::new(findings, Utc::now(), source_markup.to_string())
}

/// Occurrence totals per severity
pub fn summarize(findings: &[Finding]) -> SeverityCounts {
    findings.iter().fold(SeverityCounts::default(), |mut counts, f| {
        counts.add(f.severity, f.occurrence_count());
        counts
    })
}

/// Total occurrences across all findings
pub fn total_occurrences(findings: &[Finding]) -> usize {
    findings.iter().map(Finding::occurrence_count).sum()
}

/// Unique rule ids in first-seen order
pub fn distinct_rule_ids(findings: &[Finding]) -> Vec<String> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .filter(|f| seen.insert(f.rule_id.as_str()))
        .map(|f| f.rule_id.clone())
        .collect()
}

/// Criteria for narrowing a finding list; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct FindingFilter {
    pub severity: Option<Severity>,
    pub rule_id: Option<String>,
}

impl FindingFilter {
    fn matches(&self, finding: &Finding) -> bool {
        self.severity.map_or(true, |s| finding.severity == s)
            && self.rule_id.as_deref().map_or(true, |r| finding.rule_id == r)
    }
}

/// Findings matching every criterion of the filter, in order
pub fn filter_findings<'a>(findings: &'a [Finding], filter: &FindingFilter) -> Vec<&'a Finding> {
    findings.iter().filter(|f| filter.matches(f)).collect()
}

/// A copy of `result` holding only the findings that match `filter`
///
/// Timestamp and source markup are kept, so the narrowed result exports
/// like the original.
pub fn narrow(result: &AnalysisResult, filter: &FindingFilter) -> AnalysisResult {
    let findings = filter_findings(result.findings(), filter)
        .into_iter()
        .cloned()
        .collect();
    AnalysisResult::new(
        findings,
        result.timestamp_utc(),
        result.source_markup().to_string(),
    )
}
