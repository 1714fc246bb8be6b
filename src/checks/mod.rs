// SPDX-License-Identifier: PMPL-1.0-or-later
//! Built-in accessibility checks run alongside the rule engine.
//!
//! Each check is a pure scan over a parsed document and its raw source and
//! produces findings with exactly one occurrence each. Several of them are
//! heuristics (substring and inline-style pattern matches) rather than
//! computed-style analysis; those are marked as such in their module docs.

pub mod contrast;
pub mod forms;
pub mod images;
pub mod keyboard;
pub mod links;
pub mod semantic;

use crate::finding::Finding;
use scraper::{ElementRef, Html};

/// Trait implemented by all custom checks
pub trait Check: Send + Sync {
    /// Rule identifier this check reports under
    fn rule_id(&self) -> &'static str;

    /// Short description of what this check looks for
    fn description(&self) -> &'static str;

    /// Scan a parsed document; `source` is the raw text it was parsed from
    fn run(&self, document: &Html, source: &str) -> Vec<Finding>;
}

/// The fixed battery, in reporting order
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(images::ImageAltCheck),
        Box::new(forms::LabelCheck),
        Box::new(contrast::ContrastHeuristic),
        Box::new(keyboard::SkipLinkCheck),
        Box::new(semantic::SemanticButtonCheck),
        Box::new(keyboard::FocusIndicatorHeuristic),
        Box::new(links::SmallTargetHeuristic),
        Box::new(links::LinkTextCheck),
    ]
}

/// Parse `source` and run every check against it
pub fn run_all(source: &str) -> Vec<Finding> {
    let document = Html::parse_document(source);
    let mut findings = Vec::new();

    for check in all_checks() {
        let found = check.run(&document, source);
        if !found.is_empty() {
            tracing::debug!(rule = check.rule_id(), count = found.len(), "custom check matched");
        }
        findings.extend(found);
    }

    findings
}

/// Outer markup of an element as it would appear in the document
pub(crate) fn outer_html(element: ElementRef<'_>) -> String {
    element.html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;

    #[test]
    fn test_clean_document_has_no_custom_findings() {
        let html = r##"
            <html lang="en"><body>
                <a href="#main">Skip to main content</a>
                <main id="main">
                    <img src="logo.png" alt="Company logo">
                    <label for="email">Email</label>
                    <input type="email" id="email">
                    <button>Send</button>
                    <a href="/pricing">See pricing plans</a>
                </main>
            </body></html>
        "##;
        let findings = run_all(html);
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_every_finding_has_one_occurrence() {
        let html = r#"
            <html><body>
                <img src="a.png"><img src="b.png">
                <div role="button">Go</div>
                <a href="/x">click here</a>
                <style>a { outline:none; }</style>
            </body></html>
        "#;
        let findings = run_all(html);
        assert!(findings.len() >= 5);
        assert!(findings.iter().all(|f| f.occurrences.len() == 1));
        assert!(findings.iter().any(|f| f.severity == Severity::Moderate));
    }

    #[test]
    fn test_battery_rule_ids_are_unique() {
        let mut ids: Vec<_> = all_checks().iter().map(|c| c.rule_id()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
