// SPDX-License-Identifier: PMPL-1.0-or-later
//! Colour contrast heuristic - WCAG 1.4.3 Contrast (Minimum) (Level AA)
//!
//! Heuristic: looks for one known low-contrast colour pair (#9a9a9a on #eee,
//! 1.85:1) anywhere in the raw source. It does not compute contrast for the
//! document; the rule engine covers real contrast analysis.

use crate::checks::Check;
use crate::finding::{Finding, Occurrence, Severity};
use scraper::Html;

/// Substrings that must both appear for the heuristic to fire
const LOW_CONTRAST_PAIR: (&str, &str) = ("color: #9a9a9a", "background: #eee");

/// Known-bad colour pair heuristic
pub struct ContrastHeuristic;

impl Check for ContrastHeuristic {
    fn rule_id(&self) -> &'static str {
        "color-contrast-poor"
    }

    fn description(&self) -> &'static str {
        "Elements must have sufficient color contrast"
    }

    fn run(&self, _document: &Html, source: &str) -> Vec<Finding> {
        let (fg, bg) = LOW_CONTRAST_PAIR;
        if !(source.contains(fg) && source.contains(bg)) {
            return Vec::new();
        }

        vec![Finding::new(
            self.rule_id(),
            Severity::Serious,
            self.description(),
            Occurrence::new(r#"<body style="color: #9a9a9a; background: #eee;">"#, "body")
                .with_failure_summary("Fix this: Element has insufficient color contrast of 1.85:1"),
        )
        .with_help("Text color contrast ratio must be at least 4.5:1")
        .with_help_url("https://dequeuniversity.com/rules/axe/4.8/color-contrast")
        .with_wcag_tags(&["wcag2aa", "wcag143"])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(html: &str) -> Vec<Finding> {
        ContrastHeuristic.run(&Html::parse_document(html), html)
    }

    #[test]
    fn test_pair_present() {
        let html = r#"<body style="color: #9a9a9a; background: #eee;"><p>faint</p></body>"#;
        let findings = check(html);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Serious);
        assert_eq!(findings[0].occurrences[0].target_selector, "body");
    }

    #[test]
    fn test_only_one_half_present() {
        assert!(check(r#"<p style="color: #9a9a9a">x</p>"#).is_empty());
        assert!(check(r#"<p style="background: #eee">x</p>"#).is_empty());
    }

    #[test]
    fn test_pair_in_separate_elements_still_fires() {
        let html = r#"
            <style>p { color: #9a9a9a; }</style>
            <div style="background: #eee; color: #000">dark text</div>
        "#;
        assert_eq!(check(html).len(), 1);
    }
}
