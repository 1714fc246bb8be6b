// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard navigation checks - WCAG 2.4.1 Bypass Blocks (Level A),
//! 2.4.7 Focus Visible (Level AA)
//!
//! - A skip link must be present: the first in-page anchor should mention
//!   "skip" or "main".
//! - Focus outlines must not be suppressed. This one is a heuristic: it
//!   matches `outline: none` / `outline:none` in the raw source and reports
//!   once per document regardless of how many rules use it.

use crate::checks::Check;
use crate::finding::{Finding, Occurrence, Severity};
use regex::Regex;
use scraper::{Html, Selector};

/// Check for a skip navigation link
pub struct SkipLinkCheck;

impl Check for SkipLinkCheck {
    fn rule_id(&self) -> &'static str {
        "skip-link-missing"
    }

    fn description(&self) -> &'static str {
        "Page should have skip link"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let link_sel = Selector::parse(r##"a[href^="#"]"##).expect("valid selector");

        // Only the first in-page anchor is considered
        let has_skip_link = document.select(&link_sel).next().is_some_and(|el| {
            let text = el.text().collect::<String>().to_lowercase();
            text.contains("skip") || text.contains("main")
        });

        if has_skip_link {
            return Vec::new();
        }

        vec![Finding::new(
            self.rule_id(),
            Severity::Moderate,
            self.description(),
            Occurrence::new("<body>", "body")
                .with_failure_summary("Fix this: Page does not have a skip link"),
        )
        .with_help("Pages should have a skip link as the first focusable element")
        .with_help_url("https://dequeuniversity.com/rules/axe/4.8/skip-link")
        .with_wcag_tags(&["wcag2a", "wcag241"])]
    }
}

/// Suppressed focus outline heuristic
pub struct FocusIndicatorHeuristic;

impl Check for FocusIndicatorHeuristic {
    fn rule_id(&self) -> &'static str {
        "focus-indicator-missing"
    }

    fn description(&self) -> &'static str {
        "Interactive elements must have visible focus indicators"
    }

    fn run(&self, _document: &Html, source: &str) -> Vec<Finding> {
        let outline_re = Regex::new(r"outline: ?none").expect("valid regex");
        if !outline_re.is_match(source) {
            return Vec::new();
        }

        vec![Finding::new(
            self.rule_id(),
            Severity::Serious,
            self.description(),
            Occurrence::new("button, a { outline: none; }", "button, a")
                .with_failure_summary("Fix this: Elements have focus indicators removed"),
        )
        .with_help("Remove outline: none or provide alternative focus indicators")
        .with_help_url("https://dequeuniversity.com/rules/axe/4.8/focus-order-semantics")
        .with_wcag_tags(&["wcag2aa", "wcag247"])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip(html: &str) -> Vec<Finding> {
        SkipLinkCheck.run(&Html::parse_document(html), html)
    }

    fn focus(html: &str) -> Vec<Finding> {
        FocusIndicatorHeuristic.run(&Html::parse_document(html), html)
    }

    #[test]
    fn test_skip_link_present() {
        assert!(skip(r##"<a href="#content">Skip navigation</a><nav></nav>"##).is_empty());
        assert!(skip(r##"<a href="#main">Jump to main</a>"##).is_empty());
    }

    #[test]
    fn test_no_anchor_triggers() {
        let findings = skip("<html><body><p>Hello</p></body></html>");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Moderate);
        assert_eq!(findings[0].occurrences[0].markup_snippet, "<body>");
    }

    #[test]
    fn test_only_first_in_page_anchor_counts() {
        let html = r##"<a href="#top">Top</a><a href="#main">Skip to main</a>"##;
        assert_eq!(skip(html).len(), 1);
    }

    #[test]
    fn test_external_skip_text_not_enough() {
        assert_eq!(skip(r#"<a href="/main">Skip to main</a>"#).len(), 1);
    }

    #[test]
    fn test_outline_none_single_finding() {
        let html = r#"
            <style>
                button { outline: none; }
                a:focus { outline:none; }
                input { outline: none }
            </style>
        "#;
        let findings = focus(html);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "focus-indicator-missing");
        assert_eq!(findings[0].severity, Severity::Serious);
    }

    #[test]
    fn test_visible_outline_ok() {
        assert!(focus("<style>a:focus { outline: 2px solid blue; }</style>").is_empty());
    }
}
