// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link checks - WCAG 2.5.5 Target Size (Level AAA), 2.4.4 Link Purpose (Level A)
//!
//! The target size check is a heuristic: it only recognises inline styles
//! containing `width:16px` or `height:16px` and never measures layout.

use crate::checks::{outer_html, Check};
use crate::finding::{Finding, Occurrence, Severity};
use scraper::{Html, Selector};

/// Link texts that say nothing about the destination
const NON_DESCRIPTIVE_TEXT: &[&str] = &["click here", "read more", "here"];

/// Undersized touch target heuristic
pub struct SmallTargetHeuristic;

impl Check for SmallTargetHeuristic {
    fn rule_id(&self) -> &'static str {
        "target-size-small"
    }

    fn description(&self) -> &'static str {
        "Touch targets must be at least 44x44 pixels"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let small_sel = Selector::parse(r#"a[style*="width:16px"], a[style*="height:16px"]"#)
            .expect("valid selector");

        document
            .select(&small_sel)
            .enumerate()
            .map(|(idx, link)| {
                Finding::new(
                    self.rule_id(),
                    Severity::Minor,
                    self.description(),
                    Occurrence::new(outer_html(link), format!("a:nth-child({})", idx + 1))
                        .with_failure_summary("Fix this: Touch target is too small (16x16px)"),
                )
                .with_help("Increase the size of touch targets to at least 44x44 pixels")
                .with_help_url("https://dequeuniversity.com/rules/axe/4.8/target-size")
                .with_wcag_tags(&["wcag21aa", "wcag255"])
            })
            .collect()
    }
}

/// Check for generic link text
pub struct LinkTextCheck;

impl Check for LinkTextCheck {
    fn rule_id(&self) -> &'static str {
        "link-name-descriptive"
    }

    fn description(&self) -> &'static str {
        "Links must have descriptive text"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let link_sel = Selector::parse("a").expect("valid selector");
        let mut findings = Vec::new();

        // Selector index counts every anchor, not just the offending ones
        for (idx, link) in document.select(&link_sel).enumerate() {
            let text = link.text().collect::<String>().trim().to_lowercase();
            if !NON_DESCRIPTIVE_TEXT.contains(&text.as_str()) {
                continue;
            }

            findings.push(
                Finding::new(
                    self.rule_id(),
                    Severity::Moderate,
                    self.description(),
                    Occurrence::new(outer_html(link), format!("a:nth-child({})", idx + 1))
                        .with_failure_summary("Fix this: Link text is not descriptive"),
                )
                .with_help("Link text should describe the destination or purpose")
                .with_help_url("https://dequeuniversity.com/rules/axe/4.8/link-name")
                .with_wcag_tags(&["wcag2a", "wcag244"]),
            );
        }

        findings
    }
}
