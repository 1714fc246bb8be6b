// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form label check - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Text, email and password inputs, textareas and selects need a
//! `label[for]`, `aria-label` or `aria-labelledby`. Elements without an
//! `id` are skipped: wrapping labels are not resolved, so an id-less
//! control cannot be checked reliably.

use crate::checks::{outer_html, Check};
use crate::finding::{Finding, Occurrence, Severity};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Check for form controls without a programmatic label
pub struct LabelCheck;

const LABELLED_CONTROLS: &str =
    r#"input[type="text"], input[type="email"], input[type="password"], textarea, select"#;

impl Check for LabelCheck {
    fn rule_id(&self) -> &'static str {
        "label-missing"
    }

    fn description(&self) -> &'static str {
        "Form elements must have labels"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let control_sel = Selector::parse(LABELLED_CONTROLS).expect("valid selector");
        let label_sel = Selector::parse("label[for]").expect("valid selector");

        let label_fors: HashSet<&str> = document
            .select(&label_sel)
            .filter_map(|l| l.value().attr("for"))
            .collect();

        let mut findings = Vec::new();

        for control in document.select(&control_sel) {
            let id = match control.value().attr("id") {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };

            let labelled = label_fors.contains(id)
                || control.value().attr("aria-label").is_some()
                || control.value().attr("aria-labelledby").is_some();

            if labelled {
                continue;
            }

            findings.push(
                Finding::new(
                    self.rule_id(),
                    Severity::Critical,
                    self.description(),
                    Occurrence::new(outer_html(control), format!("#{}", id))
                        .with_failure_summary("Fix this: Form element does not have an associated label"),
                )
                .with_help("Every form element should have a programmatically associated label")
                .with_help_url("https://dequeuniversity.com/rules/axe/4.8/label")
                .with_wcag_tags(&["wcag2a", "wcag131"]),
            );
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(html: &str) -> Vec<Finding> {
        LabelCheck.run(&Html::parse_document(html), html)
    }

    #[test]
    fn test_labelled_input() {
        let html = r#"
            <form>
                <label for="name">Name:</label>
                <input type="text" id="name">
            </form>
        "#;
        assert!(check(html).is_empty());
    }

    #[test]
    fn test_unlabelled_controls() {
        let html = r#"
            <form>
                <input type="email" id="email">
                <textarea id="bio"></textarea>
                <select id="country"><option>NZ</option></select>
            </form>
        "#;
        let findings = check(html);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].occurrences[0].target_selector, "#email");
        assert!(findings.iter().all(|f| f.severity == Severity::Critical));
    }

    #[test]
    fn test_aria_attributes_count_as_labels() {
        let html = r#"
            <input type="text" id="q" aria-label="Search">
            <span id="pw-label">Password</span>
            <input type="password" id="pw" aria-labelledby="pw-label">
        "#;
        assert!(check(html).is_empty());
    }

    #[test]
    fn test_controls_without_id_are_skipped() {
        let html = r#"<input type="text"><textarea></textarea>"#;
        assert!(check(html).is_empty());
    }

    #[test]
    fn test_other_input_types_ignored() {
        let html = r#"<input type="checkbox" id="agree"><input type="hidden" id="token">"#;
        assert!(check(html).is_empty());
    }
}
