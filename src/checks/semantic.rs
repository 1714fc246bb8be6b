// SPDX-License-Identifier: PMPL-1.0-or-later
//! Semantic button check - WCAG 4.1.2 Name, Role, Value (Level A)
//!
//! A `div` given `role="button"` lacks native keyboard handling; use a
//! real `<button>`.

use crate::checks::{outer_html, Check};
use crate::finding::{Finding, Occurrence, Severity};
use scraper::{Html, Selector};

/// Check for divs posing as buttons
pub struct SemanticButtonCheck;

impl Check for SemanticButtonCheck {
    fn rule_id(&self) -> &'static str {
        "button-semantic"
    }

    fn description(&self) -> &'static str {
        "Buttons should use semantic button elements"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let div_button_sel = Selector::parse(r#"div[role="button"]"#).expect("valid selector");

        document
            .select(&div_button_sel)
            .enumerate()
            .map(|(idx, div)| {
                Finding::new(
                    self.rule_id(),
                    Severity::Serious,
                    self.description(),
                    Occurrence::new(
                        outer_html(div),
                        format!(r#"div[role="button"]:nth-child({})"#, idx + 1),
                    )
                    .with_failure_summary("Fix this: Use semantic <button> element instead of div"),
                )
                .with_help(r#"Use proper button elements instead of div with role="button""#)
                .with_help_url("https://dequeuniversity.com/rules/axe/4.8/button-name")
                .with_wcag_tags(&["wcag2a", "wcag412"])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(html: &str) -> Vec<Finding> {
        SemanticButtonCheck.run(&Html::parse_document(html), html)
    }

    #[test]
    fn test_div_buttons_flagged() {
        let html = r#"
            <div role="button" tabindex="0">Save</div>
            <div role="button">Cancel</div>
            <button>Real</button>
        "#;
        let findings = check(html);
        assert_eq!(findings.len(), 2);
        assert!(findings[1].occurrences[0].markup_snippet.contains("Cancel"));
        assert_eq!(findings[1].occurrences[0].target_selector, r#"div[role="button"]:nth-child(2)"#);
    }

    #[test]
    fn test_span_with_role_ignored() {
        assert!(check(r#"<span role="button">x</span>"#).is_empty());
    }
}
