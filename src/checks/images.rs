// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text check - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Every `<img>` must carry an `alt` attribute. An empty `alt=""` marks a
//! decorative image and is accepted.

use crate::checks::{outer_html, Check};
use crate::finding::{Finding, Occurrence, Severity};
use scraper::{Html, Selector};

/// Check for images without alt attributes
pub struct ImageAltCheck;

impl Check for ImageAltCheck {
    fn rule_id(&self) -> &'static str {
        "image-alt-missing"
    }

    fn description(&self) -> &'static str {
        "Images must have alternate text"
    }

    fn run(&self, document: &Html, _source: &str) -> Vec<Finding> {
        let img_selector = Selector::parse("img").expect("valid selector");

        document
            .select(&img_selector)
            .enumerate()
            .filter(|(_, img)| img.value().attr("alt").is_none())
            .map(|(idx, img)| {
                Finding::new(
                    self.rule_id(),
                    Severity::Critical,
                    self.description(),
                    Occurrence::new(outer_html(img), format!("img:nth-child({})", idx + 1))
                        .with_failure_summary("Fix this: Element does not have an alt attribute"),
                )
                .with_help("All img elements must have an alt attribute")
                .with_help_url("https://dequeuniversity.com/rules/axe/4.8/image-alt")
                .with_wcag_tags(&["wcag2a", "wcag111"])
            })
            .collect()
    }
}
