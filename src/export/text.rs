// SPDX-License-Identifier: PMPL-1.0-or-later
//! Plain-text report

use crate::aggregate::summarize;
use crate::finding::AnalysisResult;

/// Snippets listed per finding
pub(crate) const MAX_SNIPPETS: usize = 3;
/// Characters kept from each snippet
pub(crate) const SNIPPET_CHARS: usize = 100;

/// Cut a snippet to [`SNIPPET_CHARS`] characters, marking the cut with `...`
pub(crate) fn truncate_snippet(snippet: &str) -> String {
    if snippet.chars().count() > SNIPPET_CHARS {
        let head: String = snippet.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        snippet.to_string()
    }
}

/// Render an analysis as a plain-text report
pub fn to_plain_text(result: &AnalysisResult) -> String {
    let counts = summarize(result.findings());
    let mut out = String::new();

    out.push_str("ACCESSIBILITY ANALYSIS REPORT\n");
    out.push_str(&format!(
        "Generated: {}\n",
        result.timestamp_utc().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(50)));

    out.push_str("SUMMARY\n");
    out.push_str(&format!("Total Issues: {}\n", counts.total()));
    out.push_str(&format!("Critical: {}\n", counts.critical));
    out.push_str(&format!("Serious: {}\n", counts.serious));
    out.push_str(&format!("Moderate: {}\n", counts.moderate));
    out.push_str(&format!("Minor: {}\n\n", counts.minor));

    if result.is_empty() {
        out.push_str("No accessibility issues found! Your HTML code passes all WCAG 2.1 AA checks.\n");
        return out;
    }

    out.push_str("DETAILED ISSUES\n");
    out.push_str(&format!("{}\n\n", "=".repeat(20)));

    for (idx, finding) in result.findings().iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, finding.description));
        out.push_str(&format!("   Severity: {}\n", finding.severity));
        out.push_str(&format!("   Rule: {}\n", finding.rule_id));
        out.push_str(&format!("   Help: {}\n", finding.help_text));
        if let Some(url) = &finding.help_url {
            out.push_str(&format!("   More info: {}\n", url));
        }

        let total = finding.occurrence_count();
        out.push_str(&format!("   Affected elements ({}):\n", total));
        for (n, occurrence) in finding.occurrences.iter().take(MAX_SNIPPETS).enumerate() {
            out.push_str(&format!(
                "     {}. {}\n",
                n + 1,
                truncate_snippet(&occurrence.markup_snippet)
            ));
        }
        if total > MAX_SNIPPETS {
            out.push_str(&format!("     ... and {} more\n", total - MAX_SNIPPETS));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::finding::{Finding, Occurrence, Severity};

    #[test]
    fn test_clean_report() {
        let result = aggregate(Vec::new(), Vec::new(), "<p>ok</p>");
        let text = to_plain_text(&result);
        assert!(text.starts_with("ACCESSIBILITY ANALYSIS REPORT\n"));
        assert!(text.contains("Total Issues: 0"));
        assert!(text.contains("No accessibility issues found!"));
        assert!(!text.contains("DETAILED ISSUES"));
    }

    #[test]
    fn test_snippets_are_limited() {
        let mut finding = Finding::new(
            "image-alt-missing",
            Severity::Critical,
            "Images must have alternate text",
            Occurrence::new(format!("<img src=\"{}.jpg\">", "a".repeat(120)), "img:nth-child(1)"),
        )
        .with_help("Add an alt attribute")
        .with_help_url("https://dequeuniversity.com/rules/axe/4.8/image-alt");
        for i in 2..=5 {
            finding
                .occurrences
                .push(Occurrence::new("<img>", format!("img:nth-child({})", i)));
        }

        let text = to_plain_text(&aggregate(Vec::new(), vec![finding], ""));
        assert!(text.contains("Total Issues: 5"));
        assert!(text.contains("Critical: 5"));
        assert!(text.contains("1. Images must have alternate text"));
        assert!(text.contains("   Severity: critical"));
        assert!(text.contains("   Rule: image-alt-missing"));
        assert!(text.contains("   More info: https://dequeuniversity.com/rules/axe/4.8/image-alt"));
        assert!(text.contains("   Affected elements (5):"));
        assert!(text.contains("     ... and 2 more"));
        assert!(!text.contains("     4. "));

        let first = text
            .lines()
            .find(|l| l.starts_with("     1. "))
            .unwrap();
        assert!(first.ends_with("..."));
        assert_eq!(first.trim_start_matches("     1. ").chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let snippet = "é".repeat(150);
        let cut = truncate_snippet(&snippet);
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
        assert_eq!(truncate_snippet("<p>"), "<p>");
    }
}
