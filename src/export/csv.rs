// SPDX-License-Identifier: PMPL-1.0-or-later
//! CSV export, one row per occurrence

use crate::finding::Finding;

const HEADER: &str = "Rule,Description,Severity,WCAG Tags,Element,Help";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render findings as CSV
pub fn to_csv(findings: &[Finding]) -> String {
    let mut rows = vec![HEADER.to_string()];

    for finding in findings {
        let tags = finding.wcag_tags_joined();
        for occurrence in &finding.occurrences {
            let row = [
                quote(&finding.rule_id),
                quote(&finding.description),
                quote(finding.severity.as_str()),
                quote(&tags),
                quote(&occurrence.markup_snippet),
                quote(&finding.help_text),
            ];
            rows.push(row.join(","));
        }
    }

    rows.join("\n")
}
