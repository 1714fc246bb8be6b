// SPDX-License-Identifier: PMPL-1.0-or-later
//! Export of analysis results.
//!
//! Supports multiple output formats:
//! - Text: plain-text report with a summary and the first snippets per issue
//! - CSV: one row per offending element
//! - JSON: the analysis result as stored
//! - PDF: paginated report (requires the `pdf` feature)

mod csv;
pub mod pdf;
mod text;

pub use csv::to_csv;
pub use pdf::to_pdf;
pub use text::to_plain_text;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::Result;
use crate::finding::AnalysisResult;

/// Output format for exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text
    Text,
    /// Comma-separated issues
    Csv,
    /// Pretty-printed JSON
    Json,
    /// Paginated PDF
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Download file name for an export made on `date`
    pub fn file_name(&self, date: DateTime<Utc>) -> String {
        let stem = match self {
            ExportFormat::Csv => "accessibility-issues",
            _ => "accessibility-report",
        };
        format!("{}-{}.{}", stem, date.format("%Y-%m-%d"), self.extension())
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// File name for a whole-store bundle exported on `date`
pub fn bundle_file_name(date: DateTime<Utc>) -> String {
    format!("accessibility-reports-{}.json", date.format("%Y-%m-%d"))
}

/// A rendered export ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Format actually produced; differs from the request after a PDF fallback
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            file_name: format.file_name(Utc::now()),
            bytes,
        }
    }
}

/// Pretty JSON dump of an analysis
pub fn to_json(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Render `result` in `format`
///
/// A PDF that cannot be produced is replaced by the plain-text report.
pub fn export(result: &AnalysisResult, format: ExportFormat) -> Result<Artifact> {
    let artifact = match format {
        ExportFormat::Text => Artifact::new(format, to_plain_text(result).into_bytes()),
        ExportFormat::Csv => Artifact::new(format, to_csv(result.findings()).into_bytes()),
        ExportFormat::Json => Artifact::new(format, to_json(result)?.into_bytes()),
        ExportFormat::Pdf => match to_pdf(result) {
            Ok(bytes) => Artifact::new(format, bytes),
            Err(e) => {
                warn!("PDF generation failed, falling back to text report: {}", e);
                Artifact::new(ExportFormat::Text, to_plain_text(result).into_bytes())
            }
        },
    };
    Ok(artifact)
}
