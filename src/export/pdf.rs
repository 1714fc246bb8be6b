// SPDX-License-Identifier: PMPL-1.0-or-later
//! PDF report.
//!
//! Rendering happens in two steps. [`layout_report`] places every piece of
//! text on A4 pages measured in millimetres from the top-left corner, and
//! [`render`] turns those pages into a PDF document with `lopdf`. Only the
//! second step depends on the `pdf` feature.

use crate::aggregate::summarize;
use crate::error::{Error, Result};
use crate::export::text::{truncate_snippet, MAX_SNIPPETS};
use crate::finding::{AnalysisResult, Finding, SeverityCounts};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const LINE_HEIGHT: f32 = 7.0;

/// Millimetres per typographic point
const MM_PER_PT: f32 = 25.4 / 72.0;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

const BLACK: (u8, u8, u8) = (0, 0, 0);
const COMPLIANT_GREEN: (u8, u8, u8) = (0, 128, 0);
const NON_COMPLIANT_RED: (u8, u8, u8) = (255, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// One drawing instruction on a page
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: (u8, u8, u8),
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

/// A laid-out page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<LayoutOp>,
}

impl Page {
    /// Text drawn on this page, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            LayoutOp::Text { text, .. } => Some(text.as_str()),
            LayoutOp::Rule { .. } => None,
        })
    }
}

/// Split `text` into lines no wider than `max_width` millimetres at `size` points
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let glyph = size * MM_PER_PT * AVG_GLYPH_WIDTH;
    let max_chars = ((max_width / glyph).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        // Hard-break words that can never fit on one line
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cursor-based page builder
struct LayoutBuilder {
    pages: Vec<Page>,
    y: f32,
    size: f32,
    weight: FontWeight,
    color: (u8, u8, u8),
}

impl LayoutBuilder {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
            size: 12.0,
            weight: FontWeight::Normal,
            color: BLACK,
        }
    }

    fn font(&mut self, size: f32, weight: FontWeight) {
        self.size = size;
        self.weight = weight;
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    fn check_page_space(&mut self, required: f32) {
        if self.y + required > PAGE_HEIGHT - MARGIN {
            self.new_page();
        }
    }

    fn text_at(&mut self, text: &str, x: f32, y: f32) {
        let op = LayoutOp::Text {
            x,
            y,
            size: self.size,
            weight: self.weight,
            color: self.color,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// One unwrapped line at the cursor
    fn line(&mut self, text: &str, x: f32) {
        self.check_page_space(LINE_HEIGHT);
        self.text_at(text, x, self.y);
        self.y += LINE_HEIGHT;
    }

    fn wrapped(&mut self, text: &str, x: f32) {
        let max_width = PAGE_WIDTH - MARGIN - x;
        for line in wrap_text(text, max_width, self.size) {
            self.line(&line, x);
        }
    }

    fn section_header(&mut self, title: &str) {
        self.check_page_space(20.0);
        self.font(16.0, FontWeight::Bold);
        self.text_at(title, MARGIN, self.y);
        self.y += LINE_HEIGHT + 5.0;

        let rule = LayoutOp::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y: self.y - 2.0,
        };
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(rule);
        }
        self.y += 5.0;
    }

    fn subheader(&mut self, title: &str) {
        self.check_page_space(15.0);
        self.font(12.0, FontWeight::Bold);
        self.text_at(title, MARGIN, self.y);
        self.y += LINE_HEIGHT + 3.0;
    }

    fn paragraph(&mut self, text: &str) {
        self.font(10.0, FontWeight::Normal);
        self.wrapped(text, MARGIN);
        self.y += 5.0;
    }

    fn bullet(&mut self, text: &str) {
        self.check_page_space(10.0);
        self.font(10.0, FontWeight::Normal);
        self.text_at("\u{2022}", MARGIN, self.y);
        self.wrapped(text, MARGIN + 5.0);
        self.y += 2.0;
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

fn cover_page(b: &mut LayoutBuilder, result: &AnalysisResult, counts: &SeverityCounts) {
    b.font(24.0, FontWeight::Bold);
    b.text_at("Accessibility Analysis Report", MARGIN, 50.0);

    b.font(16.0, FontWeight::Normal);
    b.text_at("WCAG 2.1 AA Compliance Assessment", MARGIN, 65.0);

    b.font(12.0, FontWeight::Normal);
    let date = result.timestamp_utc().format("%Y-%m-%d");
    b.text_at(&format!("Generated on: {}", date), MARGIN, 80.0);

    b.font(14.0, FontWeight::Bold);
    b.text_at("Summary", MARGIN, 100.0);

    b.font(12.0, FontWeight::Normal);
    let lines = [
        format!("Total Issues Found: {}", counts.total()),
        format!("Critical Issues: {}", counts.critical),
        format!("Serious Issues: {}", counts.serious),
        format!("Moderate Issues: {}", counts.moderate),
        format!("Minor Issues: {}", counts.minor),
    ];
    for (i, line) in lines.iter().enumerate() {
        b.text_at(line, MARGIN, 115.0 + 10.0 * i as f32);
    }

    let (status, color) = if counts.is_clean() {
        ("COMPLIANT", COMPLIANT_GREEN)
    } else {
        ("NON-COMPLIANT", NON_COMPLIANT_RED)
    };
    b.font(16.0, FontWeight::Bold);
    b.color = color;
    b.text_at(&format!("WCAG 2.1 AA Status: {}", status), MARGIN, 175.0);
    b.color = BLACK;

    b.font(10.0, FontWeight::Normal);
    b.text_at("Generated by AccessScan - HTML Accessibility Scanner", MARGIN, 280.0);
}

fn executive_summary(b: &mut LayoutBuilder, counts: &SeverityCounts) {
    b.section_header("Executive Summary");

    if counts.is_clean() {
        b.paragraph("Congratulations! Your HTML code passes all WCAG 2.1 AA accessibility checks. No accessibility issues were found during the analysis.");
    } else {
        b.paragraph(&format!(
            "This accessibility analysis identified {} accessibility issues in your HTML code that need attention to achieve WCAG 2.1 AA compliance.",
            counts.total()
        ));

        b.check_page_space(30.0);
        b.subheader("Issue Breakdown:");
        if counts.critical > 0 {
            b.bullet(&format!("Critical Issues ({}): These issues severely impact accessibility and must be fixed immediately.", counts.critical));
        }
        if counts.serious > 0 {
            b.bullet(&format!("Serious Issues ({}): These issues significantly impact accessibility and should be prioritized.", counts.serious));
        }
        if counts.moderate > 0 {
            b.bullet(&format!("Moderate Issues ({}): These issues may cause accessibility barriers and should be addressed.", counts.moderate));
        }
        if counts.minor > 0 {
            b.bullet(&format!("Minor Issues ({}): These issues have minimal impact but should be fixed for best practices.", counts.minor));
        }
    }

    b.check_page_space(20.0);
    b.subheader("Recommendations:");
    if counts.is_clean() {
        b.bullet("Continue following accessibility best practices in future development.");
        b.bullet("Consider regular accessibility testing as part of your development workflow.");
    } else {
        b.bullet("Address critical and serious issues first to maximize accessibility impact.");
        b.bullet("Test with assistive technologies after implementing fixes.");
        b.bullet("Consider implementing automated accessibility testing in your development process.");
    }
}

fn finding_block(b: &mut LayoutBuilder, index: usize, finding: &Finding) {
    b.check_page_space(50.0);

    b.font(14.0, FontWeight::Bold);
    b.wrapped(&format!("{}. {}", index + 1, finding.description), MARGIN);
    b.y += 2.0;

    b.font(10.0, FontWeight::Normal);
    b.color = finding.severity.color();
    b.line(&format!("Severity: {}", finding.severity.as_str().to_uppercase()), MARGIN);
    b.color = BLACK;

    if !finding.wcag_tags.is_empty() {
        b.line(&format!("WCAG Guidelines: {}", finding.wcag_tags_joined()), MARGIN);
    }

    b.y += 3.0;
    b.wrapped(&format!("Description: {}", finding.help_text), MARGIN);

    b.y += 3.0;
    b.font(10.0, FontWeight::Bold);
    b.line(&format!("Affected Elements ({}):", finding.occurrence_count()), MARGIN);

    for (n, occurrence) in finding.occurrences.iter().take(MAX_SNIPPETS).enumerate() {
        b.check_page_space(15.0);
        b.font(9.0, FontWeight::Normal);
        b.wrapped(
            &format!("{}. {}", n + 1, truncate_snippet(&occurrence.markup_snippet)),
            MARGIN + 5.0,
        );
        b.y += 2.0;
    }
    if finding.occurrence_count() > MAX_SNIPPETS {
        b.line(
            &format!("... and {} more elements", finding.occurrence_count() - MAX_SNIPPETS),
            MARGIN + 5.0,
        );
    }

    if let Some(url) = &finding.help_url {
        b.y += 3.0;
        b.font(10.0, FontWeight::Bold);
        b.line("How to Fix:", MARGIN);
        b.font(10.0, FontWeight::Normal);
        b.wrapped(&format!("For detailed fix instructions, visit: {}", url), MARGIN);
    }

    b.y += 10.0;
}

fn recommendations(b: &mut LayoutBuilder, counts: &SeverityCounts) {
    b.check_page_space(60.0);
    b.section_header("Recommendations & Next Steps");

    if counts.is_clean() {
        b.subheader("Maintenance Recommendations:");
        b.bullet("Implement automated accessibility testing in your CI/CD pipeline");
        b.bullet("Conduct regular manual testing with screen readers");
        b.bullet("Stay updated with WCAG guidelines and best practices");
        b.bullet("Consider user testing with people who have disabilities");
    } else {
        b.subheader("Priority Actions:");
        if counts.critical > 0 {
            b.bullet("IMMEDIATE: Fix all critical accessibility issues");
        }
        if counts.serious > 0 {
            b.bullet("HIGH PRIORITY: Address serious accessibility barriers");
        }
        if counts.moderate > 0 || counts.minor > 0 {
            b.bullet("MEDIUM PRIORITY: Resolve remaining moderate and minor issues");
        }

        b.check_page_space(30.0);
        b.subheader("Testing Recommendations:");
        b.bullet("Test with keyboard navigation only");
        b.bullet("Verify with screen reader software (NVDA, JAWS, VoiceOver)");
        b.bullet("Check color contrast ratios");
        b.bullet("Validate with automated tools after fixes");
    }

    b.check_page_space(30.0);
    b.subheader("Resources:");
    b.bullet("WCAG 2.1 Guidelines: https://www.w3.org/WAI/WCAG21/quickref/");
    b.bullet("WebAIM Resources: https://webaim.org/");
    b.bullet("A11y Project: https://www.a11yproject.com/");
}

/// Lay out the full report
pub fn layout_report(result: &AnalysisResult) -> Vec<Page> {
    let counts = summarize(result.findings());
    let mut b = LayoutBuilder::new();

    cover_page(&mut b, result, &counts);
    b.new_page();
    executive_summary(&mut b, &counts);

    if !result.is_empty() {
        b.check_page_space(40.0);
        b.section_header("Detailed Issue Analysis");
        for (index, finding) in result.findings().iter().enumerate() {
            finding_block(&mut b, index, finding);
        }
    }

    recommendations(&mut b, &counts);
    b.finish()
}

/// Render an analysis to PDF bytes
pub fn to_pdf(result: &AnalysisResult) -> Result<Vec<u8>> {
    render(&layout_report(result))
}

#[cfg(not(feature = "pdf"))]
pub fn render(_pages: &[Page]) -> Result<Vec<u8>> {
    Err(Error::ExportRender(
        "PDF support is not enabled in this build".to_string(),
    ))
}

#[cfg(feature = "pdf")]
pub use writer::render;

#[cfg(feature = "pdf")]
mod writer {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn pdf_err(err: lopdf::Error) -> Error {
        Error::ExportRender(err.to_string())
    }

    fn pt(mm: f32) -> f32 {
        mm / MM_PER_PT
    }

    fn rgb(color: (u8, u8, u8)) -> Vec<Object> {
        [color.0, color.1, color.2]
            .iter()
            .map(|c| Object::Real(*c as f32 / 255.0))
            .collect()
    }

    /// Encode text for a WinAnsi-encoded base font
    fn win_ansi(text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| match c {
                '\u{2022}' => 0x95,
                c if (c as u32) < 0x80 => c as u8,
                c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
                _ => b'?',
            })
            .collect()
    }

    fn page_operations(page: &Page) -> Vec<Operation> {
        let mut ops = Vec::new();
        for op in &page.ops {
            match op {
                LayoutOp::Text {
                    x,
                    y,
                    size,
                    weight,
                    color,
                    text,
                } => {
                    let font = match weight {
                        FontWeight::Normal => "F1",
                        FontWeight::Bold => "F2",
                    };
                    ops.push(Operation::new("rg", rgb(*color)));
                    ops.push(Operation::new("BT", vec![]));
                    ops.push(Operation::new("Tf", vec![font.into(), Object::Real(*size)]));
                    ops.push(Operation::new(
                        "Td",
                        vec![Object::Real(pt(*x)), Object::Real(pt(PAGE_HEIGHT - *y))],
                    ));
                    ops.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(win_ansi(text))],
                    ));
                    ops.push(Operation::new("ET", vec![]));
                }
                LayoutOp::Rule { x1, x2, y } => {
                    let y = pt(PAGE_HEIGHT - *y);
                    ops.push(Operation::new("w", vec![Object::Real(0.5)]));
                    ops.push(Operation::new("m", vec![Object::Real(pt(*x1)), Object::Real(y)]));
                    ops.push(Operation::new("l", vec![Object::Real(pt(*x2)), Object::Real(y)]));
                    ops.push(Operation::new("S", vec![]));
                }
            }
        }
        ops
    }

    /// Write laid-out pages as a PDF document
    pub fn render(pages: &[Page]) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => regular_id, "F2" => bold_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            let content = Content {
                operations: page_operations(page),
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().map_err(pdf_err)?,
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(pt(PAGE_WIDTH)),
                    Object::Real(pt(PAGE_HEIGHT)),
                ],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| Error::ExportRender(e.to_string()))?;
        tracing::debug!(pages = pages.len(), bytes = bytes.len(), "Rendered PDF");
        Ok(bytes)
    }

}
