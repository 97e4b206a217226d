//! Segmentation of free-text narrative reports into addressable sections.
//!
//! Reports are expected to use `##`/`###` headings named Summary, Key Findings,
//! Performance Analysis, Recommendations and Additional Notes, but nothing here
//! relies on that: lookups that find nothing yield [`SectionView::Unavailable`]
//! and every raw block stays reachable through [`SegmentedReport::blocks`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placeholder shown for a section the report does not contain.
pub const SECTION_UNAVAILABLE: &str = "Section unavailable in this report.";

static CITATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9]+\]").expect("citation marker pattern"));

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern"));

static HEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\n|\A)\s*#{2,3}\s+").expect("heading marker pattern"));

/// The sections a report is asked to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Summary,
    KeyFindings,
    PerformanceAnalysis,
    Recommendations,
    AdditionalNotes,
}

impl ReportSection {
    pub const ALL: [ReportSection; 5] = [
        ReportSection::Summary,
        ReportSection::KeyFindings,
        ReportSection::PerformanceAnalysis,
        ReportSection::Recommendations,
        ReportSection::AdditionalNotes,
    ];

    /// Heading prefix used for lookup.
    pub fn keyword(&self) -> &'static str {
        match self {
            ReportSection::Summary => "Summary",
            ReportSection::KeyFindings => "Key Findings",
            ReportSection::PerformanceAnalysis => "Performance Analysis",
            ReportSection::Recommendations => "Recommendations",
            // Matches "Additional Notes", "Additional Insights", ...
            ReportSection::AdditionalNotes => "Additional",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportSection::AdditionalNotes => "Additional Notes",
            other => other.keyword(),
        }
    }
}

/// One heading-delimited fragment of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBlock {
    /// First line of the fragment, trimmed
    pub heading: String,
    /// The whole fragment, heading line included
    pub text: String,
}

impl ReportBlock {
    fn new(text: &str) -> Self {
        let text = text.trim_end().to_string();
        let heading = text.lines().next().unwrap_or_default().trim().to_string();
        Self { heading, text }
    }

    /// Lowercased heading, used as the block's key.
    pub fn key(&self) -> String {
        self.heading.to_lowercase()
    }

    /// Whether the trimmed block starts with `keyword`, ignoring case.
    pub fn matches(&self, keyword: &str) -> bool {
        !keyword.is_empty() && strip_prefix_ignore_case(self.text.trim(), keyword).is_some()
    }

    /// Block text with a leading occurrence of `keyword` removed, ready for rendering.
    pub fn body_without(&self, keyword: &str) -> String {
        strip_keyword(&self.text, keyword)
    }
}

/// Result of looking a section up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionView {
    Available {
        keyword: String,
        heading: String,
        body: String,
    },
    Unavailable {
        keyword: String,
    },
}

impl SectionView {
    pub fn is_available(&self) -> bool {
        matches!(self, SectionView::Available { .. })
    }

    pub fn keyword(&self) -> &str {
        match self {
            SectionView::Available { keyword, .. } | SectionView::Unavailable { keyword } => {
                keyword
            }
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            SectionView::Available { body, .. } => Some(body),
            SectionView::Unavailable { .. } => None,
        }
    }

    /// Body for display, or the unavailable placeholder.
    pub fn display_text(&self) -> &str {
        self.body().unwrap_or(SECTION_UNAVAILABLE)
    }
}

/// A cleaned report split into ordered blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedReport {
    cleaned: String,
    blocks: Vec<ReportBlock>,
}

impl SegmentedReport {
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn blocks(&self) -> &[ReportBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First block whose heading starts with `keyword`, ignoring case.
    pub fn find(&self, keyword: &str) -> Option<&ReportBlock> {
        self.blocks.iter().find(|block| block.matches(keyword))
    }

    pub fn section(&self, keyword: &str) -> SectionView {
        match self.find(keyword) {
            Some(block) => SectionView::Available {
                keyword: keyword.to_string(),
                heading: block.heading.clone(),
                body: block.body_without(keyword),
            },
            None => {
                debug!(keyword, blocks = self.blocks.len(), "Report section not found");
                SectionView::Unavailable {
                    keyword: keyword.to_string(),
                }
            }
        }
    }

    /// Lookup of every standard section, in display order.
    pub fn standard_sections(&self) -> Vec<(ReportSection, SectionView)> {
        ReportSection::ALL
            .iter()
            .map(|section| (*section, self.section(section.keyword())))
            .collect()
    }
}

/// Stateless splitter for narrative reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSegmenter;

impl ReportSegmenter {
    pub fn new() -> Self {
        Self
    }

    pub fn segment(&self, raw: &str) -> SegmentedReport {
        let cleaned = clean_report(raw);
        let blocks = split_blocks(&cleaned);
        debug!(blocks = blocks.len(), "Segmented narrative report");
        SegmentedReport { cleaned, blocks }
    }
}

/// Remove `[n]` citation markers, collapse blank-line runs to one newline and trim.
///
/// Only the marker itself is removed, so `"Result[0] improved[12]"` becomes
/// `"Result improved"` and `"a [1] b"` keeps both spaces.
pub fn clean_report(raw: &str) -> String {
    let without_citations = CITATION_MARKER.replace_all(raw, "");
    let collapsed = BLANK_LINE_RUN.replace_all(&without_citations, "\n");
    collapsed.trim().to_string()
}

/// Split at `##`/`###` heading markers, dropping blank fragments.
pub fn split_blocks(cleaned: &str) -> Vec<ReportBlock> {
    HEADING_MARKER
        .split(cleaned)
        .filter(|fragment| !fragment.trim().is_empty())
        .map(ReportBlock::new)
        .collect()
}

/// Drop a leading, case-insensitive `keyword` and the whitespace after it.
pub fn strip_keyword(text: &str, keyword: &str) -> String {
    let text = text.trim_start();
    if keyword.is_empty() {
        return text.to_string();
    }
    match strip_prefix_ignore_case(text, keyword) {
        Some(rest) => rest.trim_start().to_string(),
        None => text.to_string(),
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[offset..])
}
