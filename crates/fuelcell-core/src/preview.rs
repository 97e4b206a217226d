//! Short display excerpt of a narrative report.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PREVIEW_CHARS: usize = 300;
pub const ELLIPSIS: &str = "...";

const PREVIEW_SPLIT_MARKER: &str = "###";
const SUMMARY_LABEL: &str = "Summary";

/// Where a preview was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSource {
    SummarySection,
    RawText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub text: String,
    pub source: PreviewSource,
}

/// Excerpts the summary of a raw narrative, falling back to its opening text.
#[derive(Debug, Clone, Copy)]
pub struct PreviewExtractor {
    max_chars: usize,
}

impl Default for PreviewExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CHARS)
    }
}

impl PreviewExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Lengths are counted in `char`s.
    pub fn extract(&self, raw: &str) -> Preview {
        let summary = raw
            .split(PREVIEW_SPLIT_MARKER)
            .find(|block| block.trim().starts_with(SUMMARY_LABEL));

        match summary {
            Some(block) => {
                let text = block.replacen(SUMMARY_LABEL, "", 1);
                let text = text.trim();
                let mut preview = truncate_chars(text, self.max_chars);
                if text.chars().count() > self.max_chars {
                    preview.push_str(ELLIPSIS);
                }
                Preview {
                    text: preview,
                    source: PreviewSource::SummarySection,
                }
            }
            None => {
                let mut preview = truncate_chars(raw, self.max_chars);
                preview.push_str(ELLIPSIS);
                Preview {
                    text: preview,
                    source: PreviewSource::RawText,
                }
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => text[..offset].to_string(),
        None => text.to_string(),
    }
}
