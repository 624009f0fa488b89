use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::LazyLock;

/// Lazy match between 《 and 》. The first 》 always closes, so `《A《B》C》` yields `A《B`
/// and nothing else.
const TITLE_PATTERN: &str = r"《(.+?)》";

// CRLF mode: `.` matches neither `\r` nor `\n`.
static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(TITLE_PATTERN)
        .crlf(true)
        .build()
        .expect("title pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedEntry {
    pub content: String,
    pub source_file_name: String,
}

impl ExtractedEntry {
    pub fn new<C: Into<String>, S: Into<String>>(content: C, source_file_name: S) -> Self {
        Self {
            content: content.into(),
            source_file_name: source_file_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TitleExtractor;

impl TitleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Titles in `text`, left to right, exactly as written between the delimiters.
    pub fn titles<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        TITLE_REGEX
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn extract<'t>(
        &self,
        text: &'t str,
        source_file_name: &'t str,
    ) -> impl Iterator<Item = ExtractedEntry> + 't {
        self.titles(text)
            .map(move |title| ExtractedEntry::new(title, source_file_name))
    }
}
