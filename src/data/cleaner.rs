//! Statement cleaning applied before any split or fit.
//!
//! Steps, in order:
//! 1. lowercase
//! 2. remove bracketed spans `[...]`
//! 3. remove URLs (`http(s)://...`, `www....`)
//! 4. remove HTML-tag-like spans `<...>`
//! 5. remove punctuation and symbol characters
//! 6. remove every token that contains a digit
//! 7. replace newlines with spaces
//!
//! Runs of whitespace left behind by the removals are collapsed and the
//! result is trimmed.

use std::sync::Arc;

use log::debug;

use crate::analysis::char_filter::{CharFilter, LowercaseCharFilter, PatternReplaceCharFilter};
use crate::data::record::{CleanedRecord, Record};
use crate::error::Result;

const BRACKETED_PATTERN: &str = r"\[.*?\]";
const URL_PATTERN: &str = r"https?://\S+|www\.\S+";
const HTML_TAG_PATTERN: &str = r"<.*?>";
const PUNCTUATION_PATTERN: &str = r"[\p{P}\p{S}]";
const DIGIT_TOKEN_PATTERN: &str = r"\w*\d\w*";
const NEWLINE_PATTERN: &str = r"\r\n|\r|\n";
const WHITESPACE_RUN_PATTERN: &str = r"\s+";

/// Normalizes raw statements and drops rows with nothing left to learn from.
#[derive(Clone)]
pub struct TextCleaner {
    char_filters: Vec<Arc<dyn CharFilter>>,
}

impl std::fmt::Debug for TextCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCleaner")
            .field(
                "char_filters",
                &self
                    .char_filters
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TextCleaner {
    /// Build the cleaner with its fixed chain of char filters.
    pub fn new() -> Result<Self> {
        let char_filters: Vec<Arc<dyn CharFilter>> = vec![
            Arc::new(LowercaseCharFilter::new()),
            Arc::new(PatternReplaceCharFilter::remove(BRACKETED_PATTERN)?),
            Arc::new(PatternReplaceCharFilter::remove(URL_PATTERN)?),
            Arc::new(PatternReplaceCharFilter::remove(HTML_TAG_PATTERN)?),
            Arc::new(PatternReplaceCharFilter::remove(PUNCTUATION_PATTERN)?),
            Arc::new(PatternReplaceCharFilter::remove(DIGIT_TOKEN_PATTERN)?),
            Arc::new(PatternReplaceCharFilter::new(NEWLINE_PATTERN, " ")?),
            Arc::new(PatternReplaceCharFilter::new(WHITESPACE_RUN_PATTERN, " ")?),
        ];

        Ok(TextCleaner { char_filters })
    }

    /// Normalize a single statement.
    pub fn clean_text(&self, text: &str) -> String {
        self.char_filters
            .iter()
            .fold(text.to_string(), |acc, char_filter| char_filter.filter(&acc))
            .trim()
            .to_string()
    }

    /// Clean one record.
    ///
    /// Returns `None` when the raw statement is empty or whitespace-only, or
    /// when nothing survives normalization. The label is copied unchanged.
    pub fn clean(&self, raw: &Record) -> Option<CleanedRecord> {
        if raw.statement.trim().is_empty() {
            return None;
        }

        let statement = self.clean_text(&raw.statement);
        if statement.is_empty() {
            return None;
        }

        Some(CleanedRecord {
            id: raw.id,
            statement,
            label: raw.label.clone(),
        })
    }

    /// Clean a batch, keeping the input order of the surviving records.
    pub fn clean_all(&self, records: &[Record]) -> Vec<CleanedRecord> {
        let cleaned: Vec<CleanedRecord> = records.iter().filter_map(|r| self.clean(r)).collect();
        debug!(
            "Cleaning kept {} of {} records",
            cleaned.len(),
            records.len()
        );
        cleaned
    }
}
