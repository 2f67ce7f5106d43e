//! Char filter implementations for text normalization.
//!
//! Char filters rewrite the raw statement before it reaches a tokenizer.
//! They back both layers of text normalization in this crate: the
//! dataset-level [`TextCleaner`](crate::data::cleaner::TextCleaner) and the
//! punctuation pass at the head of the featurizer's analyzer.
//!
//! # Available Filters
//!
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement
//! - [`LowercaseCharFilter`] - Unicode lowercasing of the whole text

pub mod pattern_replace;

pub use pattern_replace::PatternReplaceCharFilter;

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text and return the rewritten text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

/// A char filter that lowercases the whole input.
#[derive(Clone, Debug, Default)]
pub struct LowercaseCharFilter;

impl LowercaseCharFilter {
    /// Create a new lowercase char filter.
    pub fn new() -> Self {
        LowercaseCharFilter
    }
}

impl CharFilter for LowercaseCharFilter {
    fn filter(&self, input: &str) -> String {
        input.to_lowercase()
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_char_filter() {
        let filter = LowercaseCharFilter::new();
        assert_eq!(filter.filter("I Feel ANXIOUS"), "i feel anxious");
        assert_eq!(filter.name(), "lowercase");
    }
}
