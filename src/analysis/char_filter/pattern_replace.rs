use regex::Regex;

use super::CharFilter;
use crate::error::{MentalisError, Result};

/// A char filter that replaces every match of a regex pattern.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| MentalisError::analysis(format!("Invalid regex pattern: {e}")))?,
            replacement: replacement.to_string(),
        })
    }

    /// Create a filter that deletes every match.
    pub fn remove(pattern: &str) -> Result<Self> {
        Self::new(pattern, "")
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        // Replacement is literal text, `$` in it is not a group reference.
        self.pattern
            .replace_all(input, regex::NoExpand(&self.replacement))
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_replace() {
        let filter = PatternReplaceCharFilter::new(r"(\d+)", "NUM").unwrap();
        assert_eq!(filter.filter("Year 2024"), "Year NUM");
    }

    #[test]
    fn test_remove_pattern() {
        let filter = PatternReplaceCharFilter::remove(r"-").unwrap();
        assert_eq!(filter.filter("123-456-789"), "123456789");
    }

    #[test]
    fn test_literal_replacement() {
        let filter = PatternReplaceCharFilter::new(r"\d", "$1").unwrap();
        assert_eq!(filter.filter("a1"), "a$1");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PatternReplaceCharFilter::new(r"(", "").is_err());
    }
}
