//! Stop filter implementation.
//!
//! Removes common English function words before n-gram extraction. The
//! featurizer enables this filter when `remove_stop_words` is set.
//!
//! # Examples
//!
//! ```
//! use mentalis::analysis::token_filter::Filter;
//! use mentalis::analysis::token_filter::stop::StopFilter;
//! use mentalis::analysis::token::Token;
//!
//! let filter = StopFilter::new();
//! let tokens = vec![
//!     Token::new("the", 0),
//!     Token::new("panic", 1),
//!     Token::new("attacks", 2)
//! ];
//!
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result[0].text, "panic");
//! ```

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Default English stop words list.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Default English stop words as a HashSet.
pub static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<String>> = LazyLock::new(|| {
    DEFAULT_ENGLISH_STOP_WORDS
        .iter()
        .map(|&s| s.to_string())
        .collect()
});

/// A filter that removes stop words from the token stream.
///
/// The filter either drops stop words entirely (the default) or marks them
/// as stopped while keeping them in the stream.
#[derive(Clone, Debug)]
pub struct StopFilter {
    /// The set of stop words to remove
    stop_words: Arc<HashSet<String>>,
    /// Whether to remove stopped tokens entirely or just mark them as stopped
    remove_stopped: bool,
}

impl StopFilter {
    /// Create a new stop filter with the default English stop words.
    pub fn new() -> Self {
        Self::with_stop_words(DEFAULT_ENGLISH_STOP_WORDS_SET.clone())
    }

    /// Create a new stop filter with custom stop words.
    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        StopFilter {
            stop_words: Arc::new(stop_words),
            remove_stopped: true,
        }
    }

    /// Create a new stop filter from a list of stop words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop_words = words.into_iter().map(|s| s.into()).collect();
        Self::with_stop_words(stop_words)
    }

    /// Set whether to remove stopped tokens entirely or just mark them as stopped.
    pub fn remove_stopped(mut self, remove: bool) -> Self {
        self.remove_stopped = remove;
        self
    }

    /// Check if a word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Get the number of stop words.
    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    /// Check if the stop word set is empty.
    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter_map(|token| {
                if token.is_stopped() {
                    Some(token)
                } else if self.is_stop_word(&token.text) {
                    if self.remove_stopped {
                        None
                    } else {
                        Some(token.stop())
                    }
                } else {
                    Some(token)
                }
            })
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}
