//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows from a tokenizer through the token
//! filters of an analyzer. The featurizer only consumes the token text, but
//! positions and offsets are kept so analyzer output can be inspected and
//! tested against the source statement.
//!
//! # Examples
//!
//! ```
//! use mentalis::analysis::token::Token;
//!
//! let token = Token::with_offsets("anxious", 2, 7, 14);
//! assert_eq!(token.text, "anxious");
//! assert_eq!(token.position, 2);
//! assert!(!token.is_stopped());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token represents a single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the original token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the analyzed text
    pub start_offset: usize,

    /// The byte offset where this token ends in the analyzed text
    pub end_offset: usize,

    /// Whether this token has been marked as stopped (removed) by a filter
    pub stopped: bool,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
            stopped: false,
        }
    }

    /// Create a new token with explicit byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
            stopped: false,
        }
    }

    /// Mark this token as stopped.
    pub fn stop(mut self) -> Self {
        self.stopped = true;
        self
    }

    /// Check if this token has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Return a copy of this token with different text, keeping positions.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        Token {
            text: text.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.text, self.position)
    }
}

/// A stream of tokens produced by a tokenizer or filter.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello", 3);
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 3);
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.end_offset, 5);
        assert!(!token.is_stopped());
    }

    #[test]
    fn test_with_text_keeps_offsets() {
        let token = Token::with_offsets("Hello", 1, 6, 11).stop();
        let lowered = token.with_text("hello");

        assert_eq!(lowered.text, "hello");
        assert_eq!(lowered.start_offset, 6);
        assert_eq!(lowered.end_offset, 11);
        assert!(lowered.is_stopped());
        assert_eq!(lowered.to_string(), "hello@1");
    }
}
