//! Unicode word tokenizer implementation.
//!
//! Splits text using Unicode word boundary rules (UAX #29) and drops the
//! segments that carry no alphanumeric character (whitespace, punctuation).

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, word)| word.chars().any(|c| c.is_alphanumeric()))
            .enumerate()
            .map(|(position, (start, word))| {
                Token::with_offsets(word, position, start, start + word.len())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
