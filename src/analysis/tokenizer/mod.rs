//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step after char filtering: they split the
//! normalized statement into word tokens.
//!
//! # Examples
//!
//! ```
//! use mentalis::analysis::tokenizer::Tokenizer;
//! use mentalis::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("cannot sleep at night").unwrap().collect();
//! assert_eq!(tokens.len(), 4);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod unicode_word;

pub use unicode_word::UnicodeWordTokenizer;
