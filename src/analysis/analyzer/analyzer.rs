//! Core analyzer trait definition.
//!
//! Analyzers combine char filters, a tokenizer and token filters into one
//! text processing pipeline:
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Filter 1 → ... → Filter N → Tokens
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync` so a fitted featurizer, and the model
/// that owns it, can be shared across concurrent prediction calls.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &str;
}
