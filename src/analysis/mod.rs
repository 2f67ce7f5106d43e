//! Text analysis module for Mentalis.
//!
//! Char filters, tokenizers and token filters compose into a
//! [`PipelineAnalyzer`], which the featurizer uses to turn a statement into
//! the token stream its n-grams are built from.

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
