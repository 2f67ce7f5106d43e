//! Pipeline analyzer that combines char filters, a tokenizer and filters.
//!
//! The PipelineAnalyzer applies processing in this order:
//! 1. Char Filters: rewrite the raw text
//! 2. Tokenizer: split text into tokens
//! 3. Token Filters: applied sequentially in the order they were added
//!
//! # Examples
//!
//! ```
//! use mentalis::analysis::analyzer::{Analyzer, PipelineAnalyzer};
//! use mentalis::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//! use mentalis::analysis::token_filter::lowercase::LowercaseFilter;
//! use mentalis::analysis::token_filter::stop::StopFilter;
//! use std::sync::Arc;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
//!     .add_filter(Arc::new(LowercaseFilter::new()))
//!     .add_filter(Arc::new(StopFilter::from_words(vec!["the", "and"])))
//!     .with_name("statement");
//!
//! let tokens: Vec<_> = analyzer.analyze("Hello THE world AND test").unwrap().collect();
//!
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[0].text, "hello");
//! assert_eq!(tokens[2].text, "test");
//! ```

use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::char_filter::CharFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A configurable analyzer that combines a tokenizer with a chain of filters.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    char_filters: Vec<Arc<dyn CharFilter>>,
    filters: Vec<Arc<dyn Filter>>,
    name: String,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            name: format!("pipeline_{}", tokenizer.name()),
            tokenizer,
            char_filters: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add a char filter to the pipeline.
    pub fn add_char_filter(mut self, char_filter: Arc<dyn CharFilter>) -> Self {
        self.char_filters.push(char_filter);
        self
    }

    /// Add a filter to the pipeline.
    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set a custom name for this analyzer.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Run only the char filters over `text`.
    pub fn normalize(&self, text: &str) -> String {
        self.char_filters
            .iter()
            .fold(text.to_string(), |acc, char_filter| char_filter.filter(&acc))
    }

    /// Analyze `text` and collect the surviving token texts.
    pub fn token_texts(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .analyze(text)?
            .filter(|token| !token.is_stopped())
            .map(|token| token.text)
            .collect())
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let filtered_text = self.normalize(text);

        let mut tokens = self.tokenizer.tokenize(&filtered_text)?;

        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }

        Ok(tokens)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "char_filters",
                &self
                    .char_filters
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>(),
            )
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
    use crate::analysis::token::Token;
    use crate::analysis::token_filter::lowercase::LowercaseFilter;
    use crate::analysis::token_filter::stop::StopFilter;
    use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;

    #[test]
    fn test_pipeline_analyzer() {
        let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StopFilter::from_words(vec!["the", "and"])));

        let tokens: Vec<Token> = analyzer
            .analyze("Hello THE world AND test")
            .unwrap()
            .collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[2].text, "test");
    }

    #[test]
    fn test_pipeline_with_pattern_replace() {
        let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(r"-", " ").unwrap()));

        let texts = analyzer.token_texts("self-harm thoughts").unwrap();
        assert_eq!(texts, vec!["self", "harm", "thoughts"]);
    }

    #[test]
    fn test_token_texts_skip_marked_stop_words() {
        let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(StopFilter::from_words(vec!["i"]).remove_stopped(false)));

        let texts = analyzer.token_texts("i cannot cope").unwrap();
        assert_eq!(texts, vec!["cannot", "cope"]);
    }

    #[test]
    fn test_custom_name() {
        let analyzer =
            PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new())).with_name("statement");
        assert_eq!(analyzer.name(), "statement");

        let default = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()));
        assert_eq!(default.name(), "pipeline_unicode_word");
    }
}
