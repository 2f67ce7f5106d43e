//! Analyzer implementations that combine tokenizers and filters.

#[allow(clippy::module_inception)]
mod analyzer;
mod pipeline;

pub use analyzer::Analyzer;
pub use pipeline::PipelineAnalyzer;
