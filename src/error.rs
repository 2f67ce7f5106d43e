//! Error types for the Mentalis library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`MentalisError`] enum. The variants mirror the failure classes of the
//! training pipeline and of the serving surface:
//!
//! - [`MentalisError::Data`] for malformed input rows or unusable datasets
//! - [`MentalisError::EmptyInput`] when cleaning leaves nothing to train on
//! - [`MentalisError::ModelLoad`] for missing, truncated or incompatible artifacts
//! - [`MentalisError::PredictionInput`] for empty statements at inference time
//!
//! # Examples
//!
//! ```
//! use mentalis::error::{MentalisError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(MentalisError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Mentalis operations.
#[derive(Error, Debug)]
pub enum MentalisError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV reader errors that are not attributable to a single row
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed input data (bad rows, zero usable rows, empty fit set)
    #[error("Data error: {0}")]
    Data(String),

    /// No records left to train on after cleaning
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Persisted model is missing, truncated or incompatible
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Statement rejected at prediction time
    #[error("Prediction input error: {0}")]
    PredictionInput(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Trainer failures (diverging solver, inconsistent feature widths)
    #[error("Training error: {0}")]
    Training(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with MentalisError.
pub type Result<T> = std::result::Result<T, MentalisError>;

impl MentalisError {
    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        MentalisError::Data(msg.into())
    }

    /// Create a new empty input error.
    pub fn empty_input<S: Into<String>>(msg: S) -> Self {
        MentalisError::EmptyInput(msg.into())
    }

    /// Create a new model load error.
    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        MentalisError::ModelLoad(msg.into())
    }

    /// Create a new prediction input error.
    pub fn prediction_input<S: Into<String>>(msg: S) -> Self {
        MentalisError::PredictionInput(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        MentalisError::Analysis(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        MentalisError::Training(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        MentalisError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MentalisError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        MentalisError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        MentalisError::Other(format!("Invalid argument: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = MentalisError::data("row 3 has 2 columns");
        assert_eq!(error.to_string(), "Data error: row 3 has 2 columns");

        let error = MentalisError::model_load("bad magic");
        assert_eq!(error.to_string(), "Model load error: bad magic");

        let error = MentalisError::invalid_config("folds must be >= 2");
        assert_eq!(
            error.to_string(),
            "Error: Invalid configuration: folds must be >= 2"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let mentalis_error = MentalisError::from(io_error);

        match mentalis_error {
            MentalisError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
