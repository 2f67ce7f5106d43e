//! # Mentalis
//!
//! Training pipeline for a mental-health statement classifier.
//!
//! ## Features
//!
//! - CSV ingestion with skip-and-log handling of malformed rows
//! - Statement cleaning and a TF-IDF n-gram featurizer
//! - Five linear trainer families swept over an L2 grid
//! - K-fold cross-validated model selection by macro accuracy
//! - Test-set evaluation (accuracy, log-loss, top-K)
//! - Checksummed binary model artifacts and a hot-swappable model handle

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod ml;

pub mod prelude {
    pub use crate::config::TrainingConfig;
    pub use crate::data::{CleanedRecord, Record, TextCleaner};
    pub use crate::error::{MentalisError, Result};
    pub use crate::ml::{
        ModelHandle, ModelPersistence, Prediction, TrainedModel, TrainingPipeline,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
