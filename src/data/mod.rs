//! Data ingestion: CSV loading, statement cleaning and the train/test split.

pub mod cleaner;
pub mod loader;
pub mod record;
pub mod split;

use serde::{Deserialize, Serialize};

pub use cleaner::TextCleaner;
pub use loader::{CsvRecordLoader, LoadedRecords};
pub use record::{CleanedRecord, Record};
pub use split::Dataset;

/// Configuration for reading and splitting the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Fraction of cleaned records held out for the final evaluation.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    /// Header name of the id column.
    pub id_column: String,
    /// Header name of the free-text column.
    pub statement_column: String,
    /// Header name of the label column.
    pub label_column: String,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            id_column: "Id".to_string(),
            statement_column: "Statement".to_string(),
            label_column: "Status".to_string(),
            delimiter: ',',
        }
    }
}
