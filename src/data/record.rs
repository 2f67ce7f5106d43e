//! Labelled statement records.

use serde::{Deserialize, Serialize};

/// A raw row of the input file.
///
/// `id` is informational only and never used as a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Row identifier from the `Id` column.
    pub id: i64,
    /// Free-text statement.
    pub statement: String,
    /// Class name from the `Status` column.
    pub label: String,
}

impl Record {
    /// Create a new record.
    pub fn new<S: Into<String>, L: Into<String>>(id: i64, statement: S, label: L) -> Self {
        Record {
            id,
            statement: statement.into(),
            label: label.into(),
        }
    }
}

/// A record whose statement went through the [`TextCleaner`](super::cleaner::TextCleaner).
///
/// The statement is never empty or whitespace-only, and the label is the
/// untouched label of the source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub id: i64,
    pub statement: String,
    pub label: String,
}
