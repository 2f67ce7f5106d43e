//! CSV loader for labelled statements.
//!
//! The first row is a header naming the id, statement and label columns
//! (`Id`, `Statement`, `Status` by default, matched case-insensitively):
//! ```csv
//! Id,Statement,Status
//! 1,"I feel anxious and overwhelmed.",Anxiety
//! 2,"Nothing interests me lately.",Depression
//! ```
//!
//! Quoted statements may contain commas and newlines. Malformed rows (wrong
//! column count, non-integer id, empty label) are skipped and logged; the load
//! only fails when no valid row remains.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};

use crate::data::DataConfig;
use crate::data::record::Record;
use crate::error::{MentalisError, Result};

/// Records read from a file plus the number of rows that were rejected.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    pub skipped_rows: usize,
}

/// Reads [`Record`]s from delimited text.
pub struct CsvRecordLoader {
    /// CSV delimiter character (default: ',')
    delimiter: u8,
    id_column: String,
    statement_column: String,
    label_column: String,
}

impl std::fmt::Debug for CsvRecordLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRecordLoader")
            .field("delimiter", &(self.delimiter as char))
            .field("id_column", &self.id_column)
            .field("statement_column", &self.statement_column)
            .field("label_column", &self.label_column)
            .finish()
    }
}

impl Default for CsvRecordLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordLoader {
    /// Create a loader for the `Id,Statement,Status` layout.
    pub fn new() -> Self {
        Self::from_config(&DataConfig::default())
    }

    /// Create a loader from the data section of a training configuration.
    pub fn from_config(config: &DataConfig) -> Self {
        CsvRecordLoader {
            delimiter: config.delimiter as u8,
            id_column: config.id_column.clone(),
            statement_column: config.statement_column.clone(),
            label_column: config.label_column.clone(),
        }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter as u8;
        self
    }

    /// Load records from a file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedRecords> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            MentalisError::data(format!("Failed to open {}: {}", path.display(), e))
        })?;
        self.load_from_reader(file)
    }

    /// Load records from any reader producing UTF-8 CSV.
    pub fn load_from_reader<R: Read>(&self, input: R) -> Result<LoadedRecords> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| MentalisError::data(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let id_idx = self.column_index(&headers, &self.id_column)?;
        let statement_idx = self.column_index(&headers, &self.statement_column)?;
        let label_idx = self.column_index(&headers, &self.label_column)?;

        let mut records = Vec::new();
        let mut skipped_rows = 0;

        for (row, result) in reader.records().enumerate() {
            // Header is line 1.
            let line = row + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping row {line}: {e}");
                    skipped_rows += 1;
                    continue;
                }
            };

            match self.parse_record(&record, headers.len(), id_idx, statement_idx, label_idx) {
                Ok(parsed) => records.push(parsed),
                Err(e) => {
                    warn!("Skipping row {line}: {e}");
                    skipped_rows += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(MentalisError::data(format!(
                "No valid rows in input ({skipped_rows} malformed rows skipped)"
            )));
        }

        debug!(
            "Loaded {} records, skipped {} malformed rows",
            records.len(),
            skipped_rows
        );

        Ok(LoadedRecords {
            records,
            skipped_rows,
        })
    }

    fn column_index(&self, headers: &StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                MentalisError::data(format!(
                    "CSV header is missing the '{name}' column (found: {})",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        expected_len: usize,
        id_idx: usize,
        statement_idx: usize,
        label_idx: usize,
    ) -> Result<Record> {
        if record.len() != expected_len {
            return Err(MentalisError::data(format!(
                "field count mismatch: expected {} fields, found {}",
                expected_len,
                record.len()
            )));
        }

        let raw_id = record.get(id_idx).unwrap_or_default().trim();
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| MentalisError::data(format!("id '{raw_id}' is not an integer")))?;

        let label = record.get(label_idx).unwrap_or_default().trim();
        if label.is_empty() {
            return Err(MentalisError::data(format!("record {id} has an empty label")));
        }

        let statement = record.get(statement_idx).unwrap_or_default();

        Ok(Record::new(id, statement, label))
    }
}
