//! Deterministic train/test partitioning.
//!
//! The split is a simple seeded random partition. It is not stratified, so a
//! rare class can end up entirely on one side.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::data::record::CleanedRecord;
use crate::error::{MentalisError, Result};

/// Cleaned records split into a training part and a held-out test part.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train: Vec<CleanedRecord>,
    pub test: Vec<CleanedRecord>,
}

impl Dataset {
    /// Split `records` so that `test_fraction` of them (rounded) are held out.
    ///
    /// At least one record always stays in the training part. Both parts keep
    /// the relative input order of their records.
    pub fn split(records: Vec<CleanedRecord>, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(MentalisError::invalid_argument(format!(
                "test fraction must be in [0, 1), got {test_fraction}"
            )));
        }

        let n = records.len();
        let test_count = ((n as f64) * test_fraction).round() as usize;
        let test_count = test_count.min(n.saturating_sub(1));

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let mut is_test = vec![false; n];
        for &idx in &indices[..test_count] {
            is_test[idx] = true;
        }

        let (test, train): (Vec<_>, Vec<_>) = records
            .into_iter()
            .enumerate()
            .partition(|(idx, _)| is_test[*idx]);

        Ok(Dataset {
            train: train.into_iter().map(|(_, r)| r).collect(),
            test: test.into_iter().map(|(_, r)| r).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<CleanedRecord> {
        (0..n)
            .map(|i| CleanedRecord {
                id: i as i64,
                statement: format!("statement {i}"),
                label: if i % 2 == 0 { "A" } else { "B" }.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let dataset = Dataset::split(records(50), 0.2, 42).unwrap();
        assert_eq!(dataset.train.len(), 40);
        assert_eq!(dataset.test.len(), 10);
        assert_eq!(dataset.len(), 50);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let first = Dataset::split(records(30), 0.2, 7).unwrap();
        let second = Dataset::split(records(30), 0.2, 7).unwrap();

        assert_eq!(first.test, second.test);
        assert_eq!(first.train, second.train);

        for record in &first.test {
            assert!(!first.train.iter().any(|r| r.id == record.id));
        }
    }

    #[test]
    fn test_split_preserves_relative_order() {
        let dataset = Dataset::split(records(20), 0.25, 3).unwrap();
        let ids: Vec<_> = dataset.train.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_single_record_stays_in_train() {
        let dataset = Dataset::split(records(1), 0.9, 1).unwrap();
        assert_eq!(dataset.train.len(), 1);
        assert!(dataset.test.is_empty());
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(Dataset::split(records(5), 1.0, 1).is_err());
        assert!(Dataset::split(records(5), -0.1, 1).is_err());
    }
}
