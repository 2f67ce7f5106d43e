//! K-fold cross-validation of trainer candidates.
//!
//! Each fold refits the whole pipeline, featurizer included, on the other
//! folds so nothing about the held-out rows leaks into the vocabulary.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::record::CleanedRecord;
use crate::error::{MentalisError, Result};
use crate::ml::catalog::TrainerCandidate;
use crate::ml::evaluator::Evaluator;
use crate::ml::featurizer::Featurizer;
use crate::ml::metrics::FoldMetrics;
use crate::ml::model::TrainedModel;
use crate::ml::trainer::TrainerOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    /// Number of folds.
    pub folds: usize,
    /// Seed for the fold assignment.
    pub seed: u64,
    /// Evaluate candidates and folds on the rayon pool.
    pub parallel: bool,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        CrossValidationConfig {
            folds: 5,
            seed: 42,
            parallel: true,
        }
    }
}

/// Held-out index sets for `k` folds over `n` rows.
///
/// The sets are disjoint, cover `0..n` exactly once and differ in size by at
/// most one. Indices inside each set are sorted.
pub fn fold_partitions(n: usize, k: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(MentalisError::invalid_argument(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    if n < k {
        return Err(MentalisError::data(format!(
            "cannot split {n} training rows into {k} folds"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    Ok((0..k)
        .map(|fold| {
            let mut held_out = indices[fold * n / k..(fold + 1) * n / k].to_vec();
            held_out.sort_unstable();
            held_out
        })
        .collect())
}

/// Per-fold metrics of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResult {
    pub candidate_name: String,
    pub per_fold: Vec<FoldMetrics>,
}

impl CVResult {
    /// Mean of each metric across folds.
    pub fn aggregate(&self) -> FoldMetrics {
        FoldMetrics::mean(&self.per_fold)
    }
}

/// Runs k-fold cross-validation for trainer candidates.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    config: CrossValidationConfig,
    featurizer: Featurizer,
    options: TrainerOptions,
    evaluator: Evaluator,
}

impl CrossValidator {
    pub fn new(
        config: CrossValidationConfig,
        featurizer: Featurizer,
        options: TrainerOptions,
        evaluator: Evaluator,
    ) -> Self {
        CrossValidator {
            config,
            featurizer,
            options,
            evaluator,
        }
    }

    pub fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    pub fn featurizer(&self) -> &Featurizer {
        &self.featurizer
    }

    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    /// Cross-validate `candidate` on `train`.
    pub fn evaluate(&self, candidate: &TrainerCandidate, train: &[CleanedRecord]) -> Result<CVResult> {
        let partitions = fold_partitions(train.len(), self.config.folds, self.config.seed)?;

        let run_fold = |(fold, held_out): (usize, &Vec<usize>)| -> Result<FoldMetrics> {
            let (test, fit): (Vec<_>, Vec<_>) = train
                .iter()
                .enumerate()
                .partition(|(i, _)| held_out.binary_search(i).is_ok());
            let fit: Vec<CleanedRecord> = fit.into_iter().map(|(_, r)| r.clone()).collect();
            let test: Vec<CleanedRecord> = test.into_iter().map(|(_, r)| r.clone()).collect();

            let model = TrainedModel::fit(candidate, &self.featurizer, &self.options, &fit)?;
            let metrics = self.evaluator.evaluate(&model, &test)?.fold();
            debug!(
                "{} fold {}: micro={:.4} macro={:.4} log-loss={:.4}",
                candidate.name, fold, metrics.micro_accuracy, metrics.macro_accuracy, metrics.log_loss
            );
            Ok(metrics)
        };

        let per_fold = if self.config.parallel {
            partitions
                .par_iter()
                .enumerate()
                .map(run_fold)
                .collect::<Result<Vec<_>>>()?
        } else {
            partitions
                .iter()
                .enumerate()
                .map(run_fold)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(CVResult {
            candidate_name: candidate.name.clone(),
            per_fold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::TrainerFamily;

    #[test]
    fn test_partitions_are_disjoint_and_cover() {
        let n = 50;
        let partitions = fold_partitions(n, 5, 42).unwrap();
        assert_eq!(partitions.len(), 5);

        let mut seen = vec![0; n];
        for held_out in &partitions {
            assert_eq!(held_out.len(), n / 5);
            for &i in held_out {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_partitions_uneven_sizes() {
        let partitions = fold_partitions(12, 5, 1).unwrap();
        let sizes: Vec<usize> = partitions.iter().map(Vec::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 12);
        assert!(sizes.iter().all(|&s| s == 2 || s == 3));
    }

    #[test]
    fn test_partitions_are_seeded() {
        assert_eq!(fold_partitions(30, 5, 9).unwrap(), fold_partitions(30, 5, 9).unwrap());
        assert_ne!(fold_partitions(30, 5, 9).unwrap(), fold_partitions(30, 5, 10).unwrap());
    }

    #[test]
    fn test_partitions_reject_bad_sizes() {
        assert!(fold_partitions(10, 1, 0).is_err());
        assert!(fold_partitions(3, 5, 0).is_err());
    }

    fn records() -> Vec<CleanedRecord> {
        let texts = [
            ("anxious panic heart racing", "Anxiety"),
            ("hopeless empty sad", "Depression"),
        ];
        (0..20)
            .map(|i| {
                let (statement, label) = texts[i % 2];
                CleanedRecord {
                    id: i as i64,
                    statement: format!("{statement} day{}", i / 2),
                    label: label.to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_evaluate_parallel_matches_serial() {
        let candidate = TrainerCandidate::new(TrainerFamily::LbfgsMaximumEntropy, Some(1e-3));
        let serial = CrossValidator::new(
            CrossValidationConfig {
                parallel: false,
                ..CrossValidationConfig::default()
            },
            Featurizer::default(),
            TrainerOptions::default(),
            Evaluator::default(),
        );
        let parallel = CrossValidator::new(
            CrossValidationConfig::default(),
            Featurizer::default(),
            TrainerOptions::default(),
            Evaluator::default(),
        );

        let a = serial.evaluate(&candidate, &records()).unwrap();
        let b = parallel.evaluate(&candidate, &records()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.per_fold.len(), 5);
        assert_eq!(a.aggregate().micro_accuracy, 1.0);
    }
}
