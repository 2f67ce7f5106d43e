//! Scores a fitted model on labelled records.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::record::CleanedRecord;
use crate::error::Result;
use crate::ml::metrics::{Metrics, ScoredExample};

/// Anything that maps a statement to class probabilities.
pub trait Scorer: Send + Sync {
    /// Class names, in the order of the score vector.
    fn labels(&self) -> &[String];

    /// Class probabilities for `statement`.
    fn score_text(&self, statement: &str) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// K of the top-K accuracy.
    pub top_k: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig { top_k: 3 }
    }
}

/// Read-only evaluation of a model against a test set.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Evaluator { config }
    }

    pub fn evaluate<S: Scorer + ?Sized>(&self, model: &S, records: &[CleanedRecord]) -> Result<Metrics> {
        let examples = records
            .par_iter()
            .map(|record| {
                Ok(ScoredExample {
                    truth: record.label.clone(),
                    scores: model.score_text(&record.statement)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let metrics = Metrics::compute(model.labels(), &examples, self.config.top_k)?;
        debug!(
            "Evaluated {} records: micro={:.4} macro={:.4} log-loss={:.4}",
            metrics.count, metrics.micro_accuracy, metrics.macro_accuracy, metrics.log_loss
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the class whose name appears in the statement.
    struct KeywordScorer {
        labels: Vec<String>,
    }

    impl Scorer for KeywordScorer {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn score_text(&self, statement: &str) -> Result<Vec<f64>> {
            Ok(self
                .labels
                .iter()
                .map(|l| {
                    if statement.contains(&l.to_lowercase()) {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect())
        }
    }

    fn record(statement: &str, label: &str) -> CleanedRecord {
        CleanedRecord {
            id: 0,
            statement: statement.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_perfect_scorer() {
        let scorer = KeywordScorer {
            labels: vec!["Anxiety".to_string(), "Stress".to_string()],
        };
        let records = vec![
            record("so much anxiety", "Anxiety"),
            record("stress at work", "Stress"),
            record("anxiety again", "Anxiety"),
        ];
        let metrics = Evaluator::default().evaluate(&scorer, &records).unwrap();
        assert_eq!(metrics.micro_accuracy, 1.0);
        assert_eq!(metrics.macro_accuracy, 1.0);
        assert!(metrics.log_loss < 1e-9);
        assert_eq!(metrics.top_k, 3);
    }

    #[test]
    fn test_empty_set_fails() {
        let scorer = KeywordScorer {
            labels: vec!["Anxiety".to_string()],
        };
        assert!(Evaluator::default().evaluate(&scorer, &[]).is_err());
    }
}
