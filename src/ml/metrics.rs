//! Multiclass classification metrics.
//!
//! | Metric | Definition |
//! |---|---|
//! | micro accuracy | correct predictions / all predictions |
//! | macro accuracy | mean recall over the classes present in the truth |
//! | log-loss | mean `-ln p(true class)`, `p` clamped at 1e-15 |
//! | log-loss reduction | `(prior - log-loss) / prior`, prior = entropy of the truth labels |
//! | top-K accuracy | true class among the K highest scores |
//!
//! Metrics are computed from the true label string and the score vector, so
//! a truth label the model never saw simply counts as wrong with probability 0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{MentalisError, Result};

/// Floor applied to the true-class probability before taking its log.
pub const PROBABILITY_FLOOR: f64 = 1e-15;

/// A scored example: true label plus class probabilities in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredExample {
    pub truth: String,
    pub scores: Vec<f64>,
}

/// The three numbers reported per cross-validation fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub micro_accuracy: f64,
    pub macro_accuracy: f64,
    pub log_loss: f64,
}

impl FoldMetrics {
    /// Arithmetic mean of each metric.
    pub fn mean(folds: &[FoldMetrics]) -> FoldMetrics {
        if folds.is_empty() {
            return FoldMetrics::default();
        }
        let n = folds.len() as f64;
        FoldMetrics {
            micro_accuracy: folds.iter().map(|f| f.micro_accuracy).sum::<f64>() / n,
            macro_accuracy: folds.iter().map(|f| f.macro_accuracy).sum::<f64>() / n,
            log_loss: folds.iter().map(|f| f.log_loss).sum::<f64>() / n,
        }
    }
}

/// Recall bookkeeping for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    /// Examples whose true label is this class.
    pub support: usize,
    pub correct: usize,
    pub recall: f64,
}

/// Counts of (true label, predicted label) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Row and column labels. Model labels come first, then truth labels the
    /// model does not know.
    pub labels: Vec<String>,
    /// `counts[truth][predicted]`
    pub counts: Vec<Vec<usize>>,
}

/// Full evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub micro_accuracy: f64,
    pub macro_accuracy: f64,
    pub log_loss: f64,
    pub log_loss_reduction: f64,
    pub top_k_accuracy: f64,
    pub top_k: usize,
    pub count: usize,
    pub per_class: Vec<ClassMetrics>,
    pub confusion: ConfusionMatrix,
}

impl Metrics {
    /// Score `examples` against a model whose classes are `labels`.
    pub fn compute(labels: &[String], examples: &[ScoredExample], top_k: usize) -> Result<Metrics> {
        if examples.is_empty() {
            return Err(MentalisError::data("cannot compute metrics on an empty set"));
        }

        let mut all_labels: Vec<String> = labels.to_vec();
        let mut index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        for example in examples {
            if !index.contains_key(example.truth.as_str()) {
                index.insert(example.truth.as_str(), all_labels.len());
                all_labels.push(example.truth.clone());
            }
        }

        let width = all_labels.len();
        let mut counts = vec![vec![0usize; width]; width];
        let mut support = vec![0usize; width];
        let mut correct_per_class = vec![0usize; width];
        let mut correct = 0usize;
        let mut in_top_k = 0usize;
        let mut log_loss = 0.0;

        for example in examples {
            if example.scores.len() != labels.len() {
                return Err(MentalisError::data(format!(
                    "score vector has {} entries for {} classes",
                    example.scores.len(),
                    labels.len()
                )));
            }

            let truth = index[example.truth.as_str()];
            let predicted = argmax(&example.scores).unwrap_or(0);
            support[truth] += 1;
            counts[truth][predicted] += 1;
            if predicted == truth {
                correct += 1;
                correct_per_class[truth] += 1;
            }

            let p_true = if truth < labels.len() {
                example.scores[truth]
            } else {
                0.0
            };
            log_loss -= p_true.max(PROBABILITY_FLOOR).ln();

            if truth < labels.len() {
                let rank = example.scores.iter().filter(|&&s| s > p_true).count();
                if rank < top_k {
                    in_top_k += 1;
                }
            }
        }

        let n = examples.len() as f64;
        log_loss /= n;

        let prior_log_loss: f64 = support
            .iter()
            .filter(|&&s| s > 0)
            .map(|&s| {
                let p = s as f64 / n;
                -p * p.ln()
            })
            .sum();
        let log_loss_reduction = if prior_log_loss > 1e-12 {
            (prior_log_loss - log_loss) / prior_log_loss
        } else {
            0.0
        };

        let per_class: Vec<ClassMetrics> = all_labels
            .iter()
            .enumerate()
            .filter(|(i, _)| support[*i] > 0)
            .map(|(i, label)| ClassMetrics {
                label: label.clone(),
                support: support[i],
                correct: correct_per_class[i],
                recall: correct_per_class[i] as f64 / support[i] as f64,
            })
            .collect();
        let macro_accuracy =
            per_class.iter().map(|c| c.recall).sum::<f64>() / per_class.len() as f64;

        Ok(Metrics {
            micro_accuracy: correct as f64 / n,
            macro_accuracy,
            log_loss,
            log_loss_reduction,
            top_k_accuracy: in_top_k as f64 / n,
            top_k,
            count: examples.len(),
            per_class,
            confusion: ConfusionMatrix {
                labels: all_labels,
                counts,
            },
        })
    }

    pub fn fold(&self) -> FoldMetrics {
        FoldMetrics {
            micro_accuracy: self.micro_accuracy,
            macro_accuracy: self.macro_accuracy,
            log_loss: self.log_loss,
        }
    }
}

/// Index of the highest score; the first one wins ties.
pub fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
