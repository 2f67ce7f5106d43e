//! Picks the best trainer candidate by cross-validated macro accuracy.

use log::{info, warn};
use rayon::prelude::*;

use crate::data::record::CleanedRecord;
use crate::error::{MentalisError, Result};
use crate::ml::catalog::TrainerCandidate;
use crate::ml::cross_validation::{CVResult, CrossValidator};
use crate::ml::model::TrainedModel;

/// Outcome of a candidate sweep.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The winning candidate.
    pub best: TrainerCandidate,
    /// Cross-validation results of every candidate that trained, in
    /// enumeration order.
    pub results: Vec<CVResult>,
    /// Index of the winner in `results`.
    pub best_index: usize,
    /// The winner refit on the whole training split.
    pub model: TrainedModel,
}

/// Sweeps candidates through a [`CrossValidator`].
#[derive(Debug, Clone)]
pub struct ModelSelector {
    validator: CrossValidator,
}

impl ModelSelector {
    pub fn new(validator: CrossValidator) -> Self {
        ModelSelector { validator }
    }

    /// Cross-validate every candidate, pick the winner and refit it on `train`.
    pub fn select(&self, candidates: &[TrainerCandidate], train: &[CleanedRecord]) -> Result<Selection> {
        let parallel = self.validator.config().parallel;
        let (best_index, results) = select_with(candidates, parallel, |candidate| {
            self.validator.evaluate(candidate, train)
        })?;

        let best_name = &results[best_index].candidate_name;
        let best = candidates
            .iter()
            .find(|c| &c.name == best_name)
            .cloned()
            .ok_or_else(|| MentalisError::other(format!("unknown candidate '{best_name}'")))?;

        info!(
            "Selected {} (macro accuracy {:.4}); refitting on {} rows",
            best.name,
            results[best_index].aggregate().macro_accuracy,
            train.len()
        );
        let model = TrainedModel::fit(
            &best,
            self.validator.featurizer(),
            self.validator.options(),
            train,
        )?;

        Ok(Selection {
            best,
            results,
            best_index,
            model,
        })
    }
}

/// Evaluate `candidates` with `evaluate` and return the index of the best
/// result together with all results.
///
/// Candidates that fail are logged and left out. The best result has the
/// highest mean macro accuracy; a later candidate replaces the current best
/// only when it is strictly greater, so ties go to the first one.
pub fn select_with<F>(
    candidates: &[TrainerCandidate],
    parallel: bool,
    evaluate: F,
) -> Result<(usize, Vec<CVResult>)>
where
    F: Fn(&TrainerCandidate) -> Result<CVResult> + Sync + Send,
{
    if candidates.is_empty() {
        return Err(MentalisError::training("no trainer candidates to select from"));
    }

    let outcomes: Vec<Result<CVResult>> = if parallel {
        candidates.par_iter().map(&evaluate).collect()
    } else {
        candidates.iter().map(&evaluate).collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for (candidate, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            Ok(result) => {
                let aggregate = result.aggregate();
                info!(
                    "{}: micro={:.4} macro={:.4} log-loss={:.4}",
                    candidate.name,
                    aggregate.micro_accuracy,
                    aggregate.macro_accuracy,
                    aggregate.log_loss
                );
                results.push(result);
            }
            Err(e) => warn!("Candidate {} failed: {}", candidate.name, e),
        }
    }

    let best_index = results
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, result)| {
            let score = result.aggregate().macro_accuracy;
            match best {
                Some((_, best_score)) if score <= best_score => best,
                _ => Some((i, score)),
            }
        })
        .map(|(i, _)| i)
        .ok_or_else(|| MentalisError::training("every trainer candidate failed"))?;

    Ok((best_index, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::metrics::FoldMetrics;
    use crate::ml::trainer::TrainerFamily;

    fn mock(name: &str, macro_accuracy: f64) -> (TrainerCandidate, CVResult) {
        let mut candidate = TrainerCandidate::new(TrainerFamily::SdcaMaximumEntropy, None);
        candidate.name = name.to_string();
        let result = CVResult {
            candidate_name: name.to_string(),
            per_fold: vec![
                FoldMetrics {
                    micro_accuracy: 0.9,
                    macro_accuracy,
                    log_loss: 0.5,
                };
                5
            ],
        };
        (candidate, result)
    }

    fn run(mocks: &[(TrainerCandidate, CVResult)], parallel: bool) -> String {
        let candidates: Vec<TrainerCandidate> = mocks.iter().map(|(c, _)| c.clone()).collect();
        let (best, results) = select_with(&candidates, parallel, |candidate| {
            mocks
                .iter()
                .find(|(c, _)| c.name == candidate.name)
                .map(|(_, r)| r.clone())
                .ok_or_else(|| MentalisError::other("missing mock"))
        })
        .unwrap();
        results[best].candidate_name.clone()
    }

    #[test]
    fn test_highest_macro_accuracy_wins_in_any_order() {
        let low = mock("low", 0.60);
        let high = mock("high", 0.71);
        assert_eq!(run(&[low.clone(), high.clone()], false), "high");
        assert_eq!(run(&[high.clone(), low.clone()], false), "high");
        assert_eq!(run(&[low, high], true), "high");
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let a = mock("a", 0.5);
        let b = mock("b", 0.5);
        assert_eq!(run(&[a.clone(), b.clone()], true), "a");
        assert_eq!(run(&[b, a], false), "b");
    }

    #[test]
    fn test_failed_candidates_are_skipped() {
        let (good, good_result) = mock("good", 0.4);
        let (bad, _) = mock("bad", 0.9);
        let candidates = vec![bad, good];
        let (best, results) = select_with(&candidates, false, |candidate| {
            if candidate.name == "bad" {
                Err(MentalisError::training("diverged"))
            } else {
                Ok(good_result.clone())
            }
        })
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[best].candidate_name, "good");
    }

    #[test]
    fn test_all_failed_is_an_error() {
        let (candidate, _) = mock("bad", 0.9);
        let result = select_with(&[candidate], false, |_| {
            Err(MentalisError::training("diverged"))
        });
        assert!(result.is_err());
        assert!(select_with(&[], false, |_| Err(MentalisError::other("unused"))).is_err());
    }
}
