//! End-to-end training run.
//!
//! load -> clean -> split -> sweep candidates with cross-validation ->
//! refit the winner -> evaluate on the test split -> save.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::data::{CleanedRecord, CsvRecordLoader, Dataset, Record, TextCleaner};
use crate::error::{MentalisError, Result};
use crate::ml::catalog::TrainerCatalog;
use crate::ml::cross_validation::CrossValidator;
use crate::ml::evaluator::Evaluator;
use crate::ml::featurizer::Featurizer;
use crate::ml::metrics::{FoldMetrics, Metrics};
use crate::ml::model::TrainedModel;
use crate::ml::persistence::{ModelPersistence, ModelSchema};
use crate::ml::selection::ModelSelector;

/// Cross-validated score of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub metrics: FoldMetrics,
}

/// What a training run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub rows_cleaned: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub folds: usize,
    pub candidates: Vec<CandidateSummary>,
    pub best: String,
    /// `None` when the test split is empty.
    pub test_metrics: Option<Metrics>,
    pub model_path: Option<PathBuf>,
}

/// Report plus the refit winning model.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub report: TrainingReport,
    pub model: TrainedModel,
}

/// Runs the whole training job for one configuration.
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(TrainingPipeline { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train from a CSV file and save the winner to the configured path.
    pub fn run<P: AsRef<Path>>(&self, data_path: P) -> Result<TrainingOutcome> {
        let data_path = data_path.as_ref();
        info!("Loading {}", data_path.display());
        let loaded = CsvRecordLoader::from_config(&self.config.data).load(data_path)?;

        let mut outcome = self.train(&loaded.records)?;
        outcome.report.rows_skipped = loaded.skipped_rows;

        let schema = ModelSchema::new(&self.config.data, &outcome.model);
        ModelPersistence::save(&outcome.model, &schema, &self.config.model_path)?;
        outcome.report.model_path = Some(self.config.model_path.clone());

        Ok(outcome)
    }

    /// Train on in-memory records without saving.
    pub fn train(&self, records: &[Record]) -> Result<TrainingOutcome> {
        let cleaned = TextCleaner::new()?.clean_all(records);
        if cleaned.is_empty() {
            return Err(MentalisError::empty_input(format!(
                "none of the {} records has a usable statement after cleaning",
                records.len()
            )));
        }
        let rows_cleaned = cleaned.len();
        info!("{} of {} records survived cleaning", rows_cleaned, records.len());

        let dataset = Dataset::split(
            cleaned,
            self.config.data.test_fraction,
            self.config.data.split_seed,
        )?;
        info!(
            "Split into {} training and {} test rows",
            dataset.train.len(),
            dataset.test.len()
        );

        let folds = self.config.cross_validation.folds;
        if dataset.train.len() < folds {
            return Err(MentalisError::data(format!(
                "{} training rows are not enough for {}-fold cross-validation",
                dataset.train.len(),
                folds
            )));
        }

        let candidates = TrainerCatalog::new(self.config.catalog.clone()).candidates();
        info!(
            "Evaluating {} candidates with {}-fold cross-validation",
            candidates.len(),
            folds
        );

        let evaluator = Evaluator::new(self.config.evaluation.clone());
        let validator = CrossValidator::new(
            self.config.cross_validation.clone(),
            Featurizer::new(self.config.featurizer.clone()),
            self.config.trainer.clone(),
            evaluator.clone(),
        );
        let selection = ModelSelector::new(validator).select(&candidates, &dataset.train)?;

        let test_metrics = self.evaluate_test(&evaluator, &selection.model, &dataset.test)?;

        let report = TrainingReport {
            rows_loaded: records.len(),
            rows_skipped: 0,
            rows_cleaned,
            train_rows: dataset.train.len(),
            test_rows: dataset.test.len(),
            folds,
            candidates: selection
                .results
                .iter()
                .map(|r| CandidateSummary {
                    name: r.candidate_name.clone(),
                    metrics: r.aggregate(),
                })
                .collect(),
            best: selection.best.name.clone(),
            test_metrics,
            model_path: None,
        };

        Ok(TrainingOutcome {
            report,
            model: selection.model,
        })
    }

    fn evaluate_test(
        &self,
        evaluator: &Evaluator,
        model: &TrainedModel,
        test: &[CleanedRecord],
    ) -> Result<Option<Metrics>> {
        if test.is_empty() {
            warn!("Test split is empty; skipping evaluation");
            return Ok(None);
        }

        let metrics = evaluator.evaluate(model, test)?;
        info!(
            "Test metrics: micro={:.4} macro={:.4} log-loss={:.4} log-loss-reduction={:.4} top-{}={:.4}",
            metrics.micro_accuracy,
            metrics.macro_accuracy,
            metrics.log_loss,
            metrics.log_loss_reduction,
            metrics.top_k,
            metrics.top_k_accuracy
        );
        Ok(Some(metrics))
    }
}
