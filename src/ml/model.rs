//! The fitted pipeline: featurizer, classifier and label mapping.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::record::CleanedRecord;
use crate::error::{MentalisError, Result};
use crate::ml::catalog::TrainerCandidate;
use crate::ml::evaluator::Scorer;
use crate::ml::featurizer::{Featurizer, FittedFeaturizer};
use crate::ml::metrics::argmax;
use crate::ml::trainer::{Classifier, TrainerOptions};

/// Result of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class name.
    pub label: String,
    /// One probability per class, in the frozen label order.
    pub scores: Vec<f64>,
}

/// A trained model, safe to share between threads for concurrent prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    trainer: String,
    featurizer: FittedFeaturizer,
    classifier: Classifier,
}

impl TrainedModel {
    /// Assemble a model from fitted parts, checking that they agree.
    pub fn new(trainer: String, featurizer: FittedFeaturizer, classifier: Classifier) -> Result<Self> {
        let model = TrainedModel {
            trainer,
            featurizer,
            classifier,
        };
        model.validate()?;
        Ok(model)
    }

    /// Fit the complete pipeline for `candidate` on `records`.
    pub fn fit(
        candidate: &TrainerCandidate,
        featurizer: &Featurizer,
        options: &TrainerOptions,
        records: &[CleanedRecord],
    ) -> Result<Self> {
        let fitted = featurizer.fit(records)?;
        let features = fitted.featurize(records)?;
        let trainer = candidate.build(options);
        debug!(
            "Fitting {} on {} rows x {} features",
            candidate.name,
            features.len(),
            features.dimension
        );
        let classifier = trainer.fit(&features)?;
        TrainedModel::new(candidate.name.clone(), fitted, classifier)
            .map_err(|e| MentalisError::training(e.to_string()))
    }

    /// Check the classifier against the featurizer's label count and width.
    pub fn validate(&self) -> Result<()> {
        self.classifier
            .validate(self.featurizer.labels().len(), self.featurizer.dimension())
    }

    /// Name of the candidate that produced this model.
    pub fn trainer(&self) -> &str {
        &self.trainer
    }

    pub fn featurizer(&self) -> &FittedFeaturizer {
        &self.featurizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Class names in score order.
    pub fn labels(&self) -> &[String] {
        self.featurizer.labels().labels()
    }

    /// Predict the class of a raw statement.
    pub fn predict(&self, statement: &str) -> Result<Prediction> {
        if statement.trim().is_empty() {
            return Err(MentalisError::prediction_input(
                "statement must not be empty or whitespace",
            ));
        }

        let scores = self.score_text(statement)?;
        let best = argmax(&scores)
            .ok_or_else(|| MentalisError::other("model produced an empty score vector"))?;
        let label = self.labels()[best].clone();

        Ok(Prediction { label, scores })
    }
}

impl Scorer for TrainedModel {
    fn labels(&self) -> &[String] {
        TrainedModel::labels(self)
    }

    fn score_text(&self, statement: &str) -> Result<Vec<f64>> {
        let features = self.featurizer.transform(statement)?;
        Ok(self.classifier.score(&features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::TrainerFamily;

    fn records() -> Vec<CleanedRecord> {
        let rows = [
            ("anxious panic racing heart", "Anxiety"),
            ("panic attack again anxious", "Anxiety"),
            ("worried anxious cannot breathe", "Anxiety"),
            ("empty hopeless sad", "Depression"),
            ("hopeless tired sad again", "Depression"),
            ("nothing matters sad empty", "Depression"),
        ];
        rows.iter()
            .enumerate()
            .map(|(i, (s, l))| CleanedRecord {
                id: i as i64,
                statement: s.to_string(),
                label: l.to_string(),
            })
            .collect()
    }

    fn model() -> TrainedModel {
        let candidate = TrainerCandidate::new(TrainerFamily::LbfgsMaximumEntropy, Some(1e-3));
        TrainedModel::fit(
            &candidate,
            &Featurizer::default(),
            &TrainerOptions::default(),
            &records(),
        )
        .unwrap()
    }

    #[test]
    fn test_predict_known_label_and_simplex() {
        let model = model();
        let prediction = model.predict("I feel so anxious and panic").unwrap();
        assert_eq!(prediction.label, "Anxiety");
        assert_eq!(prediction.scores.len(), 2);
        assert!((prediction.scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let prediction = model.predict("Everything feels hopeless").unwrap();
        assert_eq!(prediction.label, "Depression");
    }

    #[test]
    fn test_blank_statement_rejected() {
        let model = model();
        assert!(matches!(
            model.predict("   "),
            Err(MentalisError::PredictionInput(_))
        ));
    }

    #[test]
    fn test_unknown_words_still_predict() {
        let model = model();
        let prediction = model.predict("zebra").unwrap();
        assert!(model.labels().contains(&prediction.label));
    }

    #[test]
    fn test_trainer_name_recorded() {
        assert_eq!(model().trainer(), "LbfgsMaximumEntropy-L2=1e-3");
    }
}
