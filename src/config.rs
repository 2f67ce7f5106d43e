//! Training run configuration.
//!
//! Every section has defaults, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "featurizer": { "ngram_length": 3 },
//!   "catalog": { "l2_grid": [0.001, null] },
//!   "cross_validation": { "folds": 10 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::DataConfig;
use crate::error::{MentalisError, Result};
use crate::ml::catalog::CatalogConfig;
use crate::ml::cross_validation::CrossValidationConfig;
use crate::ml::evaluator::EvaluationConfig;
use crate::ml::featurizer::FeaturizerConfig;
use crate::ml::trainer::TrainerOptions;

/// Default artifact location, relative to the project root.
pub const DEFAULT_MODEL_PATH: &str = "Data/MentalHealthModel.zip";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub data: DataConfig,
    pub featurizer: FeaturizerConfig,
    pub catalog: CatalogConfig,
    pub cross_validation: CrossValidationConfig,
    pub trainer: TrainerOptions,
    pub evaluation: EvaluationConfig,
    pub model_path: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            data: DataConfig::default(),
            featurizer: FeaturizerConfig::default(),
            catalog: CatalogConfig::default(),
            cross_validation: CrossValidationConfig::default(),
            trainer: TrainerOptions::default(),
            evaluation: EvaluationConfig::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl TrainingConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let data = &self.data;
        if !(data.test_fraction > 0.0 && data.test_fraction < 1.0) {
            return Err(MentalisError::invalid_config(format!(
                "data.test_fraction must be in (0, 1), got {}",
                data.test_fraction
            )));
        }
        if !data.delimiter.is_ascii() {
            return Err(MentalisError::invalid_config("data.delimiter must be an ASCII character"));
        }
        for (name, column) in [
            ("id_column", &data.id_column),
            ("statement_column", &data.statement_column),
            ("label_column", &data.label_column),
        ] {
            if column.trim().is_empty() {
                return Err(MentalisError::invalid_config(format!("data.{name} is empty")));
            }
        }

        if self.featurizer.ngram_length == 0 {
            return Err(MentalisError::invalid_config("featurizer.ngram_length must be at least 1"));
        }
        if self.featurizer.maximum_ngrams_count == 0 {
            return Err(MentalisError::invalid_config(
                "featurizer.maximum_ngrams_count must be at least 1",
            ));
        }

        if self.catalog.families.is_empty() {
            return Err(MentalisError::invalid_config("catalog.families is empty"));
        }
        if self.catalog.l2_grid.is_empty() {
            return Err(MentalisError::invalid_config("catalog.l2_grid is empty"));
        }
        for l2 in self.catalog.l2_grid.iter().flatten() {
            if !l2.is_finite() || *l2 <= 0.0 {
                return Err(MentalisError::invalid_config(format!(
                    "catalog.l2_grid values must be positive and finite, got {l2}"
                )));
            }
            if self.trainer.learning_rate * l2 >= 1.0 {
                return Err(MentalisError::invalid_config(format!(
                    "trainer.learning_rate * l2 must be below 1, got {}",
                    self.trainer.learning_rate * l2
                )));
            }
        }

        if self.cross_validation.folds < 2 {
            return Err(MentalisError::invalid_config(format!(
                "cross_validation.folds must be at least 2, got {}",
                self.cross_validation.folds
            )));
        }

        let trainer = &self.trainer;
        if trainer.max_iterations == 0 {
            return Err(MentalisError::invalid_config("trainer.max_iterations must be at least 1"));
        }
        if !trainer.tolerance.is_finite() || trainer.tolerance < 0.0 {
            return Err(MentalisError::invalid_config("trainer.tolerance must be non-negative"));
        }
        if trainer.history_size == 0 {
            return Err(MentalisError::invalid_config("trainer.history_size must be at least 1"));
        }
        if !trainer.learning_rate.is_finite() || trainer.learning_rate <= 0.0 {
            return Err(MentalisError::invalid_config("trainer.learning_rate must be positive"));
        }

        if self.evaluation.top_k == 0 {
            return Err(MentalisError::invalid_config("evaluation.top_k must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data.test_fraction, 0.2);
        assert_eq!(config.featurizer.ngram_length, 2);
        assert_eq!(config.cross_validation.folds, 5);
        assert_eq!(config.evaluation.top_k, 3);
        assert_eq!(config.catalog.l2_grid.len(), 7);
        assert_eq!(config.model_path, PathBuf::from("Data/MentalHealthModel.zip"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{"featurizer": {"ngram_length": 3}, "catalog": {"l2_grid": [0.001, null]}}"#,
        )
        .unwrap();
        assert_eq!(config.featurizer.ngram_length, 3);
        assert!(config.featurizer.remove_stop_words);
        assert_eq!(config.catalog.l2_grid, vec![Some(0.001), None]);
        assert_eq!(config.catalog.families.len(), 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = TrainingConfig::default();
        config.cross_validation.folds = 1;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.data.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.catalog.l2_grid = vec![Some(-1.0)];
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.catalog.families.clear();
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.evaluation.top_k = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cross_validation": {{"folds": 3, "parallel": false}}}}"#).unwrap();
        let config = TrainingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cross_validation.folds, 3);
        assert!(!config.cross_validation.parallel);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"cross_validation": {{"folds": 0}}}}"#).unwrap();
        assert!(TrainingConfig::from_file(bad.path()).is_err());
    }
}
