//! Model training, selection, evaluation and serving.
//!
//! The pieces compose as follows:
//!
//! ```text
//! TrainerCatalog ──candidates──▶ ModelSelector ──▶ CrossValidator (k folds)
//!                                     │                 │
//!                                     │        Featurizer::fit + Trainer::fit
//!                                     ▼
//!                           refit winner ──▶ Evaluator ──▶ ModelPersistence
//! ```
//!
//! [`TrainingPipeline`] runs the whole sequence; [`ModelHandle`] serves a
//! saved model to concurrent readers.

pub mod catalog;
pub mod cross_validation;
pub mod evaluator;
pub mod featurizer;
pub mod handle;
pub mod label;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod selection;
pub mod sparse;
pub mod trainer;

pub use catalog::{CatalogConfig, TrainerCandidate, TrainerCatalog};
pub use cross_validation::{CVResult, CrossValidationConfig, CrossValidator, fold_partitions};
pub use evaluator::{EvaluationConfig, Evaluator, Scorer};
pub use featurizer::{Featurizer, FeaturizerConfig, FittedFeaturizer, LabeledFeatures};
pub use handle::ModelHandle;
pub use label::LabelSpace;
pub use metrics::{FoldMetrics, Metrics};
pub use model::{Prediction, TrainedModel};
pub use persistence::{ModelArtifact, ModelPersistence, ModelSchema};
pub use pipeline::{TrainingOutcome, TrainingPipeline, TrainingReport};
pub use selection::{ModelSelector, Selection};
pub use sparse::SparseVector;
pub use trainer::{Classifier, Trainer, TrainerFamily, TrainerOptions};
