//! Trainers for multiclass linear classifiers.
//!
//! Every trainer turns [`LabeledFeatures`] into a [`Classifier`]. Two solve the
//! multinomial (maximum entropy) problem directly; the others are binary
//! logistic solvers wrapped in a one-versus-all decomposition.
//!
//! | family | solver |
//! |---|---|
//! | `SdcaMaximumEntropy` | stochastic dual coordinate ascent |
//! | `LbfgsMaximumEntropy` | L-BFGS |
//! | `OneVersusAll(SdcaLogisticRegression)` | SDCA per class |
//! | `OneVersusAll(LbfgsLogisticRegression)` | L-BFGS per class |
//! | `OneVersusAll(SgdCalibrated)` | SGD per class, Platt-calibrated |

pub mod lbfgs;
pub mod linear;
pub mod ova;
pub mod sdca;
pub mod sgd;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::featurizer::LabeledFeatures;
use crate::ml::sparse::SparseVector;

pub use lbfgs::{LbfgsLogisticRegression, LbfgsMaximumEntropy};
pub use linear::{Classifier, LinearModel, MulticlassLinear, PlattCalibration};
pub use ova::OneVersusAll;
pub use sdca::{SdcaLogisticRegression, SdcaMaximumEntropy};
pub use sgd::SgdCalibrated;

/// Fits a multiclass classifier.
pub trait Trainer: Send + Sync {
    /// Fit on featurized training rows.
    fn fit(&self, data: &LabeledFeatures) -> Result<Classifier>;

    /// Display name, e.g. `OneVersusAll(SgdCalibrated)`.
    fn name(&self) -> String;
}

/// Fits a binary classifier; the building block of [`OneVersusAll`].
pub trait BinaryTrainer: Send + Sync {
    fn fit_binary(
        &self,
        rows: &[SparseVector],
        targets: &[bool],
        dimension: usize,
    ) -> Result<LinearModel>;

    fn name(&self) -> String;
}

/// Solver settings shared by every trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerOptions {
    /// Epochs for SDCA and SGD, iterations for L-BFGS.
    pub max_iterations: usize,
    /// Convergence threshold.
    pub tolerance: f64,
    /// L-BFGS memory size.
    pub history_size: usize,
    /// Initial SGD step size.
    pub learning_rate: f64,
    /// Seed for the example order of the stochastic solvers.
    pub seed: u64,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        TrainerOptions {
            max_iterations: 100,
            tolerance: 1e-6,
            history_size: 10,
            learning_rate: 0.1,
            seed: 1,
        }
    }
}

/// The five trainer families of the candidate sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainerFamily {
    SdcaMaximumEntropy,
    LbfgsMaximumEntropy,
    #[serde(rename = "OneVersusAll(SdcaLogisticRegression)")]
    OvaSdcaLogisticRegression,
    #[serde(rename = "OneVersusAll(LbfgsLogisticRegression)")]
    OvaLbfgsLogisticRegression,
    #[serde(rename = "OneVersusAll(SgdCalibrated)")]
    OvaSgdCalibrated,
}

impl TrainerFamily {
    pub const ALL: [TrainerFamily; 5] = [
        TrainerFamily::SdcaMaximumEntropy,
        TrainerFamily::LbfgsMaximumEntropy,
        TrainerFamily::OvaSdcaLogisticRegression,
        TrainerFamily::OvaLbfgsLogisticRegression,
        TrainerFamily::OvaSgdCalibrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainerFamily::SdcaMaximumEntropy => "SdcaMaximumEntropy",
            TrainerFamily::LbfgsMaximumEntropy => "LbfgsMaximumEntropy",
            TrainerFamily::OvaSdcaLogisticRegression => "OneVersusAll(SdcaLogisticRegression)",
            TrainerFamily::OvaLbfgsLogisticRegression => "OneVersusAll(LbfgsLogisticRegression)",
            TrainerFamily::OvaSgdCalibrated => "OneVersusAll(SgdCalibrated)",
        }
    }

    /// Instantiate a trainer of this family.
    ///
    /// `l2 = None` means no regularization.
    pub fn build(&self, l2: Option<f64>, options: &TrainerOptions) -> Box<dyn Trainer> {
        let options = options.clone();
        match self {
            TrainerFamily::SdcaMaximumEntropy => Box::new(SdcaMaximumEntropy::new(l2, options)),
            TrainerFamily::LbfgsMaximumEntropy => Box::new(LbfgsMaximumEntropy::new(l2, options)),
            TrainerFamily::OvaSdcaLogisticRegression => {
                Box::new(OneVersusAll::new(SdcaLogisticRegression::new(l2, options)))
            }
            TrainerFamily::OvaLbfgsLogisticRegression => {
                Box::new(OneVersusAll::new(LbfgsLogisticRegression::new(l2, options)))
            }
            TrainerFamily::OvaSgdCalibrated => {
                Box::new(OneVersusAll::new(SgdCalibrated::new(l2, options)))
            }
        }
    }
}

impl fmt::Display for TrainerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
