//! Stochastic dual coordinate ascent for L2-regularized logistic losses.
//!
//! Primal weights are kept in sync with the dual variables through
//! `w = (1 / (l2 * n)) * sum_i alpha_i * x_i`. The bias is an implicit
//! constant feature of value 1 and is regularized with the weights.
//!
//! SDCA needs a strictly positive L2 strength. Without one it uses
//! `max(1e-6, 1 / n)`.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{MentalisError, Result};
use crate::ml::featurizer::LabeledFeatures;
use crate::ml::sparse::SparseVector;
use crate::ml::trainer::linear::{Classifier, LinearModel, MulticlassLinear, sigmoid, softmax};
use crate::ml::trainer::{BinaryTrainer, Trainer, TrainerOptions};

/// Smoothness of the logistic losses (both are 1-smooth).
const GAMMA: f64 = 1.0;

fn effective_l2(l2: Option<f64>, n: usize) -> f64 {
    match l2 {
        Some(l2) if l2 > 0.0 => l2,
        _ => (1.0 / n as f64).max(1e-6),
    }
}

fn step_fraction(squared_norm: f64, lambda_n: f64) -> f64 {
    lambda_n * GAMMA / (squared_norm + 1.0 + lambda_n * GAMMA)
}

/// Multinomial logistic regression fitted with SDCA.
#[derive(Debug, Clone)]
pub struct SdcaMaximumEntropy {
    l2: Option<f64>,
    options: TrainerOptions,
}

impl SdcaMaximumEntropy {
    pub fn new(l2: Option<f64>, options: TrainerOptions) -> Self {
        SdcaMaximumEntropy { l2, options }
    }
}

impl Trainer for SdcaMaximumEntropy {
    fn fit(&self, data: &LabeledFeatures) -> Result<Classifier> {
        if data.is_empty() {
            return Err(MentalisError::training("no training rows"));
        }
        let n = data.len();
        let classes = data.num_classes;
        let lambda_n = effective_l2(self.l2, n) * n as f64;
        let scale = 1.0 / lambda_n;

        let mut model = MulticlassLinear::zeros(classes, data.dimension);
        let mut alpha = vec![0.0; n * classes];
        let norms: Vec<f64> = data.rows.iter().map(SparseVector::squared_norm).collect();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);

        for epoch in 0..self.options.max_iterations {
            order.shuffle(&mut rng);
            let mut change = 0.0;

            for &i in &order {
                let row = &data.rows[i];
                let label = data.labels[i] as usize;
                let mut probabilities = model.logits(row);
                softmax(&mut probabilities);
                let s = step_fraction(norms[i], lambda_n);

                for (k, p) in probabilities.iter().enumerate() {
                    let target = if k == label { 1.0 } else { 0.0 };
                    let dual = &mut alpha[i * classes + k];
                    let delta = s * ((target - p) - *dual);
                    if delta == 0.0 {
                        continue;
                    }
                    *dual += delta;
                    change += delta.abs();

                    let dimension = model.dimension;
                    row.add_scaled_to(
                        &mut model.weights[k * dimension..(k + 1) * dimension],
                        delta * scale,
                    );
                    model.biases[k] += delta * scale;
                }
            }

            if !change.is_finite() {
                return Err(MentalisError::training("SDCA diverged"));
            }
            if change / (n as f64) < self.options.tolerance {
                debug!("SDCA converged after {} epochs", epoch + 1);
                break;
            }
        }

        Ok(Classifier::Multinomial(model))
    }

    fn name(&self) -> String {
        "SdcaMaximumEntropy".to_string()
    }
}

/// Binary logistic regression fitted with SDCA.
#[derive(Debug, Clone)]
pub struct SdcaLogisticRegression {
    l2: Option<f64>,
    options: TrainerOptions,
}

impl SdcaLogisticRegression {
    pub fn new(l2: Option<f64>, options: TrainerOptions) -> Self {
        SdcaLogisticRegression { l2, options }
    }
}

impl BinaryTrainer for SdcaLogisticRegression {
    fn fit_binary(
        &self,
        rows: &[SparseVector],
        targets: &[bool],
        dimension: usize,
    ) -> Result<LinearModel> {
        if rows.is_empty() {
            return Err(MentalisError::training("no training rows"));
        }
        let n = rows.len();
        let lambda_n = effective_l2(self.l2, n) * n as f64;
        let scale = 1.0 / lambda_n;

        let mut model = LinearModel::new(vec![0.0; dimension], 0.0);
        let mut alpha = vec![0.0; n];
        let norms: Vec<f64> = rows.iter().map(SparseVector::squared_norm).collect();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);

        for epoch in 0..self.options.max_iterations {
            order.shuffle(&mut rng);
            let mut change = 0.0;

            for &i in &order {
                let y = if targets[i] { 1.0 } else { -1.0 };
                let margin = model.margin(&rows[i]);
                // Negative loss derivative at the current margin.
                let u = y * sigmoid(-y * margin);
                let delta = step_fraction(norms[i], lambda_n) * (u - alpha[i]);
                if delta == 0.0 {
                    continue;
                }
                alpha[i] += delta;
                change += delta.abs();
                rows[i].add_scaled_to(&mut model.weights, delta * scale);
                model.bias += delta * scale;
            }

            if !change.is_finite() {
                return Err(MentalisError::training("SDCA diverged"));
            }
            if change / (n as f64) < self.options.tolerance {
                debug!("SDCA converged after {} epochs", epoch + 1);
                break;
            }
        }

        Ok(model)
    }

    fn name(&self) -> String {
        "SdcaLogisticRegression".to_string()
    }
}
