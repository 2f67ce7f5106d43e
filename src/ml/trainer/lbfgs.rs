//! L-BFGS solvers for multinomial and binary logistic regression.
//!
//! Objective: mean log-loss plus `(l2 / 2) * ||w||^2`. Biases are not
//! regularized.

use std::collections::VecDeque;

use log::debug;

use crate::error::{MentalisError, Result};
use crate::ml::featurizer::LabeledFeatures;
use crate::ml::sparse::SparseVector;
use crate::ml::trainer::linear::{Classifier, LinearModel, MulticlassLinear, log1p_exp, sigmoid, softmax};
use crate::ml::trainer::{BinaryTrainer, Trainer, TrainerOptions};

const ARMIJO: f64 = 1e-4;
const MAX_LINE_SEARCH_STEPS: usize = 40;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Minimize `objective` starting from `x`.
///
/// `objective` returns the value at its first argument and writes the gradient
/// into the second.
pub(crate) fn minimize<F>(objective: F, mut x: Vec<f64>, options: &TrainerOptions) -> Result<Vec<f64>>
where
    F: Fn(&[f64], &mut [f64]) -> f64,
{
    let n = x.len();
    let mut gradient = vec![0.0; n];
    let mut value = objective(&x, &mut gradient);
    if !value.is_finite() {
        return Err(MentalisError::training("objective is not finite at the start point"));
    }

    let memory = options.history_size.max(1);
    // (s, y, 1 / y.s), oldest first
    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(memory);
    let mut next_x = vec![0.0; n];
    let mut next_gradient = vec![0.0; n];

    for iteration in 0..options.max_iterations {
        let gradient_norm = norm(&gradient);
        if gradient_norm <= options.tolerance * norm(&x).max(1.0) {
            debug!("L-BFGS converged after {iteration} iterations (gradient)");
            break;
        }

        // Two-loop recursion.
        let mut direction = gradient.clone();
        let mut alphas = Vec::with_capacity(history.len());
        for (s, y, rho) in history.iter().rev() {
            let alpha = rho * dot(s, &direction);
            for (d, yi) in direction.iter_mut().zip(y) {
                *d -= alpha * yi;
            }
            alphas.push(alpha);
        }
        if let Some((s, y, _)) = history.back() {
            let gamma = dot(s, y) / dot(y, y);
            direction.iter_mut().for_each(|d| *d *= gamma);
        }
        for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
            let beta = rho * dot(y, &direction);
            for (d, si) in direction.iter_mut().zip(s) {
                *d += si * (alpha - beta);
            }
        }
        direction.iter_mut().for_each(|d| *d = -*d);

        let mut slope = dot(&direction, &gradient);
        if slope >= 0.0 {
            history.clear();
            direction = gradient.iter().map(|g| -g).collect();
            slope = -gradient_norm * gradient_norm;
        }

        let mut step = if history.is_empty() {
            (1.0 / gradient_norm).min(1.0)
        } else {
            1.0
        };

        let mut accepted = None;
        for _ in 0..MAX_LINE_SEARCH_STEPS {
            for ((nx, xi), di) in next_x.iter_mut().zip(&x).zip(&direction) {
                *nx = xi + step * di;
            }
            let candidate = objective(&next_x, &mut next_gradient);
            if candidate.is_finite() && candidate <= value + ARMIJO * step * slope {
                accepted = Some(candidate);
                break;
            }
            step *= 0.5;
        }

        let Some(next_value) = accepted else {
            debug!("L-BFGS line search failed at iteration {iteration}");
            break;
        };

        let s: Vec<f64> = next_x.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = next_gradient
            .iter()
            .zip(&gradient)
            .map(|(a, b)| a - b)
            .collect();
        let sy = dot(&s, &y);
        if sy > 1e-12 {
            if history.len() == memory {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        let improvement = (value - next_value).abs() / value.abs().max(1.0);
        std::mem::swap(&mut x, &mut next_x);
        std::mem::swap(&mut gradient, &mut next_gradient);
        value = next_value;

        if improvement < options.tolerance {
            debug!("L-BFGS converged after {} iterations (objective)", iteration + 1);
            break;
        }
    }

    Ok(x)
}

fn regularization(l2: Option<f64>) -> f64 {
    l2.unwrap_or(0.0)
}

/// Multinomial logistic regression fitted with L-BFGS.
#[derive(Debug, Clone)]
pub struct LbfgsMaximumEntropy {
    l2: f64,
    options: TrainerOptions,
}

impl LbfgsMaximumEntropy {
    pub fn new(l2: Option<f64>, options: TrainerOptions) -> Self {
        LbfgsMaximumEntropy {
            l2: regularization(l2),
            options,
        }
    }
}

impl Trainer for LbfgsMaximumEntropy {
    fn fit(&self, data: &LabeledFeatures) -> Result<Classifier> {
        if data.is_empty() {
            return Err(MentalisError::training("no training rows"));
        }
        let classes = data.num_classes;
        let dimension = data.dimension;
        let weight_count = classes * dimension;
        let n = data.len() as f64;
        let l2 = self.l2;

        let objective = |params: &[f64], gradient: &mut [f64]| -> f64 {
            gradient.iter_mut().for_each(|g| *g = 0.0);
            let (weights, biases) = params.split_at(weight_count);
            let mut loss = 0.0;
            let mut probabilities = vec![0.0; classes];

            for (row, &label) in data.rows.iter().zip(&data.labels) {
                for (k, p) in probabilities.iter_mut().enumerate() {
                    *p = row.dot(&weights[k * dimension..(k + 1) * dimension]) + biases[k];
                }
                let max = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let log_sum = max
                    + probabilities
                        .iter()
                        .map(|z| (z - max).exp())
                        .sum::<f64>()
                        .ln();
                loss += log_sum - probabilities[label as usize];
                softmax(&mut probabilities);

                let (weight_gradient, bias_gradient) = gradient.split_at_mut(weight_count);
                for (k, &p) in probabilities.iter().enumerate() {
                    let error = (p - if k as u32 == label { 1.0 } else { 0.0 }) / n;
                    row.add_scaled_to(&mut weight_gradient[k * dimension..(k + 1) * dimension], error);
                    bias_gradient[k] += error;
                }
            }

            loss /= n;
            if l2 > 0.0 {
                loss += 0.5 * l2 * dot(weights, weights);
                for (g, w) in gradient[..weight_count].iter_mut().zip(weights) {
                    *g += l2 * w;
                }
            }
            loss
        };

        let params = minimize(objective, vec![0.0; weight_count + classes], &self.options)?;
        let (weights, biases) = params.split_at(weight_count);

        Ok(Classifier::Multinomial(MulticlassLinear {
            num_classes: classes,
            dimension,
            weights: weights.to_vec(),
            biases: biases.to_vec(),
        }))
    }

    fn name(&self) -> String {
        "LbfgsMaximumEntropy".to_string()
    }
}

/// Binary logistic regression fitted with L-BFGS.
#[derive(Debug, Clone)]
pub struct LbfgsLogisticRegression {
    l2: f64,
    options: TrainerOptions,
}

impl LbfgsLogisticRegression {
    pub fn new(l2: Option<f64>, options: TrainerOptions) -> Self {
        LbfgsLogisticRegression {
            l2: regularization(l2),
            options,
        }
    }
}

impl BinaryTrainer for LbfgsLogisticRegression {
    fn fit_binary(
        &self,
        rows: &[SparseVector],
        targets: &[bool],
        dimension: usize,
    ) -> Result<LinearModel> {
        if rows.is_empty() {
            return Err(MentalisError::training("no training rows"));
        }
        let n = rows.len() as f64;
        let l2 = self.l2;

        let objective = |params: &[f64], gradient: &mut [f64]| -> f64 {
            gradient.iter_mut().for_each(|g| *g = 0.0);
            let (weights, bias) = params.split_at(dimension);
            let mut loss = 0.0;

            for (row, &target) in rows.iter().zip(targets) {
                let t = if target { 1.0 } else { 0.0 };
                let z = row.dot(weights) + bias[0];
                loss += log1p_exp(z) - t * z;
                let error = (sigmoid(z) - t) / n;
                row.add_scaled_to(&mut gradient[..dimension], error);
                gradient[dimension] += error;
            }

            loss /= n;
            if l2 > 0.0 {
                loss += 0.5 * l2 * dot(weights, weights);
                for (g, w) in gradient[..dimension].iter_mut().zip(weights) {
                    *g += l2 * w;
                }
            }
            loss
        };

        let mut params = minimize(objective, vec![0.0; dimension + 1], &self.options)?;
        let bias = params.pop().unwrap_or(0.0);
        Ok(LinearModel::new(params, bias))
    }

    fn name(&self) -> String {
        "LbfgsLogisticRegression".to_string()
    }
}
