//! Binary logistic regression trained with SGD and calibrated with Platt
//! scaling on the training margins.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{MentalisError, Result};
use crate::ml::sparse::SparseVector;
use crate::ml::trainer::linear::{LinearModel, PlattCalibration, log1p_exp, sigmoid};
use crate::ml::trainer::{BinaryTrainer, TrainerOptions};

const PLATT_ITERATIONS: usize = 100;
const PLATT_RIDGE: f64 = 1e-12;

/// SGD logistic regression with a Platt-scaled output.
#[derive(Debug, Clone)]
pub struct SgdCalibrated {
    l2: f64,
    options: TrainerOptions,
}

impl SgdCalibrated {
    pub fn new(l2: Option<f64>, options: TrainerOptions) -> Self {
        SgdCalibrated {
            l2: l2.unwrap_or(0.0),
            options,
        }
    }
}

impl SgdCalibrated {
    /// Run the SGD epochs, returning the uncalibrated model and the number of
    /// epochs it took.
    ///
    /// Stops early once the mean epoch loss changes by less than `tolerance`
    /// relative to its magnitude.
    fn train(
        &self,
        rows: &[SparseVector],
        targets: &[bool],
        dimension: usize,
    ) -> Result<(LinearModel, usize)> {
        if rows.is_empty() {
            return Err(MentalisError::training("no training rows"));
        }

        // Weights are `scale * raw` so L2 shrinkage stays O(1) per step.
        let mut raw = vec![0.0; dimension];
        let mut scale = 1.0;
        let mut bias = 0.0;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut t = 0.0;
        let mut previous_loss: Option<f64> = None;
        let mut epochs = 0;

        for epoch in 0..self.options.max_iterations {
            epochs = epoch + 1;
            order.shuffle(&mut rng);
            let mut loss = 0.0;

            for &i in &order {
                let rate =
                    self.options.learning_rate / (1.0 + self.options.learning_rate * self.l2 * t);
                t += 1.0;

                let target = if targets[i] { 1.0 } else { 0.0 };
                let margin = scale * rows[i].dot(&raw) + bias;
                loss += log1p_exp(margin) - target * margin;
                let error = sigmoid(margin) - target;

                if self.l2 > 0.0 {
                    scale *= 1.0 - rate * self.l2;
                    if scale < 1e-9 {
                        raw.iter_mut().for_each(|w| *w *= scale);
                        scale = 1.0;
                    }
                }
                rows[i].add_scaled_to(&mut raw, -rate * error / scale);
                bias -= rate * error;
            }

            loss /= rows.len() as f64;
            if !loss.is_finite() {
                return Err(MentalisError::training("SGD diverged"));
            }
            if let Some(previous) = previous_loss {
                let improvement = (previous - loss).abs() / previous.abs().max(1.0);
                if improvement < self.options.tolerance {
                    debug!("SGD converged after {} epochs", epochs);
                    break;
                }
            }
            previous_loss = Some(loss);
        }

        raw.iter_mut().for_each(|w| *w *= scale);
        Ok((LinearModel::new(raw, bias), epochs))
    }
}

impl BinaryTrainer for SgdCalibrated {
    fn fit_binary(
        &self,
        rows: &[SparseVector],
        targets: &[bool],
        dimension: usize,
    ) -> Result<LinearModel> {
        let (mut model, _) = self.train(rows, targets, dimension)?;
        let margins: Vec<f64> = rows.iter().map(|row| model.margin(row)).collect();
        model.calibration = Some(fit_platt(&margins, targets));
        Ok(model)
    }

    fn name(&self) -> String {
        "SgdCalibrated".to_string()
    }
}

/// Fit `p = sigmoid(slope * margin + offset)` by Newton's method.
///
/// Targets are smoothed as in Platt's method so a separable training set does
/// not drive the slope to infinity.
pub fn fit_platt(margins: &[f64], targets: &[bool]) -> PlattCalibration {
    let positives = targets.iter().filter(|&&t| t).count() as f64;
    let negatives = targets.len() as f64 - positives;
    let high = (positives + 1.0) / (positives + 2.0);
    let low = 1.0 / (negatives + 2.0);
    let smoothed: Vec<f64> = targets
        .iter()
        .map(|&t| if t { high } else { low })
        .collect();

    let objective = |slope: f64, offset: f64| -> f64 {
        margins
            .iter()
            .zip(&smoothed)
            .map(|(&m, &t)| {
                let z = slope * m + offset;
                log1p_exp(z) - t * z
            })
            .sum()
    };

    let mut slope = 0.0;
    let mut offset = ((positives + 1.0) / (negatives + 1.0)).ln();
    let mut value = objective(slope, offset);

    for _ in 0..PLATT_ITERATIONS {
        let (mut g_slope, mut g_offset) = (0.0, 0.0);
        let (mut h_ss, mut h_so, mut h_oo) = (PLATT_RIDGE, 0.0, PLATT_RIDGE);
        for (&m, &t) in margins.iter().zip(&smoothed) {
            let p = sigmoid(slope * m + offset);
            let d = p - t;
            let w = p * (1.0 - p);
            g_slope += d * m;
            g_offset += d;
            h_ss += w * m * m;
            h_so += w * m;
            h_oo += w;
        }

        if g_slope.abs() < 1e-9 && g_offset.abs() < 1e-9 {
            break;
        }

        let det = h_ss * h_oo - h_so * h_so;
        if det.abs() < 1e-300 {
            break;
        }
        let step_slope = -(h_oo * g_slope - h_so * g_offset) / det;
        let step_offset = -(h_ss * g_offset - h_so * g_slope) / det;

        let mut fraction = 1.0;
        let mut improved = false;
        while fraction > 1e-10 {
            let next_slope = slope + fraction * step_slope;
            let next_offset = offset + fraction * step_offset;
            let next_value = objective(next_slope, next_offset);
            if next_value.is_finite() && next_value < value {
                slope = next_slope;
                offset = next_offset;
                value = next_value;
                improved = true;
                break;
            }
            fraction *= 0.5;
        }
        if !improved {
            break;
        }
    }

    PlattCalibration { slope, offset }
}
