//! Fitted linear classifiers and the link functions they share.

use serde::{Deserialize, Serialize};

use crate::error::{MentalisError, Result};
use crate::ml::sparse::SparseVector;

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(z))` without overflow.
pub fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Softmax of `logits` in place.
pub fn softmax(logits: &mut [f64]) {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for z in logits.iter_mut() {
        *z = (*z - max).exp();
        sum += *z;
    }
    if sum > 0.0 {
        for z in logits.iter_mut() {
            *z /= sum;
        }
    }
}

/// Platt scaling applied on top of a binary margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibration {
    pub slope: f64,
    pub offset: f64,
}

impl PlattCalibration {
    pub fn probability(&self, margin: f64) -> f64 {
        sigmoid(self.slope * margin + self.offset)
    }
}

/// A binary linear model `p = sigmoid(w.x + b)`, optionally calibrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub calibration: Option<PlattCalibration>,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        LinearModel {
            weights,
            bias,
            calibration: None,
        }
    }

    pub fn margin(&self, x: &SparseVector) -> f64 {
        x.dot(&self.weights) + self.bias
    }

    /// Probability of the positive class.
    pub fn probability(&self, x: &SparseVector) -> f64 {
        let margin = self.margin(x);
        match &self.calibration {
            Some(calibration) => calibration.probability(margin),
            None => sigmoid(margin),
        }
    }
}

/// A multinomial linear model. Weights are stored class-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassLinear {
    pub num_classes: usize,
    pub dimension: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl MulticlassLinear {
    pub fn zeros(num_classes: usize, dimension: usize) -> Self {
        MulticlassLinear {
            num_classes,
            dimension,
            weights: vec![0.0; num_classes * dimension],
            biases: vec![0.0; num_classes],
        }
    }

    pub fn class_weights(&self, class: usize) -> &[f64] {
        &self.weights[class * self.dimension..(class + 1) * self.dimension]
    }

    pub fn logits(&self, x: &SparseVector) -> Vec<f64> {
        (0..self.num_classes)
            .map(|k| x.dot(self.class_weights(k)) + self.biases[k])
            .collect()
    }
}

/// A fitted multiclass classifier producing one probability per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    /// Softmax over per-class linear scores.
    Multinomial(MulticlassLinear),
    /// One binary model per class; probabilities are normalized to sum to 1.
    OneVersusAll(Vec<LinearModel>),
}

impl Classifier {
    pub fn num_classes(&self) -> usize {
        match self {
            Classifier::Multinomial(model) => model.num_classes,
            Classifier::OneVersusAll(models) => models.len(),
        }
    }

    /// Class probabilities in key order.
    pub fn score(&self, x: &SparseVector) -> Vec<f64> {
        match self {
            Classifier::Multinomial(model) => {
                let mut logits = model.logits(x);
                softmax(&mut logits);
                logits
            }
            Classifier::OneVersusAll(models) => {
                let mut scores: Vec<f64> = models.iter().map(|m| m.probability(x)).collect();
                let sum: f64 = scores.iter().sum();
                if sum > 0.0 {
                    for s in &mut scores {
                        *s /= sum;
                    }
                } else if !scores.is_empty() {
                    let uniform = 1.0 / scores.len() as f64;
                    scores.iter_mut().for_each(|s| *s = uniform);
                }
                scores
            }
        }
    }

    /// Check that the parameters fit the expected shape.
    pub fn validate(&self, num_classes: usize, dimension: usize) -> Result<()> {
        if self.num_classes() != num_classes {
            return Err(MentalisError::model_load(format!(
                "classifier has {} classes but the label space has {}",
                self.num_classes(),
                num_classes
            )));
        }

        let widths_ok = match self {
            Classifier::Multinomial(model) => {
                model.dimension == dimension
                    && model.weights.len() == num_classes * dimension
                    && model.biases.len() == num_classes
            }
            Classifier::OneVersusAll(models) => models.iter().all(|m| m.weights.len() == dimension),
        };
        if !widths_ok {
            return Err(MentalisError::model_load(format!(
                "classifier weights do not match the feature width {dimension}"
            )));
        }

        let finite = match self {
            Classifier::Multinomial(model) => model
                .weights
                .iter()
                .chain(&model.biases)
                .all(|v| v.is_finite()),
            Classifier::OneVersusAll(models) => models
                .iter()
                .all(|m| m.bias.is_finite() && m.weights.iter().all(|v| v.is_finite())),
        };
        if !finite {
            return Err(MentalisError::model_load("classifier has non-finite parameters"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_is_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_log1p_exp() {
        assert!((log1p_exp(0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((log1p_exp(800.0) - 800.0).abs() < 1e-9);
        assert!(log1p_exp(-800.0) >= 0.0);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut logits = vec![1000.0, 1001.0, 999.0];
        softmax(&mut logits);
        assert!((logits.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(logits[1] > logits[0] && logits[0] > logits[2]);
    }

    #[test]
    fn test_multinomial_scores() {
        let mut model = MulticlassLinear::zeros(2, 2);
        model.weights = vec![1.0, 0.0, 0.0, 1.0];
        let classifier = Classifier::Multinomial(model);

        let x = SparseVector::from_pairs(2, vec![(0, 2.0)]);
        let scores = classifier.score(&x);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ova_scores_are_normalized() {
        let classifier = Classifier::OneVersusAll(vec![
            LinearModel::new(vec![2.0], 0.0),
            LinearModel::new(vec![-2.0], 0.0),
            LinearModel::new(vec![0.0], 0.0),
        ]);
        let x = SparseVector::from_pairs(1, vec![(0, 1.0)]);
        let scores = classifier.score(&x);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(scores[0] > scores[2] && scores[2] > scores[1]);
    }

    #[test]
    fn test_validate_shapes() {
        let classifier = Classifier::Multinomial(MulticlassLinear::zeros(3, 4));
        assert!(classifier.validate(3, 4).is_ok());
        assert!(classifier.validate(2, 4).is_err());
        assert!(classifier.validate(3, 5).is_err());

        let mut model = LinearModel::new(vec![f64::NAN], 0.0);
        model.calibration = Some(PlattCalibration {
            slope: 1.0,
            offset: 0.0,
        });
        assert!(Classifier::OneVersusAll(vec![model]).validate(1, 1).is_err());
    }
}
