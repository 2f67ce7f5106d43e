//! One-versus-all decomposition of a multiclass problem.

use log::debug;

use crate::error::Result;
use crate::ml::featurizer::LabeledFeatures;
use crate::ml::trainer::linear::Classifier;
use crate::ml::trainer::{BinaryTrainer, Trainer};

/// Trains one binary model per class, that class against the rest.
#[derive(Debug, Clone)]
pub struct OneVersusAll<B> {
    binary: B,
}

impl<B: BinaryTrainer> OneVersusAll<B> {
    pub fn new(binary: B) -> Self {
        OneVersusAll { binary }
    }
}

impl<B: BinaryTrainer> Trainer for OneVersusAll<B> {
    fn fit(&self, data: &LabeledFeatures) -> Result<Classifier> {
        let models = (0..data.num_classes as u32)
            .map(|class| {
                let targets: Vec<bool> = data.labels.iter().map(|&l| l == class).collect();
                debug!(
                    "{}: class {} has {} positives",
                    self.name(),
                    class,
                    targets.iter().filter(|&&t| t).count()
                );
                self.binary.fit_binary(&data.rows, &targets, data.dimension)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Classifier::OneVersusAll(models))
    }

    fn name(&self) -> String {
        format!("OneVersusAll({})", self.binary.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::fixtures::{three_class_data, training_accuracy};
    use crate::ml::trainer::{LbfgsLogisticRegression, TrainerOptions};

    #[test]
    fn test_one_model_per_class() {
        let data = three_class_data();
        let trainer = OneVersusAll::new(LbfgsLogisticRegression::new(
            Some(1e-3),
            TrainerOptions::default(),
        ));
        assert_eq!(trainer.name(), "OneVersusAll(LbfgsLogisticRegression)");

        let classifier = trainer.fit(&data).unwrap();
        match &classifier {
            Classifier::OneVersusAll(models) => assert_eq!(models.len(), 3),
            Classifier::Multinomial(_) => panic!("expected one-versus-all"),
        }
        assert_eq!(training_accuracy(&classifier, &data), 1.0);
    }
}
