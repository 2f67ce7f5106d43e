//! Enumeration of named trainer candidates.
//!
//! The catalog is the cross product of the enabled trainer families and the
//! L2 grid. Candidates only describe a trainer; nothing is instantiated until
//! [`TrainerCandidate::build`] is called.

use serde::{Deserialize, Serialize};

use crate::ml::trainer::{Trainer, TrainerFamily, TrainerOptions};

/// Families and regularization strengths to sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub families: Vec<TrainerFamily>,
    /// L2 strengths; `null` means no regularization.
    pub l2_grid: Vec<Option<f64>>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            families: TrainerFamily::ALL.to_vec(),
            l2_grid: vec![
                Some(1e-2),
                Some(1e-3),
                Some(1e-4),
                Some(1e-5),
                Some(1e-6),
                Some(1e-7),
                None,
            ],
        }
    }
}

/// One named trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerCandidate {
    pub name: String,
    pub family: TrainerFamily,
    pub l2: Option<f64>,
}

impl TrainerCandidate {
    pub fn new(family: TrainerFamily, l2: Option<f64>) -> Self {
        let name = match l2 {
            Some(value) => format!("{}-L2={:e}", family, value),
            None => format!("{} (No Regularization)", family),
        };
        TrainerCandidate { name, family, l2 }
    }

    /// Instantiate the trainer.
    pub fn build(&self, options: &TrainerOptions) -> Box<dyn Trainer> {
        self.family.build(self.l2, options)
    }
}

/// Produces the candidate list in family-major order.
#[derive(Debug, Clone, Default)]
pub struct TrainerCatalog {
    config: CatalogConfig,
}

impl TrainerCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        TrainerCatalog { config }
    }

    pub fn candidates(&self) -> Vec<TrainerCandidate> {
        self.config
            .families
            .iter()
            .flat_map(|&family| {
                self.config
                    .l2_grid
                    .iter()
                    .map(move |&l2| TrainerCandidate::new(family, l2))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.config.families.len() * self.config.l2_grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
