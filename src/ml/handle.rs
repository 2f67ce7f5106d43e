//! Shared, reloadable access to a persisted model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use parking_lot::RwLock;

use crate::error::Result;
use crate::ml::model::{Prediction, TrainedModel};
use crate::ml::persistence::ModelPersistence;

/// Serves one loaded model to many concurrent readers.
///
/// Readers get an `Arc` snapshot and never block each other. `reload` reads
/// and validates the whole artifact before swapping it in, so a reader sees
/// either the previous model or the new one.
#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    current: RwLock<Arc<TrainedModel>>,
}

impl ModelHandle {
    /// Load the model at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let model = ModelPersistence::load(&path)?;
        info!("Serving model {} from {}", model.trainer(), path.display());
        Ok(ModelHandle {
            path,
            current: RwLock::new(Arc::new(model)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The active model.
    pub fn model(&self) -> Arc<TrainedModel> {
        Arc::clone(&self.current.read())
    }

    /// Predict with the active model.
    pub fn predict(&self, statement: &str) -> Result<Prediction> {
        self.model().predict(statement)
    }

    /// Re-read the artifact and swap it in.
    ///
    /// On failure the previous model stays active and the error is returned.
    pub fn reload(&self) -> Result<()> {
        match ModelPersistence::load(&self.path) {
            Ok(model) => {
                info!("Reloaded model {} from {}", model.trainer(), self.path.display());
                *self.current.write() = Arc::new(model);
                Ok(())
            }
            Err(e) => {
                warn!("Keeping current model, reload of {} failed: {}", self.path.display(), e);
                Err(e)
            }
        }
    }
}
