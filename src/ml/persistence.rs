//! Binary model artifacts.
//!
//! Layout (little-endian):
//!
//! | bytes | field |
//! |---|---|
//! | 4 | magic `MHMD` |
//! | 2 | format version |
//! | 8 | payload length |
//! | 4 | CRC-32 of the payload |
//! | n | bincode payload: [`ModelSchema`] + [`TrainedModel`] |
//!
//! Files are written to a sibling temporary file and renamed into place, so a
//! reader sees either the old artifact or the complete new one.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::DataConfig;
use crate::error::{MentalisError, Result};
use crate::ml::model::TrainedModel;

const MAGIC: &[u8; 4] = b"MHMD";
pub const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 8 + 4;

/// Describes the input the model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub id_column: String,
    pub statement_column: String,
    pub label_column: String,
    /// Class names in score order.
    pub labels: Vec<String>,
    pub trainer: String,
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
}

impl ModelSchema {
    pub fn new(data: &DataConfig, model: &TrainedModel) -> Self {
        ModelSchema {
            id_column: data.id_column.clone(),
            statement_column: data.statement_column.clone(),
            label_column: data.label_column.clone(),
            labels: model.labels().to_vec(),
            trainer: model.trainer().to_string(),
            crate_version: crate::VERSION.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Schema and model as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: ModelSchema,
    pub model: TrainedModel,
}

/// Saves and loads [`TrainedModel`]s.
pub struct ModelPersistence;

impl ModelPersistence {
    /// Encode an artifact to bytes.
    pub fn to_bytes(model: &TrainedModel, schema: &ModelSchema) -> Result<Vec<u8>> {
        let artifact = ModelArtifactRef { schema, model };
        let payload = bincode::serialize(&artifact)
            .map_err(|e| MentalisError::serialization(format!("Failed to encode model: {}", e)))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.write_all(MAGIC)?;
        bytes.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        bytes.write_u64::<LittleEndian>(payload.len() as u64)?;
        bytes.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
        bytes.write_all(&payload)?;
        Ok(bytes)
    }

    /// Decode and validate an artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<ModelArtifact> {
        if bytes.len() < HEADER_LEN {
            return Err(MentalisError::model_load(format!(
                "artifact is truncated ({} bytes)",
                bytes.len()
            )));
        }

        let mut input = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(MentalisError::model_load("not a model artifact (bad magic)"));
        }

        let version = input.read_u16::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(MentalisError::model_load(format!(
                "unsupported artifact version {version} (expected {FORMAT_VERSION})"
            )));
        }

        let length = input.read_u64::<LittleEndian>()?;
        let checksum = input.read_u32::<LittleEndian>()?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() as u64 != length {
            return Err(MentalisError::model_load(format!(
                "payload is {} bytes, header says {}",
                payload.len(),
                length
            )));
        }
        if crc32fast::hash(payload) != checksum {
            return Err(MentalisError::model_load("payload checksum mismatch"));
        }

        let artifact: ModelArtifact = bincode::deserialize(payload)
            .map_err(|e| MentalisError::model_load(format!("Failed to decode model: {}", e)))?;

        artifact.model.validate()?;
        if artifact.schema.labels != artifact.model.labels() {
            return Err(MentalisError::model_load(
                "schema labels do not match the model labels",
            ));
        }

        Ok(artifact)
    }

    /// Atomically write `model` to `path`, creating parent directories.
    pub fn save<P: AsRef<Path>>(model: &TrainedModel, schema: &ModelSchema, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = Self::to_bytes(model, schema)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = temp_path(path);
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        info!("Saved model {} to {}", model.trainer(), path.display());
        Ok(())
    }

    /// Load the full artifact from `path`.
    pub fn load_artifact<P: AsRef<Path>>(path: P) -> Result<ModelArtifact> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            MentalisError::model_load(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let artifact = Self::from_bytes(&bytes)?;
        debug!(
            "Loaded model {} ({} labels) from {}",
            artifact.schema.trainer,
            artifact.schema.labels.len(),
            path.display()
        );
        Ok(artifact)
    }

    /// Load the model from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
        Ok(Self::load_artifact(path)?.model)
    }
}

/// Borrowing twin of [`ModelArtifact`] for encoding without clones.
#[derive(Serialize)]
struct ModelArtifactRef<'a> {
    schema: &'a ModelSchema,
    model: &'a TrainedModel,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::CleanedRecord;
    use crate::ml::catalog::TrainerCandidate;
    use crate::ml::featurizer::{Featurizer, FittedFeaturizer};
    use crate::ml::trainer::{TrainerFamily, TrainerOptions};

    fn model() -> TrainedModel {
        let records: Vec<CleanedRecord> = [
            ("anxious panic racing", "Anxiety"),
            ("hopeless sad empty", "Depression"),
            ("calm good day", "Normal"),
            ("panic anxious again", "Anxiety"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (s, l))| CleanedRecord {
            id: i as i64,
            statement: s.to_string(),
            label: l.to_string(),
        })
        .collect();
        let candidate = TrainerCandidate::new(TrainerFamily::OvaSgdCalibrated, Some(1e-4));
        TrainedModel::fit(
            &candidate,
            &Featurizer::default(),
            &TrainerOptions::default(),
            &records,
        )
        .unwrap()
    }

    fn bytes() -> (TrainedModel, Vec<u8>) {
        let model = model();
        let schema = ModelSchema::new(&DataConfig::default(), &model);
        let bytes = ModelPersistence::to_bytes(&model, &schema).unwrap();
        (model, bytes)
    }

    #[test]
    fn test_round_trip_bytes() {
        let (model, bytes) = bytes();
        assert_eq!(&bytes[..4], b"MHMD");
        let artifact = ModelPersistence::from_bytes(&bytes).unwrap();
        assert_eq!(artifact.schema.labels, model.labels());
        assert_eq!(artifact.schema.statement_column, "Statement");
        for text in ["anxious", "sad and empty", "unknown words"] {
            assert_eq!(
                artifact.model.predict(text).unwrap(),
                model.predict(text).unwrap()
            );
        }
    }

    #[test]
    fn test_truncated_artifact_fails() {
        let (_, bytes) = bytes();
        for cut in [0, 10, bytes.len() - 1] {
            let result = ModelPersistence::from_bytes(&bytes[..cut]);
            assert!(matches!(result, Err(MentalisError::ModelLoad(_))), "cut {cut}");
        }
    }

    #[test]
    fn test_corrupt_payload_fails() {
        let (_, mut bytes) = bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            ModelPersistence::from_bytes(&bytes),
            Err(MentalisError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_bad_magic_and_version_fail() {
        let (_, bytes) = bytes();

        let mut wrong_magic = bytes.clone();
        wrong_magic[0] = b'X';
        assert!(matches!(
            ModelPersistence::from_bytes(&wrong_magic),
            Err(MentalisError::ModelLoad(_))
        ));

        let mut wrong_version = bytes;
        wrong_version[4] = 99;
        assert!(matches!(
            ModelPersistence::from_bytes(&wrong_version),
            Err(MentalisError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_schema_label_mismatch_fails() {
        let model = model();
        let mut schema = ModelSchema::new(&DataConfig::default(), &model);
        schema.labels.reverse();
        assert_ne!(schema.labels, model.labels());

        let bytes = ModelPersistence::to_bytes(&model, &schema).unwrap();
        assert!(matches!(
            ModelPersistence::from_bytes(&bytes),
            Err(MentalisError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_duplicate_labels_fail_to_load() {
        let model = model();
        let mut state = serde_json::to_value(model.featurizer()).unwrap();
        state["labels"] = serde_json::json!(["Anxiety", "Depression", "Anxiety"]);
        let restored = serde_json::from_value::<FittedFeaturizer>(state);
        assert!(restored.is_err());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("Data/MentalHealthModel.zip")),
            PathBuf::from("Data/MentalHealthModel.zip.tmp")
        );
    }
}
