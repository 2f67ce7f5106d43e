mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use mentalis::error::Result;
use mentalis::ml::{ModelHandle, TrainerFamily, TrainingPipeline};
use tempfile::TempDir;

use common::{small_config, write_sample_csv};

#[test]
fn test_concurrent_predictions() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let model_path = dir.path().join("model.zip");
    TrainingPipeline::new(small_config(model_path.clone()))?.run(&data)?;

    let handle = Arc::new(ModelHandle::open(&model_path)?);
    let expected = handle.predict("I feel anxious")?;

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || handle.predict("I feel anxious").unwrap())
        })
        .collect();
    for worker in workers {
        let prediction = worker.join().unwrap();
        assert_eq!(prediction.label, expected.label);
        assert_eq!(prediction.scores, expected.scores);
    }

    Ok(())
}

#[test]
fn test_reload_swaps_model() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let model_path = dir.path().join("model.zip");

    let mut config = small_config(model_path.clone());
    config.catalog.families = vec![TrainerFamily::SdcaMaximumEntropy];
    config.catalog.l2_grid = vec![Some(1e-2)];
    TrainingPipeline::new(config.clone())?.run(&data)?;

    let handle = ModelHandle::open(&model_path)?;
    let before = handle.model();
    assert_eq!(before.trainer(), "SdcaMaximumEntropy-L2=1e-2");

    config.catalog.families = vec![TrainerFamily::LbfgsMaximumEntropy];
    config.catalog.l2_grid = vec![None];
    TrainingPipeline::new(config)?.run(&data)?;

    // Snapshots taken before the reload are unaffected.
    handle.reload()?;
    assert_eq!(handle.model().trainer(), "LbfgsMaximumEntropy (No Regularization)");
    assert_eq!(before.trainer(), "SdcaMaximumEntropy-L2=1e-2");

    Ok(())
}

#[test]
fn test_failed_reload_keeps_current_model() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let model_path = dir.path().join("model.zip");
    TrainingPipeline::new(small_config(model_path.clone()))?.run(&data)?;

    let handle = ModelHandle::open(&model_path)?;
    let trainer = handle.model().trainer().to_string();
    let expected = handle.predict("nothing matters anymore")?;

    fs::write(&model_path, b"not a model")?;
    assert!(handle.reload().is_err());

    assert_eq!(handle.model().trainer(), trainer);
    let prediction = handle.predict("nothing matters anymore")?;
    assert_eq!(prediction.scores, expected.scores);

    fs::remove_file(&model_path)?;
    assert!(handle.reload().is_err());
    assert_eq!(handle.model().trainer(), trainer);

    Ok(())
}

#[test]
fn test_blank_statement_is_rejected() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let model_path = dir.path().join("model.zip");
    TrainingPipeline::new(small_config(model_path.clone()))?.run(&data)?;

    let handle = ModelHandle::open(&model_path)?;
    assert!(handle.predict("").is_err());
    assert!(handle.predict("   ").is_err());
    Ok(())
}
