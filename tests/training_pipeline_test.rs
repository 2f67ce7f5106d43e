mod common;

use mentalis::config::TrainingConfig;
use mentalis::data::{CsvRecordLoader, Record};
use mentalis::error::{MentalisError, Result};
use mentalis::ml::{ModelPersistence, TrainingPipeline};
use tempfile::TempDir;

use common::{small_config, write_sample_csv};

#[test]
fn test_train_save_and_predict() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let model_path = dir.path().join("Data").join("MentalHealthModel.zip");

    let pipeline = TrainingPipeline::new(small_config(model_path.clone()))?;
    let outcome = pipeline.run(&data)?;

    let report = &outcome.report;
    assert_eq!(report.rows_loaded, 42);
    assert_eq!(report.rows_skipped, 0);
    assert_eq!(report.rows_cleaned, 42);
    assert_eq!(report.train_rows + report.test_rows, 42);
    assert_eq!(report.candidates.len(), 4);
    assert!(report.candidates.iter().any(|c| c.name == report.best));
    assert_eq!(report.model_path.as_deref(), Some(model_path.as_path()));
    assert!(model_path.exists());

    let metrics = report.test_metrics.as_ref().expect("test split is not empty");
    assert!((0.0..=1.0).contains(&metrics.micro_accuracy));
    assert!((0.0..=1.0).contains(&metrics.macro_accuracy));
    assert!(metrics.log_loss >= 0.0);

    let model = ModelPersistence::load(&model_path)?;
    assert_eq!(model.trainer(), report.best);
    assert_eq!(model.labels(), outcome.model.labels());

    let prediction = model.predict("I feel anxious")?;
    let total: f64 = prediction.scores.iter().sum();
    assert!((total - 1.0).abs() < 1e-5);
    assert!(model.labels().contains(&prediction.label));
    assert_eq!(prediction.scores.len(), 3);

    let in_memory = outcome.model.predict("I feel anxious")?;
    assert_eq!(in_memory.label, prediction.label);
    for (a, b) in in_memory.scores.iter().zip(&prediction.scores) {
        assert!((a - b).abs() < 1e-12);
    }

    Ok(())
}

#[test]
fn test_default_sweep_picks_a_sensible_model() -> Result<()> {
    let records: Vec<Record> = common::sample_rows()
        .into_iter()
        .enumerate()
        .map(|(id, (statement, status))| Record::new(id as i64, statement, status))
        .collect();

    let pipeline = TrainingPipeline::new(TrainingConfig::default())?;
    let outcome = pipeline.train(&records)?;

    assert_eq!(outcome.report.candidates.len(), 35);
    assert_eq!(outcome.report.folds, 5);

    let prediction = outcome.model.predict("panic attack and racing heart, so nervous")?;
    assert_eq!(prediction.label, "Anxiety");
    let prediction = outcome.model.predict("went cycling with friends, great weekend")?;
    assert_eq!(prediction.label, "Normal");

    Ok(())
}

#[test]
fn test_training_is_deterministic() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let data = write_sample_csv(dir.path());
    let records = CsvRecordLoader::new().load(&data)?.records;

    let pipeline = TrainingPipeline::new(small_config(dir.path().join("unused.zip")))?;
    let first = pipeline.train(&records)?;
    let second = pipeline.train(&records)?;

    assert_eq!(first.report.best, second.report.best);
    assert_eq!(first.report.candidates, second.report.candidates);
    let a = first.model.predict("hopeless and empty")?;
    let b = second.model.predict("hopeless and empty")?;
    assert_eq!(a.scores, b.scores);

    Ok(())
}

#[test]
fn test_statements_that_clean_to_nothing() {
    let records = vec![
        Record::new(1, "   ", "Anxiety"),
        Record::new(2, "!!! ???", "Normal"),
        Record::new(3, "https://example.com", "Depression"),
    ];

    let pipeline = TrainingPipeline::new(TrainingConfig::default()).unwrap();
    let err = pipeline.train(&records).unwrap_err();
    assert!(matches!(err, MentalisError::EmptyInput(_)));
}

#[test]
fn test_missing_data_file() {
    let dir = TempDir::new().unwrap();
    let pipeline = TrainingPipeline::new(small_config(dir.path().join("model.zip"))).unwrap();
    assert!(pipeline.run(dir.path().join("missing.csv")).is_err());
    assert!(!dir.path().join("model.zip").exists());
}
