//! Command implementations for the Mentalis CLI.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::data::{CsvRecordLoader, TextCleaner};
use crate::error::MentalisError;
use crate::ml::catalog::TrainerCatalog;
use crate::ml::evaluator::Evaluator;
use crate::ml::persistence::ModelPersistence;
use crate::ml::pipeline::TrainingPipeline;

/// Execute a CLI command.
pub fn execute_command(args: MentalisArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, &args),
        Command::Predict(predict_args) => predict(predict_args, &args),
        Command::Candidates(candidates_args) => list_candidates(candidates_args, &args),
    }
}

fn load_config(path: Option<&Path>) -> Result<TrainingConfig> {
    match path {
        Some(path) => TrainingConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(TrainingConfig::default()),
    }
}

/// Run the training pipeline.
fn train(args: &TrainArgs, cli_args: &MentalisArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(folds) = args.folds {
        config.cross_validation.folds = folds;
    }
    if let Some(seed) = args.seed {
        config.data.split_seed = seed;
        config.cross_validation.seed = seed;
        config.trainer.seed = seed;
    }
    if args.no_parallel {
        config.cross_validation.parallel = false;
    }

    let start = Instant::now();
    let pipeline = TrainingPipeline::new(config)?;
    let outcome = pipeline
        .run(&args.data)
        .with_context(|| format!("Training on {} failed", args.data.display()))?;
    info!("Training finished in {:.1}s", start.elapsed().as_secs_f64());

    output_result("Training complete", &outcome.report, cli_args)?;
    Ok(())
}

/// Score a saved model on a labelled file.
fn evaluate(args: &EvaluateArgs, cli_args: &MentalisArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let model = ModelPersistence::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;

    let loaded = CsvRecordLoader::from_config(&config.data)
        .load(&args.data)
        .with_context(|| format!("Failed to read {}", args.data.display()))?;
    let cleaned = TextCleaner::new()?.clean_all(&loaded.records);
    if cleaned.is_empty() {
        return Err(MentalisError::empty_input("no usable statements after cleaning").into());
    }

    let metrics = Evaluator::new(config.evaluation.clone()).evaluate(&model, &cleaned)?;

    output_result(
        "Evaluation complete",
        &EvaluationResult {
            model: args.model.clone(),
            trainer: model.trainer().to_string(),
            data: args.data.clone(),
            rows_skipped: loaded.skipped_rows,
            metrics,
        },
        cli_args,
    )?;
    Ok(())
}

/// Classify one statement.
fn predict(args: &PredictArgs, cli_args: &MentalisArgs) -> Result<()> {
    let model = ModelPersistence::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let prediction = model.predict(&args.statement)?;

    let scores = model
        .labels()
        .iter()
        .zip(&prediction.scores)
        .map(|(label, &score)| ClassScore {
            label: label.clone(),
            score,
        })
        .collect();

    output_result(
        "",
        &PredictionResult {
            statement: args.statement.clone(),
            predicted_status: prediction.label,
            scores,
        },
        cli_args,
    )?;
    Ok(())
}

/// List the candidates of a configuration.
fn list_candidates(args: &CandidatesArgs, cli_args: &MentalisArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let candidates = TrainerCatalog::new(config.catalog).candidates();
    output_result("Trainer candidates", &CandidateList { candidates }, cli_args)?;
    Ok(())
}
