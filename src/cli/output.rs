//! Output formatting for CLI commands.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::args::{MentalisArgs, OutputFormat};
use crate::error::Result;
use crate::ml::catalog::TrainerCandidate;
use crate::ml::metrics::Metrics;
use crate::ml::pipeline::TrainingReport;

/// Result structure for the `evaluate` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model: PathBuf,
    pub trainer: String,
    pub data: PathBuf,
    pub rows_skipped: usize,
    pub metrics: Metrics,
}

/// Result structure for the `predict` command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub statement: String,
    pub predicted_status: String,
    /// One entry per class in the model's label order.
    pub scores: Vec<ClassScore>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub score: f64,
}

/// Result structure for the `candidates` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateList {
    pub candidates: Vec<TrainerCandidate>,
}

/// Plain-text rendering of a command result.
pub trait HumanReadable {
    fn render_human(&self) -> String;
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanReadable>(
    message: &str,
    result: &T,
    args: &MentalisArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 && !message.is_empty() {
                println!("{message}");
                println!();
            }
            print!("{}", result.render_human());
        }
        OutputFormat::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn render_metrics(out: &mut String, metrics: &Metrics) {
    let _ = writeln!(out, "  Rows evaluated:      {}", metrics.count);
    let _ = writeln!(out, "  Micro accuracy:      {:.4}", metrics.micro_accuracy);
    let _ = writeln!(out, "  Macro accuracy:      {:.4}", metrics.macro_accuracy);
    let _ = writeln!(out, "  Log-loss:            {:.4}", metrics.log_loss);
    let _ = writeln!(out, "  Log-loss reduction:  {:.4}", metrics.log_loss_reduction);
    let _ = writeln!(
        out,
        "  Top-{} accuracy:      {:.4}",
        metrics.top_k, metrics.top_k_accuracy
    );

    if !metrics.per_class.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {:<24} {:>8} {:>8} {:>8}", "Class", "Support", "Correct", "Recall");
        for class in &metrics.per_class {
            let _ = writeln!(
                out,
                "  {:<24} {:>8} {:>8} {:>8.4}",
                class.label, class.support, class.correct, class.recall
            );
        }
    }
}

impl HumanReadable for TrainingReport {
    fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Rows: {} loaded, {} skipped, {} after cleaning ({} train / {} test)",
            self.rows_loaded, self.rows_skipped, self.rows_cleaned, self.train_rows, self.test_rows
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Candidates ({}-fold cross-validation):", self.folds);
        let width = self
            .candidates
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0)
            .max(9);
        let _ = writeln!(
            out,
            "  {:<width$} {:>8} {:>8} {:>9}",
            "Candidate", "Micro", "Macro", "Log-loss"
        );
        for candidate in &self.candidates {
            let marker = if candidate.name == self.best { "*" } else { " " };
            let _ = writeln!(
                out,
                "{marker} {:<width$} {:>8.4} {:>8.4} {:>9.4}",
                candidate.name,
                candidate.metrics.micro_accuracy,
                candidate.metrics.macro_accuracy,
                candidate.metrics.log_loss
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Best trainer: {}", self.best);

        match &self.test_metrics {
            Some(metrics) => {
                let _ = writeln!(out, "Test set:");
                render_metrics(&mut out, metrics);
            }
            None => {
                let _ = writeln!(out, "Test set: empty, evaluation skipped");
            }
        }

        if let Some(path) = &self.model_path {
            let _ = writeln!(out);
            let _ = writeln!(out, "Model saved to {}", path.display());
        }
        out
    }
}

impl HumanReadable for EvaluationResult {
    fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model:   {} ({})", self.model.display(), self.trainer);
        let _ = writeln!(out, "Data:    {}", self.data.display());
        if self.rows_skipped > 0 {
            let _ = writeln!(out, "Skipped: {} malformed rows", self.rows_skipped);
        }
        render_metrics(&mut out, &self.metrics);
        out
    }
}

impl HumanReadable for PredictionResult {
    fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Predicted status: {}", self.predicted_status);
        for score in &self.scores {
            let _ = writeln!(out, "  {:<24} {:.4}", score.label, score.score);
        }
        out
    }
}

impl HumanReadable for CandidateList {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for candidate in &self.candidates {
            let _ = writeln!(out, "{}", candidate.name);
        }
        let _ = writeln!(out, "{} candidates", self.candidates.len());
        out
    }
}
