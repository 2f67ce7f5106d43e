//! Command line argument parsing for the Mentalis CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Mentalis - train and run a mental-health statement classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "mentalis")]
#[command(about = "Train, evaluate and run a mental-health statement classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct MentalisArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl MentalisArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the full training pipeline and save the best model
    Train(TrainArgs),

    /// Score a saved model on a labelled CSV file
    Evaluate(EvaluateArgs),

    /// Classify a single statement
    Predict(PredictArgs),

    /// List the trainer candidates a configuration would sweep
    Candidates(CandidatesArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Labelled input file (Id, Statement, Status)
    #[arg(value_name = "DATA_CSV")]
    pub data: PathBuf,

    /// Where to write the model (default: Data/MentalHealthModel.zip)
    #[arg(short, long, value_name = "MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "MENTALIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Seed for the split, the folds and the stochastic solvers
    #[arg(long)]
    pub seed: Option<u64>,

    /// Evaluate candidates one at a time
    #[arg(long)]
    pub no_parallel: bool,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Saved model
    #[arg(value_name = "MODEL_PATH")]
    pub model: PathBuf,

    /// Labelled input file
    #[arg(value_name = "DATA_CSV")]
    pub data: PathBuf,

    /// Training configuration file (JSON), for CSV columns and top-K
    #[arg(short, long, value_name = "CONFIG_FILE", env = "MENTALIS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Saved model
    #[arg(value_name = "MODEL_PATH")]
    pub model: PathBuf,

    /// Statement to classify
    #[arg(value_name = "STATEMENT")]
    pub statement: String,
}

/// Arguments for listing candidates
#[derive(Parser, Debug, Clone)]
pub struct CandidatesArgs {
    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "MENTALIS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    Human,
    /// JSON
    Json,
}
