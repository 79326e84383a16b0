//! Command-line parsing for the heart-disease risk trainer and service.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! training and serving. Every flag can also be set through an environment
//! variable (a `.env` file is honored).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hdp", version, about = "Heart-disease risk trainer and prediction service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train a random forest on the tabular dataset and write a model bundle.
    Train(TrainArgs),
    /// Load a model bundle and serve predictions over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Input CSV with the eleven clinical fields plus `HeartDisease`.
    #[arg(long, env = "HDP_DATA", default_value = "heart.csv")]
    pub data: PathBuf,

    /// Download the dataset from this URL when `--data` does not exist yet.
    #[arg(long, env = "HDP_DATA_URL")]
    pub data_url: Option<String>,

    /// Where to write the trained model bundle (JSON).
    #[arg(short = 'o', long, env = "HDP_MODEL", default_value = "heart_disease_model.json")]
    pub output: PathBuf,

    /// Seed for splitting, bootstrapping and feature sampling.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Fraction of rows held out as the test set.
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Fraction of the remaining rows used for validation.
    #[arg(long, default_value_t = 0.25)]
    pub val_size: f64,

    /// Cross-validation folds for the grid search.
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Search the reduced grid (useful for smoke runs).
    #[arg(long)]
    pub quick: bool,

    /// Also write the evaluation metrics to this JSON file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Model bundle produced by `hdp train`.
    #[arg(long, env = "HDP_MODEL", default_value = "heart_disease_model.json")]
    pub model: PathBuf,

    #[arg(long, env = "HDP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short = 'p', long, env = "HDP_PORT", default_value_t = 9696)]
    pub port: u16,

    /// Accept any `Sex` / `ExerciseAngina` value (anything but M / N maps to 1).
    #[arg(long, env = "HDP_LENIENT_BINARY")]
    pub lenient_binary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_defaults() {
        let cli = Cli::parse_from(["hdp", "train"]);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.seed, 1);
        assert_eq!(args.folds, 5);
        assert!(!args.quick);
        assert!((args.test_size - 0.2).abs() < 1e-12);
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::parse_from(["hdp", "serve", "--port", "8080", "--lenient-binary"]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert!(args.lenient_binary);
    }
}
