//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - dispatches to training or serving

use std::sync::Arc;

use clap::Parser;
use log::info;

use crate::cli::{Command, ServeArgs, TrainArgs};
use crate::domain::{BinaryPolicy, GridKind, ServeConfig, TrainConfig};
use crate::error::AppError;
use crate::predict::Predictor;

pub mod pipeline;

/// Entry point for the `hdp` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Train(args) => handle_train(&args),
        Command::Serve(args) => handle_serve(&args),
    }
}

fn handle_train(args: &TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(args);
    let run = pipeline::run_training(&config)?;
    println!("{}", crate::report::format_training_summary(&run));
    println!("Model saved to {}", config.output_path.display());
    Ok(())
}

fn handle_serve(args: &ServeArgs) -> Result<(), AppError> {
    let config = serve_config_from_args(args);
    let predictor = Arc::new(Predictor::load(&config.model_path, config.binary_policy)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::server(format!("Failed to start async runtime: {e}")))?;

    let addr = config.bind_addr();
    info!("starting prediction service on {addr}");
    runtime.block_on(crate::server::serve(&addr, predictor))
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        data_path: args.data.clone(),
        data_url: args.data_url.clone(),
        output_path: args.output.clone(),
        report_path: args.report.clone(),
        seed: args.seed,
        test_size: args.test_size,
        val_size: args.val_size,
        folds: args.folds,
        grid: if args.quick { GridKind::Quick } else { GridKind::Full },
    }
}

pub fn serve_config_from_args(args: &ServeArgs) -> ServeConfig {
    ServeConfig {
        model_path: args.model.clone(),
        host: args.host.clone(),
        port: args.port,
        binary_policy: if args.lenient_binary {
            BinaryPolicy::Lenient
        } else {
            BinaryPolicy::Strict
        },
    }
}
