//! `heart-risk` library crate.
//!
//! The binary (`hdp`) is a thin wrapper around this library so that:
//!
//! - training and scoring are testable without spawning processes
//! - the trainer and the HTTP service share one feature pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod predict;
pub mod report;
pub mod server;
