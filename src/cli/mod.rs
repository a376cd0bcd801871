//! Command-line interface
//!
//! - `serve`: the HTTP console
//! - `predict`: classify one set of measurements
//! - `batch`: classify every row of a CSV file
//! - `tune`: submit a grid search and follow it to completion
//! - `models`: list tuned models

pub mod batch;
pub mod models;
pub mod predict;
pub mod serve;
pub mod tune;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Exoplanet classifier console
#[derive(Parser, Debug)]
#[command(name = "exo-classifier")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Classifier backend base URL, overriding the configuration
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP console
    Serve,

    /// Classify one set of measurements
    Predict(predict::PredictArgs),

    /// Classify every row of a CSV file
    Batch(batch::BatchArgs),

    /// Submit a hyperparameter grid search
    Tune(tune::TuneArgs),

    /// List tuned models, newest first
    Models(models::ModelsArgs),
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(ref url) = self.backend_url {
            config.backend.base_url = url.clone();
        }

        if let Command::Batch(ref args) = self.command {
            if let Some(chunk_size) = args.chunk_size {
                config.batch.chunk_size = chunk_size;
            }
        }

        if let Command::Tune(ref args) = self.command {
            if let Some(secs) = args.poll_interval {
                config.tuning.poll_interval_secs = secs;
            }
        }
    }

    pub async fn run(self, config: AppConfig) -> anyhow::Result<()> {
        match self.command {
            Command::Serve => serve::run(config).await,
            Command::Predict(args) => predict::run(args, config).await,
            Command::Batch(args) => batch::run(args, config).await,
            Command::Tune(args) => tune::run(args, config).await,
            Command::Models(args) => models::run(args, config).await,
        }
    }
}

/// Parse a `name=value` argument
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
