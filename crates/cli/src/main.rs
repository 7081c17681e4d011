//! RepoPulse CLI
//!
//! Command-line client for the RepoPulse ML service: score pull requests,
//! estimate file churn, screen contributors for anomalies and inspect
//! model status.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{models, predict};
use std::path::PathBuf;

/// RepoPulse CLI
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author, version, about = "CLI for the RepoPulse ML Service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via PULSE_API_URL env var)
    #[arg(long, env = "PULSE_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score the risk of a pull request
    Risk(predict::RiskArgs),

    /// Estimate the churn probability of a file
    Churn(predict::ChurnArgs),

    /// Screen a batch of contributors for unusual activity
    Anomalies {
        /// JSON file with contributor features, either an array or {"features": [...]}
        #[arg(long)]
        file: PathBuf,
    },

    /// Load or train the risk model on the service
    TrainRisk {
        /// Repository the training run is attributed to
        #[arg(long)]
        repository_id: Option<String>,
    },

    /// List models and their readiness
    Models,

    /// Show service liveness and readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Risk(args) => predict::predict_risk(&client, args, cli.format).await?,
        Commands::Churn(args) => predict::predict_churn(&client, args, cli.format).await?,
        Commands::Anomalies { file } => {
            predict::detect_anomalies(&client, &file, cli.format).await?;
        }
        Commands::TrainRisk { repository_id } => {
            models::train_risk(&client, repository_id, cli.format).await?;
        }
        Commands::Models => models::list_models(&client, cli.format).await?,
        Commands::Health => models::show_health(&client, cli.format).await?,
    }

    Ok(())
}
