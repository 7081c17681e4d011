//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// ML service configuration, read from `ML_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Name attached to structured log records
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Seed for synthetic training data and estimators
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_service_name() -> String {
    "repopulse-ml".to_string()
}

/// `PORT` is honored for platforms that inject it
fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8000)
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_seed() -> u64 {
    42
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("ML").try_parsing(true))
    }

    fn from_source(source: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read ML_* environment")?
            .try_deserialize()
            .context("Invalid ML service configuration")
    }
}
