//! Trainable estimators behind the model wrappers

mod forest;
mod isolation;
pub mod synthetic;

pub use forest::{ForestParams, ForestRegressor};
pub use isolation::{IsolationForest, IsolationParams};

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// A persisted, self-bootstrapping estimator.
///
/// Implementors describe one model contract: its artifact key, the fixed
/// number of input features, how to train it from synthetic data and how to
/// turn validated feature rows into raw scores.
pub trait Estimator: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Artifact key and model name
    const NAME: &'static str;

    /// Estimator family reported to callers
    const MODEL_TYPE: &'static str;

    /// Required length of every feature row
    const N_FEATURES: usize;

    /// Train from seeded synthetic data
    fn train_synthetic(seed: u64) -> Result<Self>;

    /// Raw estimator output, one value per row. Rows are already validated.
    fn raw_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}
