//! ML prediction engine

mod anomaly;
mod churn;
mod explain;
pub mod features;
mod lifecycle;
pub mod output;
pub mod recommendations;
mod registry;
mod risk;

pub use anomaly::{AnomalyEstimator, AnomalyModel};
pub use churn::{ChurnEstimator, ChurnModel};
pub use explain::{rank_factors, TOP_FACTORS};
pub use lifecycle::{InitOutcome, ModelWrapper};
pub use registry::ModelRegistry;
pub use risk::{RiskEstimator, RiskModel};

use crate::error::Result;
use crate::models::ModelStatus;

/// Lifecycle and batch scoring shared by the three models
pub trait Predictor: Send + Sync {
    /// Model name, also its artifact key
    fn name(&self) -> &'static str;

    /// Load or train the estimator; idempotent
    fn initialize(&self) -> Result<InitOutcome>;

    /// Score validated feature rows, one value per row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    fn status(&self) -> ModelStatus;

    fn is_ready(&self) -> bool {
        self.status().ready
    }
}
