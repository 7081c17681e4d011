//! ML library for repository analytics
//!
//! This crate provides:
//! - PR risk, file churn and contributor anomaly models
//! - Explanations and review recommendations for risk predictions
//! - Versioned artifact storage for trained estimators
//! - Health checks and observability

pub mod error;
pub mod estimators;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;

pub use error::{ModelError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MlMetrics, StructuredLogger};
pub use predictor::{
    AnomalyModel, ChurnModel, InitOutcome, ModelRegistry, Predictor, RiskModel,
};
pub use store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore, StoreError};
