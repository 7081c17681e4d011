//! Component health and readiness for the ML service
//!
//! Models start out pending and are reported as degraded until their
//! load-or-train pass finishes. The service is ready once no model is
//! pending and no component is unhealthy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Usable, but pending or impaired
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        !matches!(self, ComponentStatus::Unhealthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix timestamp of the last status change
    pub updated_at: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Body of `GET /healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Body of `GET /readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const RISK_MODEL: &str = "risk_model";
    pub const CHURN_MODEL: &str = "churn_model";
    pub const ANOMALY_MODEL: &str = "anomaly_model";
    pub const ARTIFACT_STORE: &str = "artifact_store";

    pub const MODELS: [&str; 3] = [RISK_MODEL, CHURN_MODEL, ANOMALY_MODEL];
}

#[derive(Debug, Default)]
struct State {
    components: BTreeMap<String, ComponentHealth>,
    pending_models: BTreeSet<String>,
}

/// Shared registry of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<State>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry tracking the three models and the artifact store
    pub async fn for_service() -> Self {
        let registry = Self::new();
        for model in components::MODELS {
            registry.register_model(model).await;
        }
        registry.register(components::ARTIFACT_STORE).await;
        registry
    }

    /// Track a supporting component, initially healthy
    pub async fn register(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    /// Track a model, pending until [`Self::model_ready`]
    pub async fn register_model(&self, name: &str) {
        let mut state = self.state.write().await;
        state.pending_models.insert(name.to_string());
        state.components.insert(
            name.to_string(),
            ComponentHealth::new(
                ComponentStatus::Degraded,
                Some("awaiting initialization".to_string()),
            ),
        );
    }

    /// Record a finished load-or-train pass; `detail` says how it finished
    pub async fn model_ready(&self, name: &str, detail: &str) {
        let mut state = self.state.write().await;
        state.pending_models.remove(name);
        state.components.insert(
            name.to_string(),
            ComponentHealth::new(ComponentStatus::Healthy, Some(detail.to_string())),
        );
    }

    /// Record a failed load-or-train pass; the model stays pending
    pub async fn model_failed(&self, name: &str, reason: impl Into<String>) {
        self.set(name, ComponentStatus::Unhealthy, Some(reason.into()))
            .await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.set(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    async fn set(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        let mut state = self.state.write().await;
        state
            .components
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }

    /// Worst status across components; healthy when there are none
    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        let status = state
            .components
            .values()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy);

        HealthResponse {
            status,
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        let unhealthy: Vec<&str> = state
            .components
            .iter()
            .filter(|(_, health)| health.status == ComponentStatus::Unhealthy)
            .map(|(name, _)| name.as_str())
            .collect();

        let reason = if !unhealthy.is_empty() {
            Some(format!("Critical component unhealthy: {}", unhealthy.join(", ")))
        } else if !state.pending_models.is_empty() {
            let pending: Vec<&str> = state.pending_models.iter().map(String::as_str).collect();
            Some(format!("Models not yet initialized: {}", pending.join(", ")))
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}
