//! HTTP API for predictions, model status, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ml_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{MlMetrics, StructuredLogger},
    AnomalyReport, AnomalyRequest, ChurnPrediction, FileFeatures, InitOutcome, ModelError,
    ModelRegistry, ModelStatus, Predictor, RiskFeatures, RiskPrediction, TrainRequest,
    TrainResponse,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

pub const SERVICE_NAME: &str = "RepoPulse ML Service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub health_registry: HealthRegistry,
    pub metrics: MlMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        registry: Arc<ModelRegistry>,
        health_registry: HealthRegistry,
        metrics: MlMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            registry,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Initialize every model off the async runtime, then publish component
    /// health and readiness
    pub async fn initialize_models(&self) -> anyhow::Result<()> {
        let registry = self.registry.clone();
        let outcomes = tokio::task::spawn_blocking(move || registry.initialize_all()).await?;

        for (model, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    self.logger
                        .log_model_ready(model, outcome_label(outcome), true);
                    self.health_registry
                        .model_ready(model, outcome_label(outcome))
                        .await;
                }
                Err(e) => {
                    self.logger.log_model_ready(model, &e.to_string(), false);
                    self.health_registry.model_failed(model, e.to_string()).await;
                }
            }
        }

        Ok(())
    }
}

fn outcome_label(outcome: InitOutcome) -> &'static str {
    match outcome {
        InitOutcome::Loaded => "loaded",
        InitOutcome::Trained => "trained",
        InitOutcome::AlreadyReady => "already_ready",
    }
}

/// Error response carrying `{"detail": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        let status = match err {
            ModelError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ModelError::NotInitialized { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Run CPU-bound model work on the blocking pool, counting failures
/// against `model`
async fn run_model<T, F>(state: &AppState, model: &str, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&ModelRegistry) -> ml_lib::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let registry = state.registry.clone();
    let result = tokio::task::spawn_blocking(move || work(&*registry))
        .await
        .map_err(|e| ApiError::internal(format!("prediction task failed: {}", e)))?;

    result.map_err(|e| {
        state.metrics.inc_prediction_errors(model);
        error!(model = %model, error = %e, "Prediction failed");
        ApiError::from(e)
    })
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "status": "running",
    }))
}

/// Plain liveness, independent of model state
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Component health - 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness - 200 once every model is initialized and healthy, 503 otherwise
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ApiError::internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelStatus>> {
    Json(state.registry.statuses())
}

async fn predict_risk(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RiskFeatures>, JsonRejection>,
) -> Result<Json<RiskPrediction>, ApiError> {
    let Json(features) = payload?;
    let prediction = run_model(&state, "risk_model", move |registry| {
        registry.risk().assess(&features)
    })
    .await?;

    state.logger.log_prediction(
        "risk_model",
        1,
        prediction.risk_score,
        prediction.risk_level.as_str(),
    );
    Ok(Json(prediction))
}

async fn predict_churn(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FileFeatures>, JsonRejection>,
) -> Result<Json<ChurnPrediction>, ApiError> {
    let Json(features) = payload?;
    let prediction = run_model(&state, "churn_model", move |registry| {
        registry.churn().assess(&features)
    })
    .await?;

    state.logger.log_prediction(
        "churn_model",
        1,
        prediction.churn_probability,
        prediction.churn_level.as_str(),
    );
    Ok(Json(prediction))
}

async fn detect_anomalies(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnomalyRequest>, JsonRejection>,
) -> Result<Json<AnomalyReport>, ApiError> {
    let Json(request) = payload?;
    let rows = request.features.len();
    let report = run_model(&state, "anomaly_model", move |registry| {
        registry.anomaly().detect(&request.features)
    })
    .await?;

    let flagged = report.flagged_contributors.len();
    state.metrics.inc_flagged_contributors(flagged as u64);
    state
        .logger
        .log_prediction("anomaly_model", rows, flagged as f64, "flagged");
    Ok(Json(report))
}

/// Explicit trigger for the risk model's load-or-train pass
async fn train_risk_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrainRequest>, JsonRejection>,
) -> Result<Json<TrainResponse>, ApiError> {
    let Json(request) = payload?;
    let trigger = request
        .repository_id
        .as_ref()
        .map(|id| format!("api:{}", id))
        .unwrap_or_else(|| "api".to_string());
    state.logger.log_training("risk_model", &trigger);

    let registry = state.registry.clone();
    let outcome = tokio::task::spawn_blocking(move || registry.risk().initialize())
        .await
        .map_err(|e| ApiError::internal(format!("training task failed: {}", e)))?;

    let outcome = outcome.map_err(|e| {
        error!(model = "risk_model", error = %e, "Risk model training failed");
        ApiError::internal(e.to_string())
    })?;

    info!(model = "risk_model", outcome = outcome_label(outcome), "Risk model ready");
    state
        .health_registry
        .model_ready(components::RISK_MODEL, outcome_label(outcome))
        .await;

    Ok(Json(TrainResponse {
        success: true,
        message: "Risk model trained/loaded".to_string(),
        model_type: state.registry.risk().status().model_type,
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/ml/models", get(list_models))
        .route("/ml/predict-risk", post(predict_risk))
        .route("/ml/predict-churn", post(predict_churn))
        .route("/ml/detect-anomalies", post(detect_anomalies))
        .route("/ml/train-risk-model", post(train_risk_model))
        .with_state(state)
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_map_to_status_codes() {
        let invalid: ApiError = ModelError::InvalidInput {
            model: "risk_model",
            expected: 8,
            actual: 7,
        }
        .into();
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(invalid.detail.contains("expected 8"));

        let not_ready: ApiError = ModelError::NotInitialized {
            model: "churn_model",
        }
        .into();
        assert_eq!(not_ready.status, StatusCode::SERVICE_UNAVAILABLE);

        let training: ApiError = ModelError::Training {
            model: "anomaly_model",
            reason: "no rows".to_string(),
        }
        .into();
        assert_eq!(training.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(InitOutcome::Trained), "trained");
        assert_eq!(outcome_label(InitOutcome::AlreadyReady), "already_ready");
    }
}
