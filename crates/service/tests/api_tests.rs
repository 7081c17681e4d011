//! Integration tests for the ML service API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ml_lib::{
    health::{components, HealthRegistry},
    observability::{MlMetrics, StructuredLogger},
    ArtifactStore, MemoryArtifactStore, ModelRegistry, Predictor,
};
use ml_service::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

/// Models are trained once per test binary; synthetic training is slow
fn trained_registry() -> Arc<ModelRegistry> {
    static REGISTRY: OnceLock<Arc<ModelRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
            let registry = Arc::new(ModelRegistry::new(store, 42));
            registry.initialize_all();
            registry
        })
        .clone()
}

async fn state_for(registry: Arc<ModelRegistry>) -> Arc<AppState> {
    Arc::new(AppState::new(
        registry,
        HealthRegistry::for_service().await,
        MlMetrics::new(),
        StructuredLogger::new("test-service"),
    ))
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let state = state_for(trained_registry()).await;
    state.initialize_models().await.unwrap();
    (create_router(state.clone()), state)
}

/// App over models that were never initialized
async fn setup_cold_app() -> (Router, Arc<AppState>) {
    let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
    let state = state_for(Arc::new(ModelRegistry::new(store, 42))).await;
    (create_router(state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn risky_pr() -> Value {
    json!({
        "f1": 7.5, "f2": 15, "f3": 6, "f4": 0,
        "f5": 0.6, "f6": 0.4, "f7": 0.2, "f8": 0.7
    })
}

#[tokio::test]
async fn test_root_banner() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let banner: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(banner["service"], "RepoPulse ML Service");
    assert_eq!(banner["status"], "running");
    assert!(banner["version"].is_string());
}

#[tokio::test]
async fn test_health_is_always_healthy() {
    let (app, _state) = setup_cold_app().await;
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_healthz_lists_components() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    for component in components::MODELS {
        assert_eq!(health["components"][component]["status"], "healthy");
        assert_eq!(health["components"][component]["message"], "already_ready");
    }
    assert_eq!(health["components"]["artifact_store"]["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_unavailable_when_model_unhealthy() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .model_failed(components::CHURN_MODEL, "training failed")
        .await;

    let (status, _) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_after_initialization() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::OK);
    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_readyz_before_initialization() {
    let (app, _state) = setup_cold_app().await;
    let (status, body) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
    assert!(readiness["reason"]
        .as_str()
        .unwrap()
        .starts_with("Models not yet initialized"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _state) = setup_test_app().await;
    let (_, _) = post_json(app.clone(), "/ml/predict-risk", risky_pr()).await;
    let (status, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("repopulse_ml_predictions_total"));
    assert!(text.contains("repopulse_ml_prediction_latency_seconds"));
}

#[tokio::test]
async fn test_list_models() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/ml/models").await;

    assert_eq!(status, StatusCode::OK);
    let models: Value = serde_json::from_slice(&body).unwrap();
    let models = models.as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[0]["name"], "risk_model");
    assert_eq!(models[0]["n_features"], 8);
    assert_eq!(models[1]["model_type"], "RandomForestRegressor");
    assert_eq!(models[2]["model_type"], "IsolationForest");
    assert!(models.iter().all(|m| m["ready"] == true));
}

#[tokio::test]
async fn test_predict_risk_shape() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post_json(app, "/ml/predict-risk", risky_pr()).await;

    assert_eq!(status, StatusCode::OK);
    let score = body["risk_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert!(["Low", "Medium", "High"].contains(&body["risk_level"].as_str().unwrap()));
    assert_eq!(body["confidence"], 0.85);
    assert_eq!(body["model_used"], "RandomForestClassifier");

    let factors = body["top_factors"].as_array().unwrap();
    assert!(!factors.is_empty() && factors.len() <= 3);
    for factor in factors {
        assert!(factor["feature"].is_string());
        assert!(factor["value"].is_number());
        assert!(factor["impact_weight"].is_number());
    }

    let recommendations = body["recommendations"].as_array().unwrap();
    assert!(recommendations.len() >= 7);
    assert!(recommendations[0]
        .as_str()
        .unwrap()
        .starts_with("Consider splitting this PR"));
}

#[tokio::test]
async fn test_predict_risk_missing_feature_is_rejected() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post_json(app, "/ml/predict-risk", json!({ "f1": 1.0, "f2": 2.0 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("missing field `f3`"));
}

#[tokio::test]
async fn test_malformed_body_returns_detail() {
    let (app, _state) = setup_cold_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/predict-churn")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_returns_detail() {
    let (app, _state) = setup_cold_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/detect-anomalies")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Content-Type"));
}

#[tokio::test]
async fn test_predict_risk_before_initialization() {
    let (app, _state) = setup_cold_app().await;
    let (status, body) = post_json(app, "/ml/predict-risk", risky_pr()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "risk_model is not initialized");
}

#[tokio::test]
async fn test_predict_churn_defaults_missing_fields() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post_json(app, "/ml/predict-churn", json!({ "additions": 20 })).await;

    assert_eq!(status, StatusCode::OK);
    let probability = body["churn_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert!(["low", "medium", "high", "critical"].contains(&body["churn_level"].as_str().unwrap()));
    assert_eq!(body["model_used"], "RandomForestRegressor");
}

#[tokio::test]
async fn test_detect_anomalies_empty_batch() {
    let (app, _state) = setup_cold_app().await;
    let (status, body) = post_json(app, "/ml/detect-anomalies", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "anomaly_scores": [],
            "flagged_contributors": [],
            "model_used": "IsolationForest"
        })
    );
}

#[tokio::test]
async fn test_detect_anomalies_flags_outlier() {
    let (app, _state) = setup_test_app().await;
    let payload = json!({
        "features": [
            { "experience_score": 50, "contributions": 48, "rejection_rate": 0.1 },
            { "experience_score": 55, "contributions": 52, "rejection_rate": 0.12 },
            { "experience_score": 2, "contributions": 400, "rejection_rate": 0.95 }
        ]
    });
    let (status, body) = post_json(app, "/ml/detect-anomalies", payload).await;

    assert_eq!(status, StatusCode::OK);
    let scores = body["anomaly_scores"].as_array().unwrap();
    assert_eq!(scores.len(), 3);

    let flagged = body["flagged_contributors"].as_array().unwrap();
    assert!(flagged.iter().any(|f| f["index"] == 2));
    assert!(flagged
        .iter()
        .all(|f| f["flag"] == "Unusual activity pattern"));
}

#[tokio::test]
async fn test_train_risk_model() {
    let (app, state) = setup_cold_app().await;
    let (status, body) = post_json(
        app,
        "/ml/train-risk-model",
        json!({ "repository_id": "repo-123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Risk model trained/loaded");
    assert_eq!(body["model_type"], "RandomForestClassifier");

    // Only the risk model was initialized
    assert!(state.registry.risk().status().ready);
    assert!(!state.registry.all_ready());

    let readiness = state.health_registry.readiness().await;
    assert_eq!(
        readiness.reason.as_deref(),
        Some("Models not yet initialized: anomaly_model, churn_model")
    );
}
