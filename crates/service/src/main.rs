//! ML Service - repository analytics models over HTTP
//!
//! Loads or trains the risk, churn and anomaly models at startup, then
//! serves predictions alongside health and metrics endpoints.

use anyhow::{Context, Result};
use ml_lib::{
    health::{components, HealthRegistry},
    observability::{MlMetrics, StructuredLogger},
    ArtifactStore, FsArtifactStore, ModelRegistry,
};
use ml_service::{api, config};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting ml-service");

    let config = config::ServiceConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.port,
        model_dir = %config.model_dir.display(),
        seed = config.seed,
        "Service configured"
    );

    let health_registry = HealthRegistry::for_service().await;

    // Trained models are not persisted while the directory is unusable
    if let Err(e) = std::fs::create_dir_all(&config.model_dir) {
        warn!(model_dir = %config.model_dir.display(), error = %e, "Model directory unavailable");
        health_registry
            .set_degraded(components::ARTIFACT_STORE, format!("model directory unavailable: {}", e))
            .await;
    }

    let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(&config.model_dir));
    let registry = Arc::new(ModelRegistry::new(store, config.seed));

    let metrics = MlMetrics::new();
    let logger = StructuredLogger::new(&config.service_name);
    logger.log_startup(api::SERVICE_VERSION, &config.model_dir.display().to_string());

    let app_state = Arc::new(api::AppState::new(
        registry,
        health_registry,
        metrics,
        logger.clone(),
    ));

    app_state
        .initialize_models()
        .await
        .context("Model initialization task failed")?;

    let shutdown_logger = logger.clone();
    api::serve(config.port, app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
