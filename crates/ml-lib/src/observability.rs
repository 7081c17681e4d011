//! Observability infrastructure for the ML service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction counts, training and artifact activity)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter,
    register_int_counter_vec, GaugeVec, HistogramVec, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MlMetricsInner> = OnceLock::new();

struct MlMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions: IntCounterVec,
    training_runs: IntCounterVec,
    artifact_loads: IntCounterVec,
    artifact_fallbacks: IntCounterVec,
    prediction_errors: IntCounterVec,
    flagged_contributors: IntCounter,
    model_info: GaugeVec,
}

impl MlMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "repopulse_ml_prediction_latency_seconds",
                "Time spent scoring a batch of feature rows",
                &["model"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter_vec!(
                "repopulse_ml_predictions_total",
                "Total number of feature rows scored",
                &["model"]
            )
            .expect("Failed to register predictions_total"),

            training_runs: register_int_counter_vec!(
                "repopulse_ml_training_runs_total",
                "Total number of synthetic training runs",
                &["model"]
            )
            .expect("Failed to register training_runs_total"),

            artifact_loads: register_int_counter_vec!(
                "repopulse_ml_artifact_loads_total",
                "Total number of models adopted from persisted artifacts",
                &["model"]
            )
            .expect("Failed to register artifact_loads_total"),

            artifact_fallbacks: register_int_counter_vec!(
                "repopulse_ml_artifact_fallbacks_total",
                "Total number of unreadable artifacts replaced by training",
                &["model"]
            )
            .expect("Failed to register artifact_fallbacks_total"),

            prediction_errors: register_int_counter_vec!(
                "repopulse_ml_prediction_errors_total",
                "Total number of failed prediction requests",
                &["model"]
            )
            .expect("Failed to register prediction_errors_total"),

            flagged_contributors: register_int_counter!(
                "repopulse_ml_flagged_contributors_total",
                "Total number of contributors flagged as anomalous"
            )
            .expect("Failed to register flagged_contributors_total"),

            model_info: register_gauge_vec!(
                "repopulse_ml_model_info",
                "Readiness of each model (1 = ready)",
                &["model", "model_type"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// ML metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct MlMetrics {
    _private: (),
}

impl Default for MlMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MlMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MlMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MlMetricsInner {
        GLOBAL_METRICS.get_or_init(MlMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, model: &str, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
    }

    pub fn inc_predictions(&self, model: &str, rows: u64) {
        self.inner()
            .predictions
            .with_label_values(&[model])
            .inc_by(rows);
    }

    pub fn inc_training_runs(&self, model: &str) {
        self.inner().training_runs.with_label_values(&[model]).inc();
    }

    pub fn inc_artifact_loads(&self, model: &str) {
        self.inner().artifact_loads.with_label_values(&[model]).inc();
    }

    pub fn inc_artifact_fallbacks(&self, model: &str) {
        self.inner()
            .artifact_fallbacks
            .with_label_values(&[model])
            .inc();
    }

    pub fn inc_prediction_errors(&self, model: &str) {
        self.inner()
            .prediction_errors
            .with_label_values(&[model])
            .inc();
    }

    pub fn inc_flagged_contributors(&self, count: u64) {
        self.inner().flagged_contributors.inc_by(count);
    }

    /// Record model readiness
    pub fn set_model_ready(&self, model: &str, model_type: &str, ready: bool) {
        self.inner()
            .model_info
            .with_label_values(&[model, model_type])
            .set(if ready { 1.0 } else { 0.0 });
    }
}

/// Structured logger for service events
///
/// Emits event-tagged records so lifecycle and prediction activity can be
/// filtered from the JSON log stream.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_dir: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            model_dir = %model_dir,
            "ML service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "ML service shutting down"
        );
    }

    /// Log a model becoming ready, or failing to
    pub fn log_model_ready(&self, model: &str, outcome: &str, success: bool) {
        if success {
            info!(
                event = "model_ready",
                service = %self.service_name,
                model = %model,
                outcome = %outcome,
                "Model ready"
            );
        } else {
            warn!(
                event = "model_ready",
                service = %self.service_name,
                model = %model,
                outcome = %outcome,
                "Model failed to initialize"
            );
        }
    }

    pub fn log_training(&self, model: &str, trigger: &str) {
        info!(
            event = "model_training",
            service = %self.service_name,
            model = %model,
            trigger = %trigger,
            "Model training requested"
        );
    }

    /// Log a served prediction. `score` is the headline value of the
    /// response (risk score, churn probability or flagged count).
    pub fn log_prediction(&self, model: &str, rows: usize, score: f64, level: &str) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            model = %model,
            rows = rows,
            score = score,
            level = %level,
            "Prediction served"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ml_metrics_creation() {
        let metrics = MlMetrics::new();
        let clone = metrics.clone();

        metrics.observe_prediction_latency("risk_model", 0.002);
        metrics.inc_predictions("risk_model", 3);
        clone.inc_training_runs("churn_model");
        clone.inc_artifact_loads("anomaly_model");
        metrics.inc_artifact_fallbacks("anomaly_model");
        metrics.inc_prediction_errors("risk_model");
        metrics.inc_flagged_contributors(2);
        metrics.set_model_ready("risk_model", "RandomForestClassifier", true);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "repopulse_ml_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-service");
        assert_eq!(logger.service_name, "test-service");
        logger.log_prediction("risk_model", 1, 0.42, "Medium");
    }
}
