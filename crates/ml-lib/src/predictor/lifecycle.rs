//! Load-or-train lifecycle shared by every model
//!
//! A `ModelWrapper` starts empty. `initialize` runs at most one
//! load-or-train pass: concurrent callers are serialized on an init mutex and
//! the result is published through a `OnceLock`, so steady-state predictions
//! read the estimator without locking.

use crate::error::{ModelError, Result};
use crate::estimators::Estimator;
use crate::models::{ModelSource, ModelStatus};
use crate::observability::MlMetrics;
use crate::store::{Artifact, ArtifactStore};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of an `initialize` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call adopted a persisted artifact
    Loaded,
    /// This call trained from synthetic data
    Trained,
    /// An earlier call already made the model ready
    AlreadyReady,
}

struct ReadyModel<E> {
    estimator: E,
    source: ModelSource,
}

/// Owns one estimator slot and its one-time initialization
pub struct ModelWrapper<E: Estimator> {
    store: Arc<dyn ArtifactStore>,
    seed: u64,
    ready: OnceLock<ReadyModel<E>>,
    init_lock: Mutex<()>,
    metrics: MlMetrics,
}

impl<E: Estimator> ModelWrapper<E> {
    pub fn new(store: Arc<dyn ArtifactStore>, seed: u64) -> Self {
        Self {
            store,
            seed,
            ready: OnceLock::new(),
            init_lock: Mutex::new(()),
            metrics: MlMetrics::new(),
        }
    }

    /// Make the estimator ready: adopt the persisted artifact if it decodes,
    /// otherwise train synthetically and persist the result.
    pub fn initialize(&self) -> Result<InitOutcome> {
        if self.ready.get().is_some() {
            return Ok(InitOutcome::AlreadyReady);
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|e| ModelError::Internal(format!("{} init lock poisoned: {}", E::NAME, e)))?;

        // Another caller may have finished while we waited
        if self.ready.get().is_some() {
            return Ok(InitOutcome::AlreadyReady);
        }

        let ready = match self.load_artifact() {
            Ok(Some(estimator)) => {
                self.metrics.inc_artifact_loads(E::NAME);
                info!(model = E::NAME, store = %self.store.describe(), "Loaded persisted model");
                ReadyModel {
                    estimator,
                    source: ModelSource::Loaded,
                }
            }
            Ok(None) => self.train_and_persist()?,
            Err(e) => {
                self.metrics.inc_artifact_fallbacks(E::NAME);
                warn!(
                    event = "artifact_fallback",
                    model = E::NAME,
                    error = %e,
                    "Could not load model, training a new one"
                );
                self.train_and_persist()?
            }
        };

        let outcome = match ready.source {
            ModelSource::Loaded => InitOutcome::Loaded,
            ModelSource::Trained => InitOutcome::Trained,
        };

        if self.ready.set(ready).is_err() {
            return Err(ModelError::Internal(format!(
                "{} initialized twice despite init lock",
                E::NAME
            )));
        }

        self.metrics.set_model_ready(E::NAME, E::MODEL_TYPE, true);
        Ok(outcome)
    }

    fn load_artifact(&self) -> Result<Option<E>> {
        let artifact = self.store.load(E::NAME).map_err(|e| ModelError::ArtifactLoad {
            model: E::NAME,
            reason: e.to_string(),
        })?;

        match artifact {
            Some(artifact) => {
                let estimator = artifact.decode(E::NAME).map_err(|e| ModelError::ArtifactLoad {
                    model: E::NAME,
                    reason: e.to_string(),
                })?;
                Ok(Some(estimator))
            }
            None => Ok(None),
        }
    }

    fn train_and_persist(&self) -> Result<ReadyModel<E>> {
        let start = Instant::now();
        info!(
            event = "model_training",
            model = E::NAME,
            seed = self.seed,
            "Training model with synthetic data"
        );

        let estimator = E::train_synthetic(self.seed)?;
        self.metrics.inc_training_runs(E::NAME);
        info!(
            model = E::NAME,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained new model with synthetic data"
        );

        // The trained estimator stays usable even when it cannot be persisted
        match Artifact::encode(E::NAME, E::MODEL_TYPE, &estimator)
            .and_then(|artifact| self.store.save(E::NAME, &artifact))
        {
            Ok(()) => debug!(model = E::NAME, "Persisted trained model"),
            Err(e) => warn!(model = E::NAME, error = %e, "Failed to persist trained model"),
        }

        Ok(ReadyModel {
            estimator,
            source: ModelSource::Trained,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    pub fn source(&self) -> Option<ModelSource> {
        self.ready.get().map(|ready| ready.source)
    }

    /// The ready estimator, or `NotInitialized`
    pub fn estimator(&self) -> Result<&E> {
        self.ready
            .get()
            .map(|ready| &ready.estimator)
            .ok_or(ModelError::NotInitialized { model: E::NAME })
    }

    /// Check one row against the model's arity
    pub fn validate_row(&self, row: &[f64]) -> Result<()> {
        if row.len() == E::N_FEATURES {
            Ok(())
        } else {
            Err(ModelError::InvalidInput {
                model: E::NAME,
                expected: E::N_FEATURES,
                actual: row.len(),
            })
        }
    }

    /// Check every row against the model's arity
    pub fn validate(&self, rows: &[Vec<f64>]) -> Result<()> {
        rows.iter().try_for_each(|row| self.validate_row(row))
    }

    /// Raw estimator scores for validated rows
    pub fn raw_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let estimator = self.estimator()?;
        self.validate(rows)?;

        let start = Instant::now();
        let scores = estimator.raw_scores(rows)?;
        self.metrics
            .observe_prediction_latency(E::NAME, start.elapsed().as_secs_f64());
        self.metrics.inc_predictions(E::NAME, rows.len() as u64);
        Ok(scores)
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            name: E::NAME.to_string(),
            model_type: E::MODEL_TYPE.to_string(),
            ready: self.is_ready(),
            source: self.source(),
            n_features: E::N_FEATURES,
        }
    }
}
