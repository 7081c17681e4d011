//! The three service models, owned together

use super::{AnomalyModel, ChurnModel, InitOutcome, Predictor, RiskModel};
use crate::error::Result;
use crate::models::ModelStatus;
use crate::store::ArtifactStore;
use std::sync::Arc;
use tracing::{error, info};

/// Owns one instance of each model over a shared artifact store
pub struct ModelRegistry {
    risk: RiskModel,
    churn: ChurnModel,
    anomaly: AnomalyModel,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>, seed: u64) -> Self {
        Self {
            risk: RiskModel::new(store.clone(), seed),
            churn: ChurnModel::new(store.clone(), seed),
            anomaly: AnomalyModel::new(store, seed),
        }
    }

    pub fn risk(&self) -> &RiskModel {
        &self.risk
    }

    pub fn churn(&self) -> &ChurnModel {
        &self.churn
    }

    pub fn anomaly(&self) -> &AnomalyModel {
        &self.anomaly
    }

    /// All models, in a fixed order: risk, churn, anomaly
    pub fn models(&self) -> [&dyn Predictor; 3] {
        [&self.risk, &self.churn, &self.anomaly]
    }

    /// Initialize every model. One model failing does not stop the others.
    pub fn initialize_all(&self) -> Vec<(&'static str, Result<InitOutcome>)> {
        self.models()
            .into_iter()
            .map(|model| {
                let outcome = model.initialize();
                match &outcome {
                    Ok(outcome) => info!(model = model.name(), outcome = ?outcome, "Model initialized"),
                    Err(e) => error!(model = model.name(), error = %e, "Model initialization failed"),
                }
                (model.name(), outcome)
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<ModelStatus> {
        self.models().iter().map(|model| model.status()).collect()
    }

    pub fn all_ready(&self) -> bool {
        self.models().iter().all(|model| model.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryArtifactStore;

    #[test]
    fn test_registry_lifecycle() {
        let store = Arc::new(MemoryArtifactStore::new());
        let registry = ModelRegistry::new(store.clone(), 42);
        assert!(!registry.all_ready());
        assert!(registry.statuses().iter().all(|s| !s.ready));

        let outcomes = registry.initialize_all();
        let names: Vec<&str> = outcomes.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["risk_model", "churn_model", "anomaly_model"]);
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, Ok(InitOutcome::Trained))));

        assert!(registry.all_ready());
        assert_eq!(store.save_count(), 3);
        for name in names {
            assert!(store.contains(name));
        }

        // A fresh registry over the same store loads instead of training
        let reloaded = ModelRegistry::new(store.clone(), 42);
        assert!(reloaded
            .initialize_all()
            .iter()
            .all(|(_, outcome)| matches!(outcome, Ok(InitOutcome::Loaded))));
        assert_eq!(store.save_count(), 3);
    }
}
