//! File churn model

use super::features::CHURN_FEATURES;
use super::lifecycle::{InitOutcome, ModelWrapper};
use super::output::clip_unit;
use super::Predictor;
use crate::error::{ModelError, Result};
use crate::estimators::{synthetic, Estimator, ForestParams, ForestRegressor};
use crate::models::{ChurnLevel, ChurnPrediction, FileFeatures, ModelStatus};
use crate::store::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
pub struct ChurnEstimator {
    forest: ForestRegressor,
}

impl Estimator for ChurnEstimator {
    const NAME: &'static str = "churn_model";
    const MODEL_TYPE: &'static str = "RandomForestRegressor";
    const N_FEATURES: usize = CHURN_FEATURES;

    fn train_synthetic(seed: u64) -> Result<Self> {
        let (rows, targets) = synthetic::churn_dataset(seed);
        let params = ForestParams {
            seed,
            ..ForestParams::default()
        };
        let forest =
            ForestRegressor::fit(&rows, &targets, params).map_err(|reason| ModelError::Training {
                model: Self::NAME,
                reason,
            })?;
        Ok(Self { forest })
    }

    fn raw_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.forest.predict(rows).map_err(ModelError::Internal)
    }
}

/// Churn model: probability that a file keeps changing
pub struct ChurnModel {
    wrapper: ModelWrapper<ChurnEstimator>,
}

impl ChurnModel {
    pub fn new(store: Arc<dyn ArtifactStore>, seed: u64) -> Self {
        Self {
            wrapper: ModelWrapper::new(store, seed),
        }
    }

    pub fn churn_level(&self, probability: f64) -> ChurnLevel {
        ChurnLevel::from_score(probability)
    }

    pub fn assess(&self, features: &FileFeatures) -> Result<ChurnPrediction> {
        let churn_probability = self
            .predict(&[features.to_vector()])?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Internal("churn model returned no score".to_string()))?;

        Ok(ChurnPrediction {
            churn_probability,
            churn_level: self.churn_level(churn_probability),
            model_used: ChurnEstimator::MODEL_TYPE.to_string(),
        })
    }
}

impl Predictor for ChurnModel {
    fn name(&self) -> &'static str {
        ChurnEstimator::NAME
    }

    fn initialize(&self) -> Result<InitOutcome> {
        self.wrapper.initialize()
    }

    /// Churn probability per row, clipped to [0, 1]
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self
            .wrapper
            .raw_scores(rows)?
            .into_iter()
            .map(clip_unit)
            .collect())
    }

    fn status(&self) -> ModelStatus {
        self.wrapper.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryArtifactStore;

    fn trained() -> ChurnModel {
        let model = ChurnModel::new(Arc::new(MemoryArtifactStore::new()), 42);
        model.initialize().unwrap();
        model
    }

    #[test]
    fn test_churn_tracks_activity() {
        let model = trained();
        let busy = FileFeatures {
            additions: 950.0,
            deletions: 900.0,
            modifications: 48.0,
            churn_history: 190.0,
        };
        let quiet = FileFeatures {
            additions: 10.0,
            deletions: 5.0,
            modifications: 1.0,
            churn_history: 3.0,
        };

        let busy = model.assess(&busy).unwrap();
        let quiet = model.assess(&quiet).unwrap();
        assert!(busy.churn_probability > quiet.churn_probability);
        assert_eq!(quiet.churn_level, ChurnLevel::Low);
        assert_eq!(busy.model_used, "RandomForestRegressor");
        assert!((0.0..=1.0).contains(&busy.churn_probability));
    }

    #[test]
    fn test_all_zero_file_is_valid_input() {
        let prediction = trained().assess(&FileFeatures::default()).unwrap();
        assert!((0.0..=1.0).contains(&prediction.churn_probability));
        assert_eq!(
            prediction.churn_level,
            ChurnLevel::from_score(prediction.churn_probability)
        );
    }

    #[test]
    fn test_wrong_arity() {
        let err = trained().predict(&[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidInput {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_status_before_and_after() {
        let model = ChurnModel::new(Arc::new(MemoryArtifactStore::new()), 42);
        assert!(!model.is_ready());
        model.initialize().unwrap();
        let status = model.status();
        assert!(status.ready);
        assert_eq!(status.name, "churn_model");
        assert_eq!(status.n_features, 4);
    }
}
