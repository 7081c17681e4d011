//! Pull request risk model
//!
//! A regression forest fitted on 0/1 risk labels: the averaged leaf values
//! are the probability of the high-risk class. Global feature importances
//! are computed once at training time and persisted with the forest so
//! explanations stay stable across restarts.

use super::explain::rank_factors;
use super::features::RISK_FEATURES;
use super::lifecycle::{InitOutcome, ModelWrapper};
use super::output::{clip_unit, RISK_CONFIDENCE};
use super::{recommendations, Predictor};
use crate::error::{ModelError, Result};
use crate::estimators::{synthetic, Estimator, ForestParams, ForestRegressor};
use crate::models::{FactorImpact, ModelStatus, RiskFeatures, RiskLevel, RiskPrediction, TopFactor};
use crate::store::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trained risk forest plus its global importances
#[derive(Serialize, Deserialize)]
pub struct RiskEstimator {
    forest: ForestRegressor,
    importances: Vec<f64>,
}

impl RiskEstimator {
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

impl Estimator for RiskEstimator {
    const NAME: &'static str = "risk_model";
    const MODEL_TYPE: &'static str = "RandomForestClassifier";
    const N_FEATURES: usize = RISK_FEATURES;

    fn train_synthetic(seed: u64) -> Result<Self> {
        let training = |reason: String| ModelError::Training {
            model: Self::NAME,
            reason,
        };

        let (rows, labels) = synthetic::risk_dataset(seed);
        let params = ForestParams {
            seed,
            ..ForestParams::default()
        };
        let forest = ForestRegressor::fit(&rows, &labels, params).map_err(training)?;
        let importances = forest
            .permutation_importance(&rows, &labels, seed)
            .map_err(training)?;

        Ok(Self {
            forest,
            importances,
        })
    }

    fn raw_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.forest.predict(rows).map_err(ModelError::Internal)
    }
}

/// Risk model: probability that a PR is high risk, with explanation
pub struct RiskModel {
    wrapper: ModelWrapper<RiskEstimator>,
}

impl RiskModel {
    pub fn new(store: Arc<dyn ArtifactStore>, seed: u64) -> Self {
        Self {
            wrapper: ModelWrapper::new(store, seed),
        }
    }

    /// Top contributing factors for a single feature row
    pub fn feature_importance(&self, row: &[f64]) -> Result<Vec<FactorImpact>> {
        let estimator = self.wrapper.estimator()?;
        self.wrapper.validate_row(row)?;
        Ok(rank_factors(estimator.importances(), row))
    }

    pub fn risk_level(&self, score: f64) -> RiskLevel {
        RiskLevel::from_score(score)
    }

    /// Score, explain and advise on one PR
    pub fn assess(&self, features: &RiskFeatures) -> Result<RiskPrediction> {
        let row = features.to_vector();
        let risk_score = self
            .predict(std::slice::from_ref(&row))?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Internal("risk model returned no score".to_string()))?;

        let factors = self.feature_importance(&row)?;
        let recommendations = recommendations::generate(features, risk_score, &factors);

        Ok(RiskPrediction {
            risk_score,
            risk_level: self.risk_level(risk_score),
            confidence: RISK_CONFIDENCE,
            model_used: RiskEstimator::MODEL_TYPE.to_string(),
            top_factors: factors.iter().map(TopFactor::from).collect(),
            recommendations,
        })
    }
}

impl Predictor for RiskModel {
    fn name(&self) -> &'static str {
        RiskEstimator::NAME
    }

    fn initialize(&self) -> Result<InitOutcome> {
        self.wrapper.initialize()
    }

    /// Probability of the high-risk class per row
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
