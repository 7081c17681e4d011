//! Contributor anomaly model
//!
//! Scores are relative to the batch: raw isolation forest decisions are
//! min-max normalized across the request and inverted so that the most
//! unusual contributor in the batch is closest to 1.

use super::features::ANOMALY_FEATURES;
use super::lifecycle::{InitOutcome, ModelWrapper};
use super::output::{anomaly_scores, normalize_batch, ANOMALY_FLAG, ANOMALY_FLAG_THRESHOLD};
use super::Predictor;
use crate::error::{ModelError, Result};
use crate::estimators::{synthetic, Estimator, IsolationForest, IsolationParams};
use crate::models::{AnomalyReport, ContributorFeatures, FlaggedContributor, ModelStatus};
use crate::store::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
pub struct AnomalyEstimator {
    forest: IsolationForest,
}

impl Estimator for AnomalyEstimator {
    const NAME: &'static str = "anomaly_model";
    const MODEL_TYPE: &'static str = "IsolationForest";
    const N_FEATURES: usize = ANOMALY_FEATURES;

    fn train_synthetic(seed: u64) -> Result<Self> {
        let training = |reason: String| ModelError::Training {
            model: Self::NAME,
            reason,
        };

        let rows = synthetic::anomaly_dataset(seed).map_err(training)?;
        let params = IsolationParams {
            seed,
            ..IsolationParams::default()
        };
        let forest = IsolationForest::fit(&rows, params).map_err(training)?;
        Ok(Self { forest })
    }

    /// Decision function: higher means more normal
    fn raw_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.forest
            .decision_function(rows)
            .map_err(ModelError::Internal)
    }
}

pub struct AnomalyModel {
    wrapper: ModelWrapper<AnomalyEstimator>,
}

impl AnomalyModel {
    pub fn new(store: Arc<dyn ArtifactStore>, seed: u64) -> Self {
        Self {
            wrapper: ModelWrapper::new(store, seed),
        }
    }

    /// Batch-normalized decision scores before inversion (higher = more normal)
    pub fn normalized_scores(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(normalize_batch(&self.wrapper.raw_scores(rows)?))
    }

    /// Rows whose anomaly score exceeds `threshold`
    pub fn flag_anomalies(&self, rows: &[Vec<f64>], threshold: f64) -> Result<Vec<bool>> {
        Ok(self
            .predict(rows)?
            .into_iter()
            .map(|score| score > threshold)
            .collect())
    }

    /// Score a contributor batch and flag the unusual ones.
    ///
    /// An empty batch short-circuits to an empty report.
    pub fn detect(&self, contributors: &[ContributorFeatures]) -> Result<AnomalyReport> {
        if contributors.is_empty() {
            return Ok(AnomalyReport {
                anomaly_scores: Vec::new(),
                flagged_contributors: Vec::new(),
                model_used: AnomalyEstimator::MODEL_TYPE.to_string(),
            });
        }

        let rows: Vec<Vec<f64>> = contributors.iter().map(|c| c.to_vector()).collect();
        let scores = self.predict(&rows)?;

        let flagged_contributors = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score > ANOMALY_FLAG_THRESHOLD)
            .map(|(index, &anomaly_score)| FlaggedContributor {
                index,
                anomaly_score,
                flag: ANOMALY_FLAG.to_string(),
            })
            .collect();

        Ok(AnomalyReport {
            anomaly_scores: scores,
            flagged_contributors,
            model_used: AnomalyEstimator::MODEL_TYPE.to_string(),
        })
    }
}

impl Predictor for AnomalyModel {
    fn name(&self) -> &'static str {
        AnomalyEstimator::NAME
    }

    fn initialize(&self) -> Result<InitOutcome> {
        self.wrapper.initialize()
    }

    /// Anomaly score per row in [0, 1], higher = more anomalous
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(anomaly_scores(&self.wrapper.raw_scores(rows)?))
    }

    fn status(&self) -> ModelStatus {
        self.wrapper.status()
    }
}
