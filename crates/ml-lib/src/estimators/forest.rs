//! Random forest regression ensemble
//!
//! Thin wrapper over smartcore's `RandomForestRegressor` working on row-major
//! `f64` feature rows. Fitted on binary 0/1 labels, the forest's mean leaf
//! value is the fraction of positive training samples in the matched leaves,
//! i.e. the class-1 probability a classification forest would report.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

type SmartForest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Hyperparameters for forest training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: u16,
    pub max_depth: u16,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

/// Trained regression forest
#[derive(Serialize, Deserialize)]
pub struct ForestRegressor {
    forest: SmartForest,
    n_features: usize,
}

impl ForestRegressor {
    /// Fit a forest on `rows` (all of equal width) against `targets`
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: ForestParams) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("no training rows".to_string());
        }
        if rows.len() != targets.len() {
            return Err(format!(
                "{} training rows but {} targets",
                rows.len(),
                targets.len()
            ));
        }

        let n_features = rows[0].len();
        let x = to_matrix(rows, n_features)?;
        let y = targets.to_vec();

        let parameters = RandomForestRegressorParameters::default()
            .with_n_trees(params.n_trees.into())
            .with_max_depth(params.max_depth)
            .with_seed(params.seed);

        let forest = RandomForestRegressor::fit(&x, &y, parameters)
            .map_err(|e| format!("random forest fit failed: {}", e))?;

        Ok(Self { forest, n_features })
    }

    /// Mean prediction of all trees, one value per row
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, String> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = to_matrix(rows, self.n_features)?;
        self.forest
            .predict(&x)
            .map_err(|e| format!("random forest predict failed: {}", e))
    }

    /// Permutation importance of each feature on the given data.
    ///
    /// Importance of a feature is the increase in mean squared error after
    /// shuffling that feature's column. Negative increases are clipped to
    /// zero and the result is normalized to sum to 1 (uniform when no
    /// feature matters).
    pub fn permutation_importance(
        &self,
        rows: &[Vec<f64>],
        targets: &[f64],
        seed: u64,
    ) -> Result<Vec<f64>, String> {
        let baseline = mean_squared_error(&self.predict(rows)?, targets);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut raw = Vec::with_capacity(self.n_features);

        for feature in 0..self.n_features {
            let mut column: Vec<f64> = rows.iter().map(|row| row[feature]).collect();
            column.shuffle(&mut rng);

            let permuted: Vec<Vec<f64>> = rows
                .iter()
                .zip(column)
                .map(|(row, value)| {
                    let mut row = row.clone();
                    row[feature] = value;
                    row
                })
                .collect();

            let error = mean_squared_error(&self.predict(&permuted)?, targets);
            raw.push((error - baseline).max(0.0));
        }

        Ok(normalize_importances(raw))
    }
}

fn to_matrix(rows: &[Vec<f64>], n_features: usize) -> Result<DenseMatrix<f64>, String> {
    let mut values = Vec::with_capacity(rows.len() * n_features);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_features {
            return Err(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                n_features
            ));
        }
        values.extend_from_slice(row);
    }
    Ok(DenseMatrix::new(rows.len(), n_features, values, false))
}

fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

fn normalize_importances(raw: Vec<f64>) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.into_iter().map(|v| v / total).collect()
    } else {
        let n = raw.len().max(1) as f64;
        vec![1.0 / n; raw.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Target depends only on the first of three features
    fn step_dataset(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(7);
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|_| (0..3).map(|_| rng.gen_range(0.0..10.0)).collect())
            .collect();
        let targets = rows
            .iter()
            .map(|row| if row[0] > 5.0 { 1.0 } else { 0.0 })
            .collect();
        (rows, targets)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            max_depth: 6,
            seed: 42,
        }
    }

    #[test]
    fn test_forest_learns_step() {
        let (rows, targets) = step_dataset(200);
        let forest = ForestRegressor::fit(&rows, &targets, small_params()).unwrap();

        let predictions = forest
            .predict(&[vec![9.0, 5.0, 5.0], vec![1.0, 5.0, 5.0]])
            .unwrap();
        assert!(predictions[0] > predictions[1]);
        assert!(predictions.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_importance_favours_informative_feature() {
        let (rows, targets) = step_dataset(200);
        let forest = ForestRegressor::fit(&rows, &targets, small_params()).unwrap();

        let importances = forest.permutation_importance(&rows, &targets, 1).unwrap();
        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
        assert!(importances[0] > importances[2]);
    }

    #[test]
    fn test_fit_rejects_mismatched_targets() {
        let (rows, _) = step_dataset(10);
        assert!(ForestRegressor::fit(&rows, &[1.0], small_params()).is_err());
        assert!(ForestRegressor::fit(&[], &[], small_params()).is_err());
    }

    #[test]
    fn test_predict_rejects_ragged_rows() {
        let (rows, targets) = step_dataset(50);
        let forest = ForestRegressor::fit(&rows, &targets, small_params()).unwrap();
        assert!(forest.predict(&[vec![1.0, 2.0]]).is_err());
        assert!(forest.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_uniform_importance_when_nothing_matters() {
        assert_eq!(normalize_importances(vec![0.0, 0.0]), vec![0.5, 0.5]);
    }
}
