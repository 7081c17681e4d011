//! Seeded synthetic training data
//!
//! Used only when no usable artifact exists, so the service can bootstrap
//! without historical repository data. Each generator is deterministic for a
//! given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Rows in the risk and churn training sets
pub const TABULAR_SAMPLES: usize = 500;

/// Rows in the anomaly training set
pub const ANOMALY_SAMPLES: usize = 200;

/// Share of anomaly training rows drawn from the outlier cluster
pub const OUTLIER_FRACTION: f64 = 0.1;

/// Per-feature scale of the uniform risk features (f1..f8)
const RISK_SCALES: [f64; 8] = [10.0, 20.0, 10.0, 10.0, 1.0, 1.0, 100.0, 1.0];

/// Weighted risk indicator sum needed for a high-risk label
const RISK_LABEL_THRESHOLD: f64 = 0.5;

const NORMAL_MEAN: [f64; 3] = [50.0, 50.0, 0.1];
const NORMAL_COV: [[f64; 3]; 3] = [[400.0, 100.0, 0.05], [100.0, 400.0, 0.05], [0.05, 0.05, 0.02]];
const OUTLIER_MEAN: [f64; 3] = [5.0, 200.0, 0.8];
const OUTLIER_COV: [[f64; 3]; 3] = [[10.0, 20.0, 0.01], [20.0, 100.0, 0.01], [0.01, 0.01, 0.01]];

/// PR risk rows `[f1..f8]` with binary labels.
///
/// A row is high risk (1.0) when the weighted sum of the risk indicators
/// (large diff, many files, high rejection rate, low experience) reaches
/// [`RISK_LABEL_THRESHOLD`].
pub fn risk_dataset(seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..TABULAR_SAMPLES)
        .map(|_| RISK_SCALES.iter().map(|scale| rng.gen::<f64>() * scale).collect())
        .collect();
    let labels = rows.iter().map(|row| risk_label(row)).collect();
    (rows, labels)
}

fn risk_label(row: &[f64]) -> f64 {
    let indicator = |hit: bool, weight: f64| if hit { weight } else { 0.0 };
    let score = indicator(row[0] > 5.0, 0.3)
        + indicator(row[1] > 10.0, 0.2)
        + indicator(row[5] > 0.3, 0.3)
        + indicator(row[6] < 20.0, 0.2);
    if score >= RISK_LABEL_THRESHOLD - 1e-9 {
        1.0
    } else {
        0.0
    }
}

/// File churn rows `[additions, deletions, modifications, churn_history]`
/// with a churn target in [0, 1]
pub fn churn_dataset(seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..TABULAR_SAMPLES)
        .map(|_| {
            vec![
                rng.gen::<f64>() * 1000.0,
                rng.gen::<f64>() * 1000.0,
                rng.gen::<f64>() * 50.0,
                rng.gen::<f64>() * 200.0,
            ]
        })
        .collect();
    let targets = rows
        .iter()
        .map(|row| {
            let churn = (row[0] + row[1]) / 2000.0 * 0.4 + row[2] / 50.0 * 0.3 + row[3] / 200.0 * 0.3;
            churn.clamp(0.0, 1.0)
        })
        .collect();
    (rows, targets)
}

/// Contributor rows `[experience_score, contributions, rejection_rate]`:
/// a broad "normal" cluster followed by a sparse outlier cluster (9:1)
pub fn anomaly_dataset(seed: u64) -> Result<Vec<Vec<f64>>, String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_outliers = (ANOMALY_SAMPLES as f64 * OUTLIER_FRACTION).round() as usize;
    let n_normal = ANOMALY_SAMPLES - n_outliers;

    let mut rows = multivariate_normal(&mut rng, &NORMAL_MEAN, &NORMAL_COV, n_normal)?;
    rows.extend(multivariate_normal(
        &mut rng,
        &OUTLIER_MEAN,
        &OUTLIER_COV,
        n_outliers,
    )?);
    Ok(rows)
}

/// Draw `n` samples from N(mean, cov) using the Cholesky factor of `cov`
fn multivariate_normal<const D: usize>(
    rng: &mut StdRng,
    mean: &[f64; D],
    cov: &[[f64; D]; D],
    n: usize,
) -> Result<Vec<Vec<f64>>, String> {
    let factor = cholesky(cov)?;
    Ok((0..n)
        .map(|_| {
            let z: [f64; D] = std::array::from_fn(|_| StandardNormal.sample(&mut *rng));
            (0..D)
                .map(|i| mean[i] + (0..=i).map(|k| factor[i][k] * z[k]).sum::<f64>())
                .collect()
        })
        .collect())
}

/// Lower-triangular L with L * L^T = matrix
fn cholesky<const D: usize>(matrix: &[[f64; D]; D]) -> Result<[[f64; D]; D], String> {
    let mut lower = [[0.0; D]; D];
    for i in 0..D {
        for j in 0..=i {
            let partial: f64 = (0..j).map(|k| lower[i][k] * lower[j][k]).sum();
            if i == j {
                let diagonal = matrix[i][i] - partial;
                if diagonal <= 0.0 {
                    return Err("covariance matrix is not positive definite".to_string());
                }
                lower[i][j] = diagonal.sqrt();
            } else {
                lower[i][j] = (matrix[i][j] - partial) / lower[j][j];
            }
        }
    }
    Ok(lower)
}
