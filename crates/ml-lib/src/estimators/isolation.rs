//! Isolation Forest
//!
//! Anomalies are easier to isolate with random axis-aligned splits and so
//! end up with shorter average path lengths across the trees. Scores follow
//! the usual convention: `score_samples` is the negated anomaly score
//! `-2^(-E[h(x)] / c(psi))`, and `decision_function` shifts it by an offset
//! fitted from the contamination rate, so negative values are outliers and
//! larger values are more normal.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Euler-Mascheroni constant used by the harmonic number approximation
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationParams {
    /// Number of trees
    pub n_trees: usize,
    /// Rows drawn (without replacement) for each tree
    pub max_samples: usize,
    /// Expected share of outliers in the training data
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

/// Trained Isolation Forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Subsample size actually used per tree
    sample_size: usize,
    n_features: usize,
    /// Threshold on `score_samples` separating the contamination share
    offset: f64,
}

impl IsolationForest {
    /// Fit the forest on `rows`
    pub fn fit(rows: &[Vec<f64>], params: IsolationParams) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("no training rows".to_string());
        }
        if params.n_trees == 0 {
            return Err("n_trees must be positive".to_string());
        }
        if !(0.0..0.5).contains(&params.contamination) {
            return Err(format!(
                "contamination must be in [0, 0.5), got {}",
                params.contamination
            ));
        }

        let n_features = rows[0].len();
        if let Some(i) = rows.iter().position(|row| row.len() != n_features) {
            return Err(format!(
                "row {} has {} values, expected {}",
                i,
                rows[i].len(),
                n_features
            ));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_size = params.max_samples.clamp(1, rows.len());
        let max_depth = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample = index::sample(&mut rng, rows.len(), sample_size).into_vec();
                IsolationTree::build(rows, sample, n_features, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            n_features,
            offset: -0.5,
        };

        if params.contamination > 0.0 {
            let mut training_scores = forest.score_samples(rows)?;
            training_scores.sort_by(f64::total_cmp);
            forest.offset = percentile(&training_scores, params.contamination);
        }

        Ok(forest)
    }

    /// Negated anomaly score per row; lower means more anomalous
    pub fn score_samples(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, String> {
        let normalizer = average_path_length(self.sample_size);
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.n_features {
                    return Err(format!(
                        "row {} has {} values, expected {}",
                        i,
                        row.len(),
                        self.n_features
                    ));
                }
                let mean_path = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(row))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                let anomaly = if normalizer > 0.0 {
                    2f64.powf(-mean_path / normalizer)
                } else {
                    0.5
                };
                Ok(-anomaly)
            })
            .collect()
    }

    /// Shifted score per row; negative for outliers, higher is more normal
    pub fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, String> {
        Ok(self
            .score_samples(rows)?
            .into_iter()
            .map(|score| score - self.offset)
            .collect())
    }

}

/// c(n): average path length of an unsuccessful BST search over n points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile of sorted values, `q` in [0, 1]
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// A single isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    root: IsolationNode,
}

/// Node in an isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsolationNode {
    Internal {
        feature: usize,
        split: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationTree {
    fn build(
        rows: &[Vec<f64>],
        sample: Vec<usize>,
        n_features: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        Self {
            root: Self::build_node(rows, sample, n_features, 0, max_depth, rng),
        }
    }

    fn build_node(
        rows: &[Vec<f64>],
        indices: Vec<usize>,
        n_features: usize,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> IsolationNode {
        if depth >= max_depth || indices.len() <= 1 || n_features == 0 {
            return IsolationNode::Leaf {
                size: indices.len(),
            };
        }

        let feature = rng.gen_range(0..n_features);
        let (min, max) = indices
            .iter()
            .map(|&i| rows[i][feature])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        // A constant column cannot isolate anything on this branch
        if max - min <= f64::EPSILON {
            return IsolationNode::Leaf {
                size: indices.len(),
            };
        }

        let split = rng.gen_range(min..max);
        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| rows[i][feature] < split);

        IsolationNode::Internal {
            feature,
            split,
            left: Box::new(Self::build_node(
                rows,
                left,
                n_features,
                depth + 1,
                max_depth,
                rng,
            )),
            right: Box::new(Self::build_node(
                rows,
                right,
                n_features,
                depth + 1,
                max_depth,
                rng,
            )),
        }
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationNode::Leaf { size } => {
                    return depth as f64 + average_path_length(*size);
                }
                IsolationNode::Internal {
                    feature,
                    split,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *split { &**left } else { &**right };
                    depth += 1;
                }
            }
        }
    }
}
