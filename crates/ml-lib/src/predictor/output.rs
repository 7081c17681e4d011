//! Post-processing of raw estimator scores
//!
//! Converts raw outputs to the bounded scores the API reports: clipping for
//! churn, batch min-max normalization plus inversion for anomaly scores.

/// Confidence reported with every risk prediction
pub const RISK_CONFIDENCE: f64 = 0.85;

/// Added to the batch range so a constant batch normalizes to 0
pub const NORMALIZATION_EPSILON: f64 = 1e-10;

/// Anomaly score above which the API flags a contributor
pub const ANOMALY_FLAG_THRESHOLD: f64 = 0.5;

/// Default threshold for `flag_anomalies`
pub const DEFAULT_FLAG_THRESHOLD: f64 = 0.7;

/// Label attached to flagged contributors
pub const ANOMALY_FLAG: &str = "Unusual activity pattern";

/// Clamp a score to [0, 1]
pub fn clip_unit(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

/// Min-max normalize a batch: `(x - min) / (max - min + eps)`
pub fn normalize_batch(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let (min, max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min + NORMALIZATION_EPSILON;
    raw.iter().map(|&v| (v - min) / range).collect()
}

/// Turn raw decision scores (higher = more normal) into anomaly scores
/// in [0, 1] where higher means more anomalous
pub fn anomaly_scores(raw: &[f64]) -> Vec<f64> {
    normalize_batch(raw).into_iter().map(|n| 1.0 - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_unit() {
        assert_eq!(clip_unit(-0.2), 0.0);
        assert_eq!(clip_unit(0.3), 0.3);
        assert_eq!(clip_unit(1.7), 1.0);
    }

    #[test]
    fn test_normalize_constant_batch_is_zero() {
        let normalized = normalize_batch(&[0.12, 0.12, 0.12]);
        assert_eq!(normalized, vec![0.0, 0.0, 0.0]);
        assert!(normalized.iter().all(|v| v.is_finite()));
        assert_eq!(anomaly_scores(&[0.12, 0.12]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_normalize_spans_unit_range() {
        let normalized = normalize_batch(&[-0.2, 0.0, 0.2]);
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 0.5).abs() < 1e-6);
        assert!(normalized[2] < 1.0 && normalized[2] > 1.0 - 1e-6);
    }

    #[test]
    fn test_anomaly_scores_invert_polarity() {
        // The most normal raw score becomes the least anomalous
        let scores = anomaly_scores(&[0.15, -0.25, 0.05]);
        assert!(scores[1] > scores[2]);
        assert!(scores[2] > scores[0]);
        assert!((scores[1] - 1.0).abs() < 1e-9);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_empty_batch() {
        assert!(normalize_batch(&[]).is_empty());
        assert!(anomaly_scores(&[]).is_empty());
    }
}
