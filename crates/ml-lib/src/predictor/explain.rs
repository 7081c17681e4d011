//! Per-prediction explanation for the risk model
//!
//! Combines the model's global feature importances with the request's own
//! feature values: a feature matters for this PR when it is both important
//! to the model and large in this input.

use super::features::{FEATURE_DESCRIPTIONS, FEATURE_NAMES};
use crate::models::FactorImpact;

/// Factors reported per prediction
pub const TOP_FACTORS: usize = 3;

/// Scale that maps raw feature values onto [0, 1] for impact weighting
const VALUE_SCALE: f64 = 10.0;

/// Rank the features of one row by `importance * min(value / 10, 1)`.
///
/// Returns at most [`TOP_FACTORS`] entries, highest impact first, with ties
/// kept in feature order. When the kept impacts sum to a positive value they
/// are rescaled to sum to 1 and rounded to hundredths without losing mass.
pub fn rank_factors(importances: &[f64], values: &[f64]) -> Vec<FactorImpact> {
    let mut factors: Vec<FactorImpact> = importances
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (&importance, &value))| {
            let normalized = (value / VALUE_SCALE).min(1.0);
            FactorImpact {
                feature: FEATURE_NAMES.get(i).copied().unwrap_or("Unknown").to_string(),
                description: FEATURE_DESCRIPTIONS
                    .get(i)
                    .copied()
                    .unwrap_or("Unknown")
                    .to_string(),
                value,
                importance,
                impact_weight: importance * normalized,
            }
        })
        .collect();

    factors.sort_by(|a, b| b.impact_weight.total_cmp(&a.impact_weight));
    factors.truncate(TOP_FACTORS);

    let total: f64 = factors.iter().map(|f| f.impact_weight).sum();
    if total > 0.0 {
        let shares: Vec<f64> = factors.iter().map(|f| f.impact_weight / total).collect();
        for (factor, weight) in factors.iter_mut().zip(round_hundredths(&shares)) {
            factor.impact_weight = weight;
        }
    }

    factors
}

/// Round shares summing to 1 onto hundredths with the largest remainder
/// method, so the rounded values still sum to 1
fn round_hundredths(shares: &[f64]) -> Vec<f64> {
    let scaled: Vec<f64> = shares.iter().map(|s| s * 100.0).collect();
    let mut units: Vec<i64> = scaled.iter().map(|s| s.floor() as i64).collect();

    let mut remaining = 100 - units.iter().sum::<i64>();
    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra)
    });

    for &i in order.iter().cycle().take(scaled.len() * 2) {
        if remaining <= 0 {
            break;
        }
        units[i] += 1;
        remaining -= 1;
    }

    units.into_iter().map(|u| u as f64 / 100.0).collect()
}
