//! Feature contracts of the three models

/// Risk model arity
pub const RISK_FEATURES: usize = 8;

/// Churn model arity
pub const CHURN_FEATURES: usize = 4;

/// Anomaly model arity
pub const ANOMALY_FEATURES: usize = 3;

/// Display names of the risk features, in vector order (f1..f8)
pub const FEATURE_NAMES: [&str; RISK_FEATURES] = [
    "PR Size (Lines)",
    "Files Changed",
    "Commit Count",
    "Review Comments",
    "Time to Merge",
    "Contributor Rejection Rate",
    "Contributor Experience",
    "File Churn Score",
];

/// Human-readable factor label per risk feature, aligned with [`FEATURE_NAMES`]
pub const FEATURE_DESCRIPTIONS: [&str; RISK_FEATURES] = [
    "Large PR Size",
    "High File Count",
    "Many Commits",
    "Review Activity",
    "Slow Merge Time",
    "High Rejection Rate",
    "Low Contributor Experience",
    "High File Churn",
];
