//! Core data models for the ML service

use serde::{Deserialize, Serialize};

/// Pull request features used by the risk model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    /// log(1 + lines added + lines deleted)
    pub f1: f64,
    /// Files changed
    pub f2: f64,
    /// Commit count
    pub f3: f64,
    /// Review comments
    pub f4: f64,
    /// Time to merge (normalized)
    pub f5: f64,
    /// Contributor rejection rate
    pub f6: f64,
    /// Contributor experience score
    pub f7: f64,
    /// Average churn of modified files
    pub f8: f64,
}

impl RiskFeatures {
    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.f1, self.f2, self.f3, self.f4, self.f5, self.f6, self.f7, self.f8,
        ]
    }
}

/// File features used by the churn model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFeatures {
    pub additions: f64,
    pub deletions: f64,
    pub modifications: f64,
    pub churn_history: f64,
}

impl FileFeatures {
    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.additions,
            self.deletions,
            self.modifications,
            self.churn_history,
        ]
    }
}

/// Contributor features used by the anomaly model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributorFeatures {
    pub experience_score: f64,
    pub contributions: f64,
    pub rejection_rate: f64,
}

impl ContributorFeatures {
    pub fn to_vector(&self) -> Vec<f64> {
        vec![self.experience_score, self.contributions, self.rejection_rate]
    }
}

/// Risk bucket of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Low below 0.4, Medium on [0.4, 0.7], High above 0.7
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            RiskLevel::Low
        } else if score <= 0.7 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Churn bucket of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChurnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ChurnLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ChurnLevel::Critical
        } else if score > 0.6 {
            ChurnLevel::High
        } else if score > 0.4 {
            ChurnLevel::Medium
        } else {
            ChurnLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnLevel::Low => "low",
            ChurnLevel::Medium => "medium",
            ChurnLevel::High => "high",
            ChurnLevel::Critical => "critical",
        }
    }
}

/// Contribution of one feature to a specific risk prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorImpact {
    pub feature: String,
    pub description: String,
    pub value: f64,
    pub importance: f64,
    pub impact_weight: f64,
}

/// Factor as reported to API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub value: f64,
    pub impact_weight: f64,
}

impl From<&FactorImpact> for TopFactor {
    fn from(factor: &FactorImpact) -> Self {
        Self {
            feature: factor.description.clone(),
            value: (factor.value * 100.0).round() / 100.0,
            impact_weight: factor.impact_weight,
        }
    }
}

/// Explained risk prediction for a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub model_used: String,
    pub top_factors: Vec<TopFactor>,
    pub recommendations: Vec<String>,
}

/// Churn prediction for a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub churn_probability: f64,
    pub churn_level: ChurnLevel,
    pub model_used: String,
}

/// Batch of contributors to score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyRequest {
    #[serde(default)]
    pub features: Vec<ContributorFeatures>,
}

/// Contributor whose anomaly score crossed the flag threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedContributor {
    pub index: usize,
    pub anomaly_score: f64,
    pub flag: String,
}

/// Anomaly scores for a contributor batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_scores: Vec<f64>,
    pub flagged_contributors: Vec<FlaggedContributor>,
    pub model_used: String,
}

/// Request to (re)train the risk model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub repository_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    pub model_type: String,
}

/// Where a ready estimator came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Decoded from a persisted artifact
    Loaded,
    /// Trained on synthetic data in this process
    Trained,
}

/// Lifecycle status of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub name: String,
    pub model_type: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ModelSource>,
    pub n_features: usize,
}
