//! API client for communicating with the ML service

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the ML service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, detail);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn service_info(&self) -> Result<ServiceInfo> {
        self.get("").await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("health").await
    }

    pub async fn readiness(&self) -> Result<Readiness> {
        // 503 still carries a readiness body
        let url = self.base_url.join("readyz").context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        response.json().await.context("Failed to parse response")
    }

    pub async fn list_models(&self) -> Result<Vec<ModelStatus>> {
        self.get("ml/models").await
    }

    pub async fn predict_risk(&self, request: &RiskRequest) -> Result<RiskPrediction> {
        self.post("ml/predict-risk", request).await
    }

    pub async fn predict_churn(&self, request: &ChurnRequest) -> Result<ChurnPrediction> {
        self.post("ml/predict-churn", request).await
    }

    pub async fn detect_anomalies(&self, request: &AnomalyRequest) -> Result<AnomalyReport> {
        self.post("ml/detect-anomalies", request).await
    }

    pub async fn train_risk_model(&self, request: &TrainRequest) -> Result<TrainResponse> {
        self.post("ml/train-risk-model", request).await
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub f4: f64,
    pub f5: f64,
    pub f6: f64,
    pub f7: f64,
    pub f8: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub value: f64,
    pub impact_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub risk_score: f64,
    pub risk_level: String,
    pub confidence: f64,
    pub model_used: String,
    pub top_factors: Vec<TopFactor>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnRequest {
    pub additions: f64,
    pub deletions: f64,
    pub modifications: f64,
    pub churn_history: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub churn_probability: f64,
    pub churn_level: String,
    pub model_used: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributorInput {
    pub experience_score: f64,
    pub contributions: f64,
    pub rejection_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRequest {
    pub features: Vec<ContributorInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedContributor {
    pub index: usize,
    pub anomaly_score: f64,
    pub flag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_scores: Vec<f64>,
    pub flagged_contributors: Vec<FlaggedContributor>,
    pub model_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    pub model_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub name: String,
    pub model_type: String,
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub n_features: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_request() -> RiskRequest {
        RiskRequest {
            f1: 7.5,
            f2: 15.0,
            f3: 6.0,
            f4: 0.0,
            f5: 0.6,
            f6: 0.4,
            f7: 0.2,
            f8: 0.7,
        }
    }

    #[tokio::test]
    async fn test_predict_risk_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ml/predict-risk")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "risk_score": 0.82,
                    "risk_level": "High",
                    "confidence": 0.85,
                    "model_used": "RandomForestClassifier",
                    "top_factors": [{"feature": "High File Count", "value": 15.0, "impact_weight": 0.5}],
                    "recommendations": ["Assign a senior reviewer due to low contributor experience."]
                }"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let prediction = client.predict_risk(&risk_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(prediction.risk_level, "High");
        assert_eq!(prediction.top_factors[0].feature, "High File Count");
        assert_eq!(prediction.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ml/predict-churn")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "churn_model is not initialized"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .predict_churn(&ChurnRequest {
                additions: 1.0,
                deletions: 1.0,
                modifications: 1.0,
                churn_history: 1.0,
            })
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("churn_model is not initialized"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ml/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"name": "risk_model", "model_type": "RandomForestClassifier", "ready": true, "source": "trained", "n_features": 8},
                    {"name": "churn_model", "model_type": "RandomForestRegressor", "ready": false, "n_features": 4}
                ]"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let models = client.list_models().await.unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].source.as_deref(), Some("trained"));
        assert!(!models[1].ready);
        assert_eq!(models[1].source, None);
    }

    #[tokio::test]
    async fn test_readiness_reads_unavailable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ready": false, "reason": "Models not yet initialized"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let readiness = client.readiness().await.unwrap();
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Models not yet initialized"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_train_request_omits_missing_repository() {
        let body = serde_json::to_value(TrainRequest {
            repository_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({}));
    }
}
