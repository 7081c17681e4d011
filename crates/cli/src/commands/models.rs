//! Model status, training and health commands

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;

use crate::client::{ApiClient, TrainRequest};
use crate::output::{
    color_status, print_info, print_json, print_rows, print_success, print_warning, OutputFormat,
};

/// Row for models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Type")]
    model_type: String,
    #[tabled(rename = "Features")]
    n_features: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// List models and their readiness
pub async fn list_models(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let models = client.list_models().await?;

    match format {
        OutputFormat::Json => print_json(&models),
        OutputFormat::Table => {
            let rows: Vec<ModelRow> = models
                .iter()
                .map(|m| ModelRow {
                    name: m.name.clone(),
                    model_type: m.model_type.clone(),
                    n_features: m.n_features,
                    status: color_status(if m.ready { "ready" } else { "not ready" }),
                    source: m.source.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            print_rows(&rows);
        }
    }

    Ok(())
}

/// Ask the service to load or train the risk model
pub async fn train_risk(
    client: &ApiClient,
    repository_id: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let response = client
        .train_risk_model(&TrainRequest { repository_id })
        .await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            if response.success {
                print_success(&format!("{} ({})", response.message, response.model_type));
            } else {
                print_warning(&response.message);
            }
        }
    }

    Ok(())
}

/// Show liveness and readiness
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.service_info().await?;
    let health = client.health().await?;
    let readiness = client.readiness().await?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "service": info,
            "health": health,
            "readiness": readiness,
        })),
        OutputFormat::Table => {
            print_info(&format!("{} v{}", info.service, info.version));
            println!("Status:    {}", color_status(&health.status));
            if readiness.ready {
                println!("Readiness: {}", color_status("ready"));
            } else {
                println!("Readiness: {}", color_status("not ready"));
                if let Some(reason) = readiness.reason {
                    print_warning(&reason);
                }
            }
        }
    }

    Ok(())
}
