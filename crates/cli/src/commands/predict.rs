//! Prediction commands: risk, churn and anomaly screening

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use std::path::Path;
use tabled::Tabled;

use crate::client::{AnomalyRequest, ApiClient, ChurnRequest, ContributorInput, RiskRequest};
use crate::output::{
    color_anomaly_score, color_level, format_percent, print_info, print_json, print_rows,
    print_success, OutputFormat,
};

/// Pull request features, in model order
#[derive(Args)]
pub struct RiskArgs {
    /// PR size as log(1 + lines added + deleted)
    #[arg(long)]
    pub f1: f64,
    /// Files changed
    #[arg(long)]
    pub f2: f64,
    /// Commit count
    #[arg(long)]
    pub f3: f64,
    /// Review comments
    #[arg(long)]
    pub f4: f64,
    /// Time to merge
    #[arg(long)]
    pub f5: f64,
    /// Contributor rejection rate
    #[arg(long)]
    pub f6: f64,
    /// Contributor experience
    #[arg(long)]
    pub f7: f64,
    /// File churn score
    #[arg(long)]
    pub f8: f64,
}

impl From<RiskArgs> for RiskRequest {
    fn from(args: RiskArgs) -> Self {
        Self {
            f1: args.f1,
            f2: args.f2,
            f3: args.f3,
            f4: args.f4,
            f5: args.f5,
            f6: args.f6,
            f7: args.f7,
            f8: args.f8,
        }
    }
}

/// File change features; omitted values are sent as 0
#[derive(Args)]
pub struct ChurnArgs {
    #[arg(long, default_value_t = 0.0)]
    pub additions: f64,
    #[arg(long, default_value_t = 0.0)]
    pub deletions: f64,
    #[arg(long, default_value_t = 0.0)]
    pub modifications: f64,
    /// Historical churn count for the file
    #[arg(long, default_value_t = 0.0)]
    pub churn_history: f64,
}

#[derive(Tabled)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    feature: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Flag")]
    flag: String,
}

/// Contributor files may hold a bare array or a request body
#[derive(Deserialize)]
#[serde(untagged)]
enum ContributorFile {
    Rows(Vec<ContributorInput>),
    Request { features: Vec<ContributorInput> },
}

/// Read contributor features from a JSON file
pub fn load_contributors(path: &Path) -> Result<Vec<ContributorInput>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: ContributorFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid contributor file {}", path.display()))?;

    Ok(match parsed {
        ContributorFile::Rows(rows) => rows,
        ContributorFile::Request { features } => features,
    })
}

pub async fn predict_risk(client: &ApiClient, args: RiskArgs, format: OutputFormat) -> Result<()> {
    let prediction = client.predict_risk(&args.into()).await?;

    match format {
        OutputFormat::Json => print_json(&prediction),
        OutputFormat::Table => {
            println!(
                "{} {} ({}), confidence {}",
                "Risk:".bold(),
                color_level(&prediction.risk_level),
                format_percent(prediction.risk_score),
                format_percent(prediction.confidence)
            );
            println!("Model: {}\n", prediction.model_used);

            let rows: Vec<FactorRow> = prediction
                .top_factors
                .iter()
                .map(|f| FactorRow {
                    feature: f.feature.clone(),
                    value: format!("{:.2}", f.value),
                    weight: format_percent(f.impact_weight),
                })
                .collect();
            print_rows(&rows);

            println!("\n{}", "Recommendations:".bold());
            for recommendation in &prediction.recommendations {
                println!("  • {}", recommendation);
            }
        }
    }

    Ok(())
}

pub async fn predict_churn(
    client: &ApiClient,
    args: ChurnArgs,
    format: OutputFormat,
) -> Result<()> {
    let request = ChurnRequest {
        additions: args.additions,
        deletions: args.deletions,
        modifications: args.modifications,
        churn_history: args.churn_history,
    };
    let prediction = client.predict_churn(&request).await?;

    match format {
        OutputFormat::Json => print_json(&prediction),
        OutputFormat::Table => {
            println!(
                "{} {} ({})",
                "Churn:".bold(),
                color_level(&prediction.churn_level),
                format_percent(prediction.churn_probability)
            );
            println!("Model: {}", prediction.model_used);
        }
    }

    Ok(())
}

pub async fn detect_anomalies(client: &ApiClient, file: &Path, format: OutputFormat) -> Result<()> {
    let features = load_contributors(file)?;
    let report = client
        .detect_anomalies(&AnomalyRequest { features })
        .await?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            if report.anomaly_scores.is_empty() {
                print_info("No contributors to screen");
                return Ok(());
            }

            let rows: Vec<AnomalyRow> = report
                .anomaly_scores
                .iter()
                .enumerate()
                .map(|(index, score)| AnomalyRow {
                    index,
                    score: color_anomaly_score(*score),
                    flag: report
                        .flagged_contributors
                        .iter()
                        .find(|f| f.index == index)
                        .map(|f| f.flag.clone())
                        .unwrap_or_default(),
                })
                .collect();
            print_rows(&rows);

            let flagged = report.flagged_contributors.len();
            if flagged == 0 {
                print_success("No unusual contributors");
            } else {
                println!(
                    "\n{} of {} contributors flagged ({})",
                    flagged.to_string().red().bold(),
                    report.anomaly_scores.len(),
                    report.model_used
                );
            }
        }
    }

    Ok(())
}
