//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_rows<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a probability or weight as a percentage
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Color a risk or churn level
pub fn color_level(level: &str) -> String {
    match level.to_lowercase().as_str() {
        "low" => level.green().to_string(),
        "medium" => level.yellow().to_string(),
        "high" => level.red().to_string(),
        "critical" => level.red().bold().to_string(),
        _ => level.to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" | "ready" => status.green().to_string(),
        "degraded" | "warning" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" | "not ready" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color an anomaly score, higher is more anomalous
pub fn color_anomaly_score(score: f64) -> String {
    let formatted = format!("{:.3}", score);
    if score > 0.8 {
        formatted.red().to_string()
    } else if score > 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
