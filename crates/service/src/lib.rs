//! RepoPulse ML service: HTTP facade over the risk, churn and anomaly models

pub mod api;
pub mod config;
