//! CSV and JSON exports of a pipeline run

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::cli::RunConfig;
use crate::model::selection::Selection;
use crate::pipeline::schema::{self, PipelineKind};
use crate::pipeline::{put_numeric_column, put_string_column, RetentionDecision};
use crate::report::risk::{RetentionRiskCategory, RiskCategory};

/// Output file of the attrition risk profiles
pub const ATTRITION_PROFILES_FILE: &str = "attrition_risk_profiles.csv";
/// Output file of the retention dashboard rows
pub const RETENTION_DASHBOARD_FILE: &str = "retention_dashboard_data.csv";
/// Run metadata written next to the model
pub const RUN_METADATA_FILE: &str = "run_metadata.json";

/// Columns of the retention dashboard export, in order
pub const RETENTION_EXPORT_COLUMNS: [&str; 21] = [
    schema::EMPLOYEE_NUMBER,
    schema::AGE,
    schema::DEPARTMENT,
    schema::JOB_ROLE,
    schema::GENDER,
    schema::MONTHLY_INCOME,
    schema::CTC,
    schema::PERFORMANCE_RATING,
    schema::JOB_LEVEL,
    schema::PERFORMANCE_RISK,
    schema::RETENTION_PRIORITY_SCORE,
    schema::CRITICAL_ROLE,
    schema::SATISFACTION_COMPOSITE,
    schema::OVER_TIME,
    schema::YEARS_AT_COMPANY,
    schema::ENGAGEMENT_SCORE,
    schema::CAREER_GROWTH_POTENTIAL,
    schema::PRODUCTIVITY_COST_RATIO,
    schema::RETENTION_PROBABILITY,
    schema::RETENTION_RISK_CATEGORY,
    schema::RETENTION_RECOMMENDATION,
];

/// Add `AttritionProbability` and `RiskCategory` to every row
pub fn attach_attrition_predictions(df: &mut DataFrame, probabilities: &[f64]) -> Result<()> {
    let categories = probabilities
        .iter()
        .map(|&p| RiskCategory::from_probability(p).to_string())
        .collect();
    put_numeric_column(df, schema::ATTRITION_PROBABILITY, probabilities.to_vec())?;
    put_string_column(df, schema::RISK_CATEGORY, categories)?;
    Ok(())
}

/// Add `RetentionProbability`, `RetentionRecommendation` (from the 0.5
/// threshold predictions) and `RetentionRiskCategory` to every row
pub fn attach_retention_predictions(
    df: &mut DataFrame,
    probabilities: &[f64],
    predictions: &[f64],
) -> Result<()> {
    let recommendations = predictions
        .iter()
        .map(|&p| RetentionDecision::from_label(p as i32).to_string())
        .collect();
    let categories = probabilities
        .iter()
        .map(|&p| RetentionRiskCategory::from_probability(p).to_string())
        .collect();
    put_numeric_column(df, schema::RETENTION_PROBABILITY, probabilities.to_vec())?;
    put_string_column(df, schema::RETENTION_RECOMMENDATION, recommendations)?;
    put_string_column(df, schema::RETENTION_RISK_CATEGORY, categories)?;
    Ok(())
}

/// Save a frame to CSV or Parquet, chosen by extension
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

/// Write the fixed retention dashboard columns
pub fn export_retention_dashboard(df: &DataFrame, path: &Path) -> Result<()> {
    let mut selected = df
        .select(RETENTION_EXPORT_COLUMNS)
        .context("Retention export is missing required columns")?;
    save_dataset(&mut selected, path)
}

/// Test AUC of one evaluated candidate
#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub name: String,
    pub test_auc: f64,
}

/// Description of one run, written as `run_metadata.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (RFC 3339, UTC)
    pub timestamp: String,
    pub crate_version: String,
    pub pipeline: PipelineKind,
    pub config: RunConfig,
    pub rows: usize,
    pub features: Vec<String>,
    pub selected_model: String,
    pub selected_params: String,
    pub test_auc: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_mean_auc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_std_auc: Option<f64>,
    pub models: Vec<ModelScore>,
    /// Rows the decision-label medians were computed over
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_median_basis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunMetadata {
    pub fn new(
        pipeline: PipelineKind,
        config: &RunConfig,
        rows: usize,
        features: Vec<String>,
        selection: &Selection,
    ) -> Self {
        let best = selection.best_result();
        Self {
            timestamp: Utc::now().to_rfc3339(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            pipeline,
            config: config.clone(),
            rows,
            features,
            selected_model: best.name.clone(),
            selected_params: best.classifier.describe_params(),
            test_auc: best.auc,
            cv_mean_auc: selection.cv.as_ref().map(|cv| cv.mean),
            cv_std_auc: selection.cv.as_ref().map(|cv| cv.std),
            models: selection
                .results
                .iter()
                .map(|r| ModelScore {
                    name: r.name.clone(),
                    test_auc: r.auc,
                })
                .collect(),
            label_median_basis: None,
            warnings: Vec::new(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run metadata")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run metadata: {}", path.display()))?;
        Ok(())
    }
}
