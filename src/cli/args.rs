//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use super::RunConfig;
use crate::model::explain::ShapConfig;
use crate::pipeline::schema::PipelineKind;

/// Dataset read when no `--input` is given
pub const DEFAULT_INPUT: &str = "PROJECT AND DATASET IN HERE/WA_Fn-UseC_-HR-Employee-Attrition.csv";

/// Talent analytics - attrition prediction and retention decisions from HR data
#[derive(Parser, Debug)]
#[command(name = "talent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the two training pipelines
#[derive(clap::Args, Debug, Clone)]
pub struct TrainArgs {
    /// Input CSV file with one row per employee
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Directory that receives the model, exports and charts
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Seed for the train/test split, cross-validation, forests and explanations
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Share of rows held out for testing, in (0, 1).
    /// Defaults to 0.2 for attrition and 0.25 for retention.
    #[arg(long, value_parser = validate_test_size)]
    pub test_size: Option<f64>,

    /// Number of stratified cross-validation folds (at least 2)
    #[arg(long, default_value = "5", value_parser = validate_cv_folds)]
    pub cv_folds: usize,

    /// Number of test rows explained with Shapley values
    #[arg(long, default_value = "100")]
    pub shap_samples: usize,

    /// Permutations (and background rows) per explained row
    #[arg(long, default_value = "50")]
    pub shap_permutations: usize,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub no_plots: bool,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train and explain an attrition model, export per-employee risk profiles
    Attrition(TrainArgs),

    /// Derive Keep/Let Go labels, train a model to reproduce them, report savings
    Retention(TrainArgs),

    /// Score a CSV with a saved model
    Score {
        /// Model JSON written by `attrition` or `retention`
        #[arg(short, long)]
        model: PathBuf,

        /// Input CSV file with one row per employee
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (CSV or Parquet). Defaults to the input with a '_scored' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },

    /// Combine the attrition and retention exports into dashboard JSON
    Dashboard {
        /// Attrition risk profiles CSV
        #[arg(long, default_value = "attrition_risk_profiles.csv")]
        attrition: PathBuf,

        /// Retention dashboard CSV
        #[arg(long, default_value = "retention_dashboard_data.csv")]
        retention: PathBuf,

        /// Attrition model whose metrics and importances are included, if present
        #[arg(long, default_value = "attrition_prediction_model.json")]
        model: PathBuf,

        /// Output JSON file
        #[arg(short, long, default_value = "dashboard_data.json")]
        output: PathBuf,

        /// Number of rows to use for schema inference
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

impl TrainArgs {
    /// Resolve pipeline-specific defaults into a run configuration
    pub fn to_config(&self, pipeline: PipelineKind) -> RunConfig {
        RunConfig {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            seed: self.seed,
            test_size: self.test_size.unwrap_or_else(|| pipeline.default_test_size()),
            cv_folds: self.cv_folds,
            shap: ShapConfig {
                n_samples: self.shap_samples,
                n_permutations: self.shap_permutations,
                seed: self.seed,
            },
            plots: !self.no_plots,
            infer_schema_length: self.infer_schema_length,
        }
    }
}

/// Output path for `score`: explicit, or next to the input with a '_scored' suffix
pub fn scored_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(Path::to_path_buf).unwrap_or_else(|| {
        let parent = input.parent().unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let extension = input.extension().and_then(|e| e.to_str()).unwrap_or("csv");
        parent.join(format!("{}_scored.{}", stem, extension))
    })
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_size must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for cv_folds parameter
fn validate_cv_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;

    if value < 2 {
        Err(format!("cv_folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_test_size_bounds() {
        assert_eq!(validate_test_size("0.2"), Ok(0.2));
        assert!(validate_test_size("0").is_err());
        assert!(validate_test_size("1.0").is_err());
        assert!(validate_test_size("abc").is_err());
    }

    #[test]
    fn test_validate_cv_folds() {
        assert_eq!(validate_cv_folds("5"), Ok(5));
        assert!(validate_cv_folds("1").is_err());
        assert!(validate_cv_folds("-3").is_err());
    }

    #[test]
    fn test_scored_output_path() {
        assert_eq!(
            scored_output_path(Path::new("data/hr.csv"), None),
            PathBuf::from("data/hr_scored.csv")
        );
        assert_eq!(
            scored_output_path(Path::new("hr.csv"), Some(Path::new("out.parquet"))),
            PathBuf::from("out.parquet")
        );
    }
}
