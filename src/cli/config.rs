//! Resolved run configuration

use std::path::PathBuf;

use serde::Serialize;

use crate::model::explain::ShapConfig;
use crate::pipeline::schema::PipelineKind;

/// Values a training pipeline runs with, after defaults are applied
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub seed: u64,
    pub test_size: f64,
    pub cv_folds: usize,
    pub shap: ShapConfig,
    /// Render SVG charts
    pub plots: bool,
    pub infer_schema_length: usize,
}

impl RunConfig {
    /// Command-line defaults for `pipeline`
    pub fn new(pipeline: PipelineKind, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            seed: 42,
            test_size: pipeline.default_test_size(),
            cv_folds: 5,
            shap: ShapConfig::default(),
            plots: true,
            infer_schema_length: 10000,
        }
    }
}
