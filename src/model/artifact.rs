//! Serialized model artifact: feature aggregates, preprocessor and classifier

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::pipeline::schema::PipelineKind;
use crate::pipeline::{FeatureAggregates, Preprocessor};

/// A fitted preprocessing transform and classifier, immutable after fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub pipeline: PipelineKind,
    /// Name shown in the model comparison, e.g. "Gradient Boosting (Tuned)"
    pub name: String,
    /// Population aggregates of the training frame, reused when scoring
    #[serde(default)]
    pub aggregates: FeatureAggregates,
    pub preprocessor: Preprocessor,
    pub classifier: Classifier,
    /// Test-split ROC-AUC at selection time
    pub test_auc: f64,
    pub crate_version: String,
}

impl TrainedModel {
    pub fn new(
        pipeline: PipelineKind,
        name: impl Into<String>,
        preprocessor: Preprocessor,
        classifier: Classifier,
        test_auc: f64,
    ) -> Self {
        Self {
            pipeline,
            name: name.into(),
            aggregates: FeatureAggregates::default(),
            preprocessor,
            classifier,
            test_auc,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_aggregates(mut self, aggregates: FeatureAggregates) -> Self {
        self.aggregates = aggregates;
        self
    }

    /// Positive-class probability for every row of a raw (feature-engineered)
    /// frame
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let x = self.preprocessor.transform(df)?;
        Ok(self.classifier.predict_proba(&x)?)
    }

    /// Hard 0/1 predictions at 0.5 for every row
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let x = self.preprocessor.transform(df)?;
        Ok(self.classifier.predict(&x)?)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.preprocessor.feature_names()
    }

    /// Feature importances paired with names, highest first; `None` for
    /// classifiers without importances
    pub fn ranked_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.classifier.feature_importances()?;
        let mut ranked: Vec<(String, f64)> = self
            .feature_names()
            .into_iter()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(ranked)
    }

    /// Write the artifact as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create model file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to serialize model to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open model file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model file: {}", path.display()))
    }
}
