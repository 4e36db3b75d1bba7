//! Model module - classifiers, metrics, selection and explanation
//!
//! Every classifier is fitted on a dense `f64` feature matrix produced by
//! [`crate::pipeline::Preprocessor`] and a 0/1 label vector.

pub mod artifact;
pub mod boosting;
pub mod explain;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod selection;
pub mod tree;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use artifact::TrainedModel;
pub use boosting::{GradientBoosting, GradientBoostingParams};
pub use forest::{RandomForest, RandomForestParams};
pub use logistic::LogisticRegression;

/// Typed failures of model fitting and prediction
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("cannot fit on empty data")]
    EmptyData,

    #[error("training labels contain a single class")]
    SingleClass,
}

/// Validate a training matrix and its 0/1 labels
pub(crate) fn check_training_data(x: &Array2<f64>, y: &[f64]) -> Result<(), ModelError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::EmptyData);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    let positives = y.iter().filter(|&&v| v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

/// Validate the width of a prediction matrix
pub(crate) fn check_features(x: &Array2<f64>, n_features: usize) -> Result<(), ModelError> {
    if x.ncols() != n_features {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[inline]
pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Scale importances to sum to 1 (left as-is when they sum to 0)
pub(crate) fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}

/// Any of the supported binary classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl Classifier {
    /// Display name used in reports and model comparison tables
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(_) => "Logistic Regression",
            Classifier::RandomForest(_) => "Random Forest",
            Classifier::GradientBoosting(_) => "Gradient Boosting",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), ModelError> {
        match self {
            Classifier::LogisticRegression(m) => m.fit(x, y),
            Classifier::RandomForest(m) => m.fit(x, y),
            Classifier::GradientBoosting(m) => m.fit(x, y),
        }
    }

    /// Probability of the positive class for every row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        match self {
            Classifier::LogisticRegression(m) => m.predict_proba(x),
            Classifier::RandomForest(m) => m.predict_proba(x),
            Classifier::GradientBoosting(m) => m.predict_proba(x),
        }
    }

    /// Hard 0/1 predictions at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    /// Normalized impurity importances for tree ensembles; `None` otherwise
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            Classifier::LogisticRegression(_) => None,
            Classifier::RandomForest(m) => m.feature_importances(),
            Classifier::GradientBoosting(m) => m.feature_importances(),
        }
    }

    /// Short description of the hyperparameters
    pub fn describe_params(&self) -> String {
        match self {
            Classifier::LogisticRegression(m) => format!("C={}, max_iter={}", m.c, m.max_iter),
            Classifier::RandomForest(m) => m.params.to_string(),
            Classifier::GradientBoosting(m) => m.params.to_string(),
        }
    }
}
