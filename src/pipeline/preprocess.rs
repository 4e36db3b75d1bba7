//! Feature matrix construction: standardization and one-hot encoding
//!
//! A [`Preprocessor`] is fitted on the training rows only and then applied
//! unchanged to test rows and to any frame scored later. It is serialized as
//! part of the trained model artifact.

use anyhow::{Context, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregate::{mean, population_std};
use super::loader::{numeric_column, require_columns, string_column};
use super::schema::NON_FEATURE_COLUMNS;

/// Standardization parameters of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

impl NumericScaler {
    fn fit(name: &str, values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let m = if finite.is_empty() { 0.0 } else { mean(&finite) };
        let std = if finite.is_empty() { 0.0 } else { population_std(&finite) };
        Self {
            name: name.to_string(),
            mean: m,
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }

    /// Non-finite inputs encode as 0.0 (the training mean)
    pub fn transform(&self, value: f64) -> f64 {
        if value.is_finite() {
            (value - self.mean) / self.scale
        } else {
            0.0
        }
    }
}

/// One-hot levels of one string column
///
/// `levels` is sorted; the first level is the dropped reference category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub name: String,
    pub levels: Vec<String>,
}

impl CategoricalEncoder {
    fn fit(name: &str, values: &[String]) -> Self {
        let mut levels: Vec<String> = values.to_vec();
        levels.sort();
        levels.dedup();
        Self {
            name: name.to_string(),
            levels,
        }
    }

    /// Levels that get their own output column
    pub fn encoded_levels(&self) -> &[String] {
        if self.levels.is_empty() {
            &[]
        } else {
            &self.levels[1..]
        }
    }

    /// Output column index (within this encoder) hot for `value`, if any
    ///
    /// The reference level and unknown levels are all zeros.
    pub fn hot_index(&self, value: &str) -> Option<usize> {
        self.encoded_levels().iter().position(|l| l == value)
    }
}

/// Fitted column transform producing the model's feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericScaler>,
    pub categorical: Vec<CategoricalEncoder>,
}

/// Columns that never enter the feature matrix: identifiers, constants and
/// the label column(s) of the current pipeline
pub fn excluded_columns<'a>(labels: &[&'a str]) -> Vec<&'a str> {
    NON_FEATURE_COLUMNS
        .iter()
        .copied()
        .chain(labels.iter().copied())
        .collect()
}

impl Preprocessor {
    /// Fit on the given training rows of `df`, skipping `exclude`
    ///
    /// Primitive numeric columns are standardized, string columns one-hot
    /// encoded. Any other dtype is an error.
    pub fn fit(df: &DataFrame, rows: &[usize], exclude: &[&str]) -> Result<Self> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for col in df.get_columns() {
            let name = col.name().as_str();
            if exclude.contains(&name) {
                continue;
            }

            if col.dtype().is_primitive_numeric() {
                let values = numeric_column(df, name)?;
                let train: Vec<f64> = rows.iter().map(|&i| values[i]).collect();
                numeric.push(NumericScaler::fit(name, &train));
            } else if matches!(col.dtype(), DataType::String) {
                let values = string_column(df, name)?;
                let train: Vec<String> = rows.iter().map(|&i| values[i].clone()).collect();
                categorical.push(CategoricalEncoder::fit(name, &train));
            } else {
                anyhow::bail!(
                    "Column '{}' has unsupported type {} for modeling",
                    name,
                    col.dtype()
                );
            }
        }

        if numeric.is_empty() && categorical.is_empty() {
            anyhow::bail!("No feature columns left after excluding identifiers and labels");
        }

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Output feature names: numeric columns, then `Column_Level` per
    /// encoded level
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.name.clone()).collect();
        for enc in &self.categorical {
            for level in enc.encoded_levels() {
                names.push(format!("{}_{}", enc.name, level));
            }
        }
        names
    }

    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|e| e.encoded_levels().len())
                .sum::<usize>()
    }

    /// Names of the source columns the transform reads
    pub fn input_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.categorical.iter().map(|e| e.name.as_str()))
            .collect()
    }

    /// Transform every row of `df` into the feature matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        require_columns(df, &self.input_columns())
            .context("Input does not match the columns the model was trained on")?;

        let n_rows = df.height();
        let mut x = Array2::<f64>::zeros((n_rows, self.n_features()));

        for (j, scaler) in self.numeric.iter().enumerate() {
            let values = numeric_column(df, &scaler.name)?;
            for (i, v) in values.into_iter().enumerate() {
                x[[i, j]] = scaler.transform(v);
            }
        }

        let mut offset = self.numeric.len();
        for enc in &self.categorical {
            let values = string_column(df, &enc.name)?;
            for (i, v) in values.iter().enumerate() {
                if let Some(k) = enc.hot_index(v) {
                    x[[i, offset + k]] = 1.0;
                }
            }
            offset += enc.encoded_levels().len();
        }

        Ok(x)
    }
}
