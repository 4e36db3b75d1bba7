//! Dataset loader for CSV and Parquet files

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Basic shape and size information about a loaded dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// `infer_schema_length` of 0 scans the whole CSV file for type inference.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    lf.collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// Compute row/column counts and the estimated in-memory size
pub fn dataset_stats(df: &DataFrame) -> DatasetStats {
    let (rows, columns) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    DatasetStats {
        rows,
        columns,
        memory_mb,
    }
}

/// Fail with the full list of absent columns if any required column is missing
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !present.iter().any(|p| p == name))
        .collect();

    if !missing.is_empty() {
        anyhow::bail!(
            "Dataset is missing required column(s): {}",
            missing.join(", ")
        );
    }

    Ok(())
}

/// Count columns per data type, sorted by count descending then type name
pub fn dtype_summary(df: &DataFrame) -> Vec<(String, usize)> {
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for col in df.get_columns() {
        *counts.entry(col.dtype().to_string()).or_insert(0) += 1;
    }

    let mut summary: Vec<(String, usize)> = counts.into_iter().collect();
    summary.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summary
}

/// Extract a column as `f64` values; nulls become NaN
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;
    let cast = col
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

/// Extract a column as strings; nulls become empty strings
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let col = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;
    let cast = col.cast(&DataType::String)?;
    let values = cast
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect();
    Ok(values)
}

/// Append (or replace) a `Float64` column
pub fn put_numeric_column(df: &mut DataFrame, name: &str, values: Vec<f64>) -> Result<()> {
    df.with_column(Column::new(name.into(), values))
        .with_context(|| format!("Failed to add column '{}'", name))?;
    Ok(())
}

/// Append (or replace) a `String` column
pub fn put_string_column(df: &mut DataFrame, name: &str, values: Vec<String>) -> Result<()> {
    df.with_column(Column::new(name.into(), values))
        .with_context(|| format!("Failed to add column '{}'", name))?;
    Ok(())
}
