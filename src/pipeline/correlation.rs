//! Pearson correlation over numeric columns
//!
//! Used by the exploration step (full numeric correlation matrix, strongest
//! pairs) and by feature engineering (correlation of each engineered feature
//! with the binary target).

use anyhow::Result;
use ndarray::Array2;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::loader::numeric_column;

/// Represents a correlated pair of features
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Symmetric correlation matrix with its column labels
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Upper-triangle pairs whose |r| exceeds `threshold`, strongest first
    pub fn correlated_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.names.len();
        let mut pairs: Vec<CorrelatedPair> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .filter_map(|(i, j)| {
                let c = self.values[[i, j]];
                if !c.is_nan() && c.abs() > threshold {
                    Some(CorrelatedPair {
                        feature1: self.names[i].clone(),
                        feature2: self.names[j].clone(),
                        correlation: c,
                    })
                } else {
                    None
                }
            })
            .collect();

        pairs.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
        pairs
    }
}

/// Pearson correlation using a single-pass Welford update
///
/// Rows where either value is NaN are skipped. Returns `None` for mismatched
/// lengths, fewer than two usable rows, or a constant input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }

    let mut n = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if x.is_nan() || y.is_nan() {
            continue;
        }
        n += 1.0;
        let dx = x - mean_x;
        let dy = y - mean_y;
        mean_x += dx / n;
        mean_y += dy / n;
        var_x += dx * (x - mean_x);
        var_y += dy * (y - mean_y);
        cov_xy += dx * (y - mean_y);
    }

    if n < 2.0 || var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov_xy / (var_x.sqrt() * var_y.sqrt()))
}

/// Names of all primitive-numeric columns, in frame order
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect()
}

/// Full Pearson matrix over the named columns
///
/// Pairs are computed in parallel; undefined correlations are NaN off the
/// diagonal and 1.0 on it.
pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix> {
    let data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| numeric_column(df, name))
        .collect::<Result<_>>()?;

    let n = columns.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let correlations: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| pearson(&data[i], &data[j]).unwrap_or(f64::NAN))
        .collect();

    let mut values = Array2::<f64>::eye(n);
    for (&(i, j), &c) in pairs.iter().zip(correlations.iter()) {
        values[[i, j]] = c;
        values[[j, i]] = c;
    }

    Ok(CorrelationMatrix {
        names: columns.to_vec(),
        values,
    })
}

/// Correlation of each feature with `target`, sorted ascending
///
/// Undefined correlations (constant feature) are reported as NaN and sort last.
pub fn target_correlations(
    df: &DataFrame,
    features: &[&str],
    target: &str,
) -> Result<Vec<(String, f64)>> {
    let y = numeric_column(df, target)?;

    let mut correlations: Vec<(String, f64)> = features
        .iter()
        .map(|&name| {
            let x = numeric_column(df, name)?;
            Ok((name.to_string(), pearson(&x, &y).unwrap_or(f64::NAN)))
        })
        .collect::<Result<_>>()?;

    correlations.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(correlations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [10.0, 8.0, 6.0, 4.0, 2.0];

        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_is_undefined() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_pearson_skips_nan_rows() {
        let x = [1.0, 2.0, f64::NAN, 3.0];
        let y = [1.0, 2.0, 100.0, 3.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let df = df! {
            "a" => [1.0f64, 2.0, 3.0, 4.0],
            "b" => [2.0f64, 4.0, 6.0, 8.1],
            "c" => [4.0f64, 1.0, 3.0, 2.0],
            "label" => ["x", "y", "z", "w"],
        }
        .unwrap();

        let names = numeric_column_names(&df);
        assert_eq!(names, vec!["a", "b", "c"]);

        let matrix = correlation_matrix(&df, &names).unwrap();
        assert_eq!(matrix.values.dim(), (3, 3));
        assert_eq!(matrix.values[[0, 0]], 1.0);
        assert_eq!(matrix.values[[0, 1]], matrix.values[[1, 0]]);

        let pairs = matrix.correlated_pairs(0.9);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].feature1, "a");
        assert_eq!(pairs[0].feature2, "b");
    }

    #[test]
    fn test_target_correlations_sorted_ascending() {
        let df = df! {
            "pos" => [1.0f64, 2.0, 3.0, 4.0],
            "neg" => [4.0f64, 3.0, 2.0, 1.0],
            "y" => [0i32, 0, 1, 1],
        }
        .unwrap();

        let corr = target_correlations(&df, &["pos", "neg"], "y").unwrap();
        assert_eq!(corr[0].0, "neg");
        assert_eq!(corr[1].0, "pos");
        assert!(corr[0].1 < 0.0 && corr[1].1 > 0.0);
    }
}
