//! Missing value analysis

use anyhow::Result;
use polars::prelude::*;

/// Count null values per column, returning only columns with at least one null
///
/// Sorted by null count descending, then by column name.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let mut missing: Vec<(String, usize)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .filter(|(_, nulls)| *nulls > 0)
        .collect();

    missing.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(missing)
}

/// Total number of null cells in the DataFrame
pub fn total_missing(missing: &[(String, usize)]) -> usize {
    missing.iter().map(|(_, n)| n).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_missing_values() {
        let df = df! {
            "complete" => [1.0f64, 2.0, 3.0],
            "one_missing" => [Some(1.0f64), None, Some(3.0)],
            "all_missing" => [None::<f64>, None, None],
        }
        .unwrap();

        let missing = analyze_missing_values(&df).unwrap();
        assert_eq!(
            missing,
            vec![("all_missing".to_string(), 3), ("one_missing".to_string(), 1)]
        );
        assert_eq!(total_missing(&missing), 4);
    }

    #[test]
    fn test_no_missing_values() {
        let df = df! {
            "a" => [1i64, 2],
        }
        .unwrap();

        assert!(analyze_missing_values(&df).unwrap().is_empty());
    }
}
