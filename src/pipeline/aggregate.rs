//! Population aggregates: means, medians and group-by reductions
//!
//! Aggregates are computed once over a full column and then broadcast or
//! reported; nothing here keeps state between calls.

use std::collections::BTreeMap;

use serde::Serialize;

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN for fewer than 2 values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator); NaN for an empty slice
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Median; the mean of the two middle values for an even count
///
/// NaN values are ignored. Returns NaN when nothing remains.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean and count of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub group: String,
    pub mean: f64,
    pub count: usize,
}

/// Group `values` by `keys` and compute the mean and count of each group
///
/// Groups come back ordered by key.
pub fn group_mean<K: AsRef<str>>(keys: &[K], values: &[f64]) -> Vec<GroupStat> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values.iter()) {
        let entry = acc.entry(key.as_ref()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    acc.into_iter()
        .map(|(group, (sum, count))| GroupStat {
            group: group.to_string(),
            mean: sum / count as f64,
            count,
        })
        .collect()
}

/// Sort group statistics by mean, highest first
pub fn sort_by_mean_desc(stats: &mut [GroupStat]) {
    stats.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.group.cmp(&b.group)));
}

/// Render a numeric group key without a trailing `.0` for whole numbers
pub fn numeric_key(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_median_ignores_nan() {
        assert_eq!(median(&[f64::NAN, 5.0, 1.0]), 3.0);
    }

    #[test]
    fn test_std_variants() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&values) - 2.0).abs() < 1e-12);
        assert!((sample_std(&values) - 2.138089935299395).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_group_mean_sorted_by_key() {
        let keys = ["b", "a", "b", "a", "c"];
        let values = [2.0, 1.0, 4.0, 3.0, 10.0];

        let stats = group_mean(&keys, &values);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].group, "a");
        assert_eq!(stats[0].mean, 2.0);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].mean, 3.0);
        assert_eq!(stats[2].count, 1);
    }

    #[test]
    fn test_sort_by_mean_desc() {
        let mut stats = group_mean(&["x", "y", "z"], &[0.2, 0.9, 0.5]);
        sort_by_mean_desc(&mut stats);
        let order: Vec<&str> = stats.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(order, vec!["y", "z", "x"]);
    }

    #[test]
    fn test_numeric_key() {
        assert_eq!(numeric_key(3.0), "3");
        assert_eq!(numeric_key(2.5), "2.5");
    }
}
