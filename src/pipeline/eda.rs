//! Exploratory analysis of the attrition dataset
//!
//! Computes the group attrition rates, distributions and correlation matrix
//! behind the exploration charts, plus the short list of printed insights.

use anyhow::Result;
use polars::prelude::*;

use super::aggregate::{group_mean, mean, numeric_key, GroupStat};
use super::correlation::{correlation_matrix, numeric_column_names, CorrelationMatrix};
use super::loader::{numeric_column, string_column};
use super::schema::*;

/// Five-number summary used by the income box plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    /// Quartiles by linear interpolation between order statistics; `None` if empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Linear-interpolated quantile of already sorted, non-empty values
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Everything the exploration step prints and plots
#[derive(Debug, Clone)]
pub struct EdaReport {
    /// Overall attrition rate in percent
    pub overall_rate: f64,
    /// Attrition rate in percent per department, ordered by name
    pub department_rates: Vec<GroupStat>,
    pub role_rates: Vec<GroupStat>,
    pub overtime_rates: Vec<GroupStat>,
    pub work_life_rates: Vec<GroupStat>,
    pub ages_stayed: Vec<f64>,
    pub ages_left: Vec<f64>,
    pub income_stayed: Option<BoxStats>,
    pub income_left: Option<BoxStats>,
    pub correlations: CorrelationMatrix,
}

/// Attrition rate (percent) per distinct value of `keys`
pub fn attrition_rate_by<K: AsRef<str>>(keys: &[K], target: &[f64]) -> Vec<GroupStat> {
    group_mean(keys, target)
        .into_iter()
        .map(|g| GroupStat {
            mean: g.mean * 100.0,
            ..g
        })
        .collect()
}

fn split_by_target(values: &[f64], target: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut stayed = Vec::new();
    let mut left = Vec::new();
    for (&v, &t) in values.iter().zip(target.iter()) {
        if t == 1.0 {
            left.push(v);
        } else {
            stayed.push(v);
        }
    }
    (stayed, left)
}

/// Run the exploration over a frame that already carries `AttritionBinary`
pub fn explore(df: &DataFrame) -> Result<EdaReport> {
    let target = numeric_column(df, ATTRITION_BINARY)?;

    let departments = string_column(df, DEPARTMENT)?;
    let roles = string_column(df, JOB_ROLE)?;
    let overtime = string_column(df, OVER_TIME)?;
    let wlb_keys: Vec<String> = numeric_column(df, WORK_LIFE_BALANCE)?
        .into_iter()
        .map(numeric_key)
        .collect();

    let (ages_stayed, ages_left) = split_by_target(&numeric_column(df, AGE)?, &target);
    let (income_stayed, income_left) =
        split_by_target(&numeric_column(df, MONTHLY_INCOME)?, &target);

    let correlations = correlation_matrix(df, &numeric_column_names(df))?;

    Ok(EdaReport {
        overall_rate: mean(&target) * 100.0,
        department_rates: attrition_rate_by(&departments, &target),
        role_rates: attrition_rate_by(&roles, &target),
        overtime_rates: attrition_rate_by(&overtime, &target),
        work_life_rates: attrition_rate_by(&wlb_keys, &target),
        ages_stayed,
        ages_left,
        income_stayed: BoxStats::from_values(&income_stayed),
        income_left: BoxStats::from_values(&income_left),
        correlations,
    })
}

fn highest(stats: &[GroupStat]) -> Option<&GroupStat> {
    stats.iter().fold(None, |best: Option<&GroupStat>, s| match best {
        Some(b) if b.mean >= s.mean => Some(b),
        _ => Some(s),
    })
}

fn lowest(stats: &[GroupStat]) -> Option<&GroupStat> {
    stats.iter().fold(None, |best: Option<&GroupStat>, s| match best {
        Some(b) if b.mean <= s.mean => Some(b),
        _ => Some(s),
    })
}

impl EdaReport {
    /// Human-readable key insights, one line each
    pub fn insights(&self) -> Vec<String> {
        let mut lines = vec![format!("Overall attrition rate: {:.2}%", self.overall_rate)];

        if let Some(d) = highest(&self.department_rates) {
            lines.push(format!(
                "Department with highest attrition: {} ({:.2}%)",
                d.group, d.mean
            ));
        }
        if let Some(d) = lowest(&self.department_rates) {
            lines.push(format!(
                "Department with lowest attrition: {} ({:.2}%)",
                d.group, d.mean
            ));
        }
        if let Some(r) = highest(&self.role_rates) {
            lines.push(format!(
                "Job role with highest attrition: {} ({:.2}%)",
                r.group, r.mean
            ));
        }
        for (label, key) in [("Overtime", "Yes"), ("Non-overtime", "No")] {
            if let Some(g) = self.overtime_rates.iter().find(|g| g.group == key) {
                lines.push(format!("{} attrition rate: {:.2}%", label, g.mean));
            }
        }

        lines
    }
}
