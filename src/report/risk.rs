//! Risk bucketing and per-group risk analysis
//!
//! Probabilities are discretized with fixed thresholds. The buckets are
//! half-open and ordered, so a higher probability never lands in a lower
//! bucket.

use std::fmt;

use serde::Serialize;

use crate::pipeline::aggregate::{group_mean, mean, numeric_key, sort_by_mean_desc, GroupStat};

/// Attrition risk bucket: `[0, 0.3)`, `[0.3, 0.6)`, `[0.6, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High];

    pub fn from_probability(p: f64) -> Self {
        if p < 0.3 {
            RiskCategory::Low
        } else if p < 0.6 {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Medium => "Medium Risk",
            RiskCategory::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Retention risk bucket: `[0, 0.3)`, `[0.3, 0.7)`, `[0.7, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RetentionRiskCategory {
    Keep,
    Medium,
    LetGo,
}

impl RetentionRiskCategory {
    pub const ALL: [RetentionRiskCategory; 3] = [
        RetentionRiskCategory::Keep,
        RetentionRiskCategory::Medium,
        RetentionRiskCategory::LetGo,
    ];

    pub fn from_probability(p: f64) -> Self {
        if p < 0.3 {
            RetentionRiskCategory::Keep
        } else if p < 0.7 {
            RetentionRiskCategory::Medium
        } else {
            RetentionRiskCategory::LetGo
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RetentionRiskCategory::Keep => "Low Risk (Keep)",
            RetentionRiskCategory::Medium => "Medium Risk",
            RetentionRiskCategory::LetGo => "High Risk (Let Go)",
        }
    }
}

impl fmt::Display for RetentionRiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Count and share of one bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Counts per bucket in bucket order, including empty buckets
pub fn bucket_distribution<T: Copy + PartialEq + fmt::Display>(
    all: &[T],
    assigned: &[T],
) -> Vec<BucketCount> {
    let total = assigned.len();
    all.iter()
        .map(|bucket| {
            let count = assigned.iter().filter(|a| *a == bucket).count();
            BucketCount {
                label: bucket.to_string(),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
            }
        })
        .collect()
}

/// Mean probability and head count per group, highest mean first
pub fn group_risk<K: AsRef<str>>(keys: &[K], probabilities: &[f64]) -> Vec<GroupStat> {
    let mut stats = group_mean(keys, probabilities);
    sort_by_mean_desc(&mut stats);
    stats
}

/// A column value compared between high-risk employees and everyone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorComparison {
    pub factor: String,
    pub overall: f64,
    pub high_risk: f64,
    /// `(high_risk - overall) / overall` in percent
    pub difference_pct: f64,
    /// Values are percentages (share of "Yes") rather than means
    pub is_percentage: bool,
}

impl FactorComparison {
    pub fn new(factor: &str, overall: f64, high_risk: f64, is_percentage: bool) -> Self {
        Self {
            factor: factor.to_string(),
            overall,
            high_risk,
            difference_pct: (high_risk - overall) / overall * 100.0,
            is_percentage,
        }
    }

    /// Compare means of a numeric column over all rows and the `high` mask
    pub fn numeric(factor: &str, values: &[f64], high: &[bool]) -> Self {
        let selected: Vec<f64> = values
            .iter()
            .zip(high.iter())
            .filter(|(_, &h)| h)
            .map(|(&v, _)| v)
            .collect();
        Self::new(factor, mean(values), mean(&selected), false)
    }

    /// Compare the share of `flag` values over all rows and the `high` mask
    pub fn share(factor: &str, values: &[String], flag: &str, high: &[bool]) -> Self {
        let pct = |rows: Vec<&String>| {
            if rows.is_empty() {
                f64::NAN
            } else {
                rows.iter().filter(|v| v.as_str() == flag).count() as f64 / rows.len() as f64
                    * 100.0
            }
        };
        let overall = pct(values.iter().collect());
        let high_risk = pct(
            values
                .iter()
                .zip(high.iter())
                .filter(|(_, &h)| h)
                .map(|(v, _)| v)
                .collect(),
        );
        Self::new(factor, overall, high_risk, true)
    }
}

/// Head count and Let Go percentage of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetGoShare {
    pub group: String,
    pub employees: usize,
    pub let_go_pct: f64,
}

/// Let Go share per group from 0/1 recommendations, highest share first
///
/// Ties keep group key order.
pub fn let_go_by_group<K: AsRef<str>>(keys: &[K], recommendations: &[f64]) -> Vec<LetGoShare> {
    let mut stats = group_mean(keys, recommendations);
    sort_by_mean_desc(&mut stats);
    stats
        .into_iter()
        .map(|g| LetGoShare {
            group: g.group,
            employees: g.count,
            let_go_pct: g.mean * 100.0,
        })
        .collect()
}

/// Let Go share per numeric level, sorted by level value
pub fn let_go_by_level(levels: &[f64], recommendations: &[f64]) -> Vec<LetGoShare> {
    let keys: Vec<String> = levels.iter().map(|&l| numeric_key(l)).collect();
    let mut shares = let_go_by_group(&keys, recommendations);
    shares.sort_by(|a, b| {
        let a_level = a.group.parse::<f64>().unwrap_or(f64::NAN);
        let b_level = b.group.parse::<f64>().unwrap_or(f64::NAN);
        a_level.total_cmp(&b_level)
    });
    shares
}

/// Annual cost before and after acting on the recommendations
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostAnalysis {
    pub current_cost: f64,
    pub retained_cost: f64,
    pub savings: f64,
    pub savings_pct: f64,
}

impl CostAnalysis {
    /// `recommendations` are 0 = keep, 1 = let go
    pub fn from_recommendations(ctc: &[f64], recommendations: &[f64]) -> Self {
        let current_cost: f64 = ctc.iter().sum();
        let retained_cost: f64 = ctc
            .iter()
            .zip(recommendations.iter())
            .filter(|(_, &r)| r == 0.0)
            .map(|(&c, _)| c)
            .sum();
        let savings = current_cost - retained_cost;
        Self {
            current_cost,
            retained_cost,
            savings,
            savings_pct: if current_cost == 0.0 {
                0.0
            } else {
                savings / current_cost * 100.0
            },
        }
    }
}
