//! Derived feature engineering for both pipelines
//!
//! Every derived feature is a pure function of one employee row, except for
//! the few that reference a population aggregate (mean salary per job level,
//! median CTC). Those aggregates are computed once over the training frame,
//! kept in [`FeatureAggregates`] and broadcast per row, so a saved model
//! engineers a scoring batch against the population it was fitted on.
//! Division by zero is not guarded: IEEE infinities and NaNs propagate
//! exactly as the formulas produce them.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregate::{group_mean, mean, median, numeric_key, sample_std};
use super::correlation::pearson;
use super::loader::{numeric_column, put_numeric_column, require_columns, string_column};
use super::schema::*;

/// Role multiplier applied to roles absent from [`ROLE_MULTIPLIERS`]
pub const DEFAULT_ROLE_MULTIPLIER: f64 = 1.1;

/// Benefits and overhead multipliers per job role
pub const ROLE_MULTIPLIERS: [(&str, f64); 9] = [
    ("Manager", 1.2),
    ("Research Director", 1.3),
    ("Healthcare Representative", 1.15),
    ("Manufacturing Director", 1.25),
    ("Sales Executive", 1.18),
    ("Research Scientist", 1.15),
    ("Laboratory Technician", 1.12),
    ("Human Resources", 1.1),
    ("Sales Representative", 1.15),
];

/// Roles always flagged as critical
pub const CRITICAL_ROLES: [&str; 4] = [
    "Research Director",
    "Manager",
    "Manufacturing Director",
    "Healthcare Representative",
];

/// Job level at or above which every employee is critical
pub const CRITICAL_JOB_LEVEL: f64 = 4.0;

/// Names of the attrition pipeline's engineered features, in creation order
pub const ATTRITION_FEATURES: [&str; 10] = [
    SALARY_TO_JOB_LEVEL_RATIO,
    PROMOTION_RISK,
    COMMUTE_DIFFICULTY,
    RELATIVE_COMPENSATION,
    WORK_LIFE_IMBALANCE,
    GROWTH_OPPORTUNITY_INDEX,
    JOB_ENGAGEMENT,
    SATISFACTION_COMPOSITE,
    CAREER_ADVANCEMENT_RATIO,
    OVERTIME_DISTANCE_RISK,
];

/// Names of the retention pipeline's engineered features, in creation order
pub const RETENTION_FEATURES: [&str; 8] = [
    CTC,
    PERFORMANCE_RISK,
    RETENTION_PRIORITY_SCORE,
    CRITICAL_ROLE,
    SATISFACTION_COMPOSITE,
    ENGAGEMENT_SCORE,
    CAREER_GROWTH_POTENTIAL,
    PRODUCTIVITY_COST_RATIO,
];

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn is_overtime(value: &str) -> bool {
    value == "Yes"
}

/// Multiplier for a job role, falling back to [`DEFAULT_ROLE_MULTIPLIER`]
pub fn role_multiplier(job_role: &str) -> f64 {
    ROLE_MULTIPLIERS
        .iter()
        .find(|(role, _)| *role == job_role)
        .map(|(_, m)| *m)
        .unwrap_or(DEFAULT_ROLE_MULTIPLIER)
}

/// Annual cost to company including level-based benefits and role overhead
pub fn cost_to_company(monthly_income: f64, job_level: f64, job_role: &str) -> f64 {
    let base_annual = monthly_income * 12.0;
    let benefits_multiplier = 1.0 + job_level * 0.05;
    base_annual * benefits_multiplier * role_multiplier(job_role)
}

pub fn salary_to_job_level_ratio(monthly_income: f64, job_level: f64) -> f64 {
    monthly_income / job_level
}

pub fn promotion_risk(years_since_last_promotion: f64, years_at_company: f64) -> f64 {
    years_since_last_promotion / (years_at_company + 1.0)
}

pub fn commute_difficulty(distance_from_home: f64, monthly_income: f64) -> f64 {
    distance_from_home / monthly_income.ln_1p()
}

pub fn work_life_imbalance(work_life_balance: f64, over_time: &str) -> f64 {
    indicator(work_life_balance < 3.0) + indicator(is_overtime(over_time))
}

pub fn growth_opportunity_index(training_times_last_year: f64, years_since_last_promotion: f64) -> f64 {
    (training_times_last_year + 1.0) / (years_since_last_promotion + 1.0)
}

pub fn job_engagement(job_involvement: f64, job_satisfaction: f64) -> f64 {
    job_involvement * job_satisfaction
}

/// Mean of the four 1-4 survey scores
pub fn satisfaction_composite(
    job_satisfaction: f64,
    environment_satisfaction: f64,
    relationship_satisfaction: f64,
    work_life_balance: f64,
) -> f64 {
    (job_satisfaction + environment_satisfaction + relationship_satisfaction + work_life_balance)
        / 4.0
}

pub fn career_advancement_ratio(job_level: f64, total_working_years: f64) -> f64 {
    job_level / (total_working_years + 1.0)
}

pub fn overtime_distance_risk(over_time: &str, distance_from_home: f64) -> f64 {
    indicator(is_overtime(over_time)) * (1.0 + distance_from_home / 10.0)
}

/// Higher is riskier
pub fn performance_risk(
    performance_rating: f64,
    over_time: &str,
    years_since_last_promotion: f64,
    work_life_balance: f64,
) -> f64 {
    (5.0 - performance_rating)
        + 2.0 * indicator(is_overtime(over_time))
        + 1.5 * indicator(years_since_last_promotion > 2.0)
        + 1.5 * (4.0 - work_life_balance)
}

/// Higher is more valuable to retain
pub fn retention_priority_score(job_level: f64, performance_rating: f64, monthly_income: f64) -> f64 {
    (job_level + performance_rating) / monthly_income.ln_1p() * 100.0
}

pub fn critical_role(job_role: &str, job_level: f64) -> f64 {
    indicator(CRITICAL_ROLES.contains(&job_role) || job_level >= CRITICAL_JOB_LEVEL)
}

pub fn engagement_score(
    job_involvement: f64,
    environment_satisfaction: f64,
    job_satisfaction: f64,
) -> f64 {
    job_involvement * 0.4 + environment_satisfaction * 0.3 + job_satisfaction * 0.3
}

pub fn career_growth_potential(
    years_since_last_promotion: f64,
    training_times_last_year: f64,
    performance_rating: f64,
) -> f64 {
    (5.0 - years_since_last_promotion) * 0.4
        + training_times_last_year * 0.3
        + performance_rating * 0.3
}

/// Value for money relative to the median employee cost
pub fn productivity_cost_ratio(
    performance_rating: f64,
    job_involvement: f64,
    ctc: f64,
    median_ctc: f64,
) -> f64 {
    (performance_rating * job_involvement) / (ctc / median_ctc)
}

/// Population aggregates referenced by the row formulas
///
/// A job level absent from `level_mean_income` yields a NaN
/// `RelativeCompensation`, which the preprocessor encodes like any other
/// non-finite value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAggregates {
    /// Mean MonthlyIncome per JobLevel, keyed by [`numeric_key`]
    #[serde(default)]
    pub level_mean_income: BTreeMap<String, f64>,
    /// Median CTC of the population; `None` when no CTC was finite
    #[serde(default)]
    pub median_ctc: Option<f64>,
}

impl FeatureAggregates {
    /// Aggregates used by the attrition features
    pub fn for_attrition(df: &DataFrame) -> Result<Self> {
        require_columns(df, &[MONTHLY_INCOME, JOB_LEVEL])?;
        let income = numeric_column(df, MONTHLY_INCOME)?;
        let keys: Vec<String> = numeric_column(df, JOB_LEVEL)?
            .iter()
            .map(|&l| numeric_key(l))
            .collect();

        Ok(Self {
            level_mean_income: group_mean(&keys, &income)
                .into_iter()
                .map(|g| (g.group, g.mean))
                .collect(),
            median_ctc: None,
        })
    }

    /// Aggregates used by the retention features
    pub fn for_retention(df: &DataFrame) -> Result<Self> {
        require_columns(df, &[MONTHLY_INCOME, JOB_LEVEL, JOB_ROLE])?;
        let m = median(&ctc_column(df)?);
        Ok(Self {
            level_mean_income: BTreeMap::new(),
            median_ctc: m.is_finite().then_some(m),
        })
    }

    fn level_mean(&self, job_level: f64) -> f64 {
        self.level_mean_income
            .get(&numeric_key(job_level))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

fn ctc_column(df: &DataFrame) -> Result<Vec<f64>> {
    let income = numeric_column(df, MONTHLY_INCOME)?;
    let level = numeric_column(df, JOB_LEVEL)?;
    let role = string_column(df, JOB_ROLE)?;
    Ok((0..df.height())
        .map(|i| cost_to_company(income[i], level[i], &role[i]))
        .collect())
}

/// Descriptive statistics of one engineered feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    pub mean: f64,
    pub std: f64,
    /// Pearson correlation with the binary target, if a target was given
    pub target_correlation: Option<f64>,
}

/// Add the ten attrition features to `df`, taking the population
/// aggregates from `df` itself
///
/// Returns the aggregates so they can be frozen into a model artifact.
pub fn engineer_attrition_features(df: &mut DataFrame) -> Result<FeatureAggregates> {
    require_columns(df, &ATTRITION_FEATURE_INPUTS)?;
    let aggregates = FeatureAggregates::for_attrition(df)?;
    apply_attrition_features(df, &aggregates)?;
    Ok(aggregates)
}

/// Add the ten attrition features to `df` against precomputed aggregates
pub fn apply_attrition_features(df: &mut DataFrame, aggregates: &FeatureAggregates) -> Result<()> {
    require_columns(df, &ATTRITION_FEATURE_INPUTS)?;

    let income = numeric_column(df, MONTHLY_INCOME)?;
    let level = numeric_column(df, JOB_LEVEL)?;
    let yslp = numeric_column(df, YEARS_SINCE_LAST_PROMOTION)?;
    let yac = numeric_column(df, YEARS_AT_COMPANY)?;
    let distance = numeric_column(df, DISTANCE_FROM_HOME)?;
    let wlb = numeric_column(df, WORK_LIFE_BALANCE)?;
    let overtime = string_column(df, OVER_TIME)?;
    let training = numeric_column(df, TRAINING_TIMES_LAST_YEAR)?;
    let involvement = numeric_column(df, JOB_INVOLVEMENT)?;
    let job_sat = numeric_column(df, JOB_SATISFACTION)?;
    let env_sat = numeric_column(df, ENVIRONMENT_SATISFACTION)?;
    let rel_sat = numeric_column(df, RELATIONSHIP_SATISFACTION)?;
    let total_years = numeric_column(df, TOTAL_WORKING_YEARS)?;

    let n = df.height();

    let level_avg_income: Vec<f64> = level.iter().map(|&l| aggregates.level_mean(l)).collect();

    let columns: [(&str, Vec<f64>); 10] = [
        (
            SALARY_TO_JOB_LEVEL_RATIO,
            (0..n).map(|i| salary_to_job_level_ratio(income[i], level[i])).collect(),
        ),
        (
            PROMOTION_RISK,
            (0..n).map(|i| promotion_risk(yslp[i], yac[i])).collect(),
        ),
        (
            COMMUTE_DIFFICULTY,
            (0..n).map(|i| commute_difficulty(distance[i], income[i])).collect(),
        ),
        (
            RELATIVE_COMPENSATION,
            (0..n).map(|i| income[i] / level_avg_income[i]).collect(),
        ),
        (
            WORK_LIFE_IMBALANCE,
            (0..n).map(|i| work_life_imbalance(wlb[i], &overtime[i])).collect(),
        ),
        (
            GROWTH_OPPORTUNITY_INDEX,
            (0..n).map(|i| growth_opportunity_index(training[i], yslp[i])).collect(),
        ),
        (
            JOB_ENGAGEMENT,
            (0..n).map(|i| job_engagement(involvement[i], job_sat[i])).collect(),
        ),
        (
            SATISFACTION_COMPOSITE,
            (0..n)
                .map(|i| satisfaction_composite(job_sat[i], env_sat[i], rel_sat[i], wlb[i]))
                .collect(),
        ),
        (
            CAREER_ADVANCEMENT_RATIO,
            (0..n).map(|i| career_advancement_ratio(level[i], total_years[i])).collect(),
        ),
        (
            OVERTIME_DISTANCE_RISK,
            (0..n).map(|i| overtime_distance_risk(&overtime[i], distance[i])).collect(),
        ),
    ];

    for (name, values) in columns {
        put_numeric_column(df, name, values)?;
    }

    Ok(())
}

/// Add the eight retention features to `df`, taking the CTC median used by
/// `ProductivityCostRatio` over every row of `df`
pub fn engineer_retention_features(df: &mut DataFrame) -> Result<FeatureAggregates> {
    require_columns(df, &RETENTION_FEATURE_INPUTS)?;
    let aggregates = FeatureAggregates::for_retention(df)?;
    apply_retention_features(df, &aggregates)?;
    Ok(aggregates)
}

/// Add the eight retention features to `df` against precomputed aggregates
pub fn apply_retention_features(df: &mut DataFrame, aggregates: &FeatureAggregates) -> Result<()> {
    require_columns(df, &RETENTION_FEATURE_INPUTS)?;

    let income = numeric_column(df, MONTHLY_INCOME)?;
    let level = numeric_column(df, JOB_LEVEL)?;
    let role = string_column(df, JOB_ROLE)?;
    let rating = numeric_column(df, PERFORMANCE_RATING)?;
    let overtime = string_column(df, OVER_TIME)?;
    let yslp = numeric_column(df, YEARS_SINCE_LAST_PROMOTION)?;
    let wlb = numeric_column(df, WORK_LIFE_BALANCE)?;
    let involvement = numeric_column(df, JOB_INVOLVEMENT)?;
    let job_sat = numeric_column(df, JOB_SATISFACTION)?;
    let env_sat = numeric_column(df, ENVIRONMENT_SATISFACTION)?;
    let rel_sat = numeric_column(df, RELATIONSHIP_SATISFACTION)?;
    let training = numeric_column(df, TRAINING_TIMES_LAST_YEAR)?;

    let n = df.height();

    let ctc = ctc_column(df)?;
    let median_ctc = aggregates.median_ctc.unwrap_or(f64::NAN);

    let columns: [(&str, Vec<f64>); 8] = [
        (
            PERFORMANCE_RISK,
            (0..n)
                .map(|i| performance_risk(rating[i], &overtime[i], yslp[i], wlb[i]))
                .collect(),
        ),
        (
            RETENTION_PRIORITY_SCORE,
            (0..n)
                .map(|i| retention_priority_score(level[i], rating[i], income[i]))
                .collect(),
        ),
        (
            CRITICAL_ROLE,
            (0..n).map(|i| critical_role(&role[i], level[i])).collect(),
        ),
        (
            SATISFACTION_COMPOSITE,
            (0..n)
                .map(|i| satisfaction_composite(job_sat[i], env_sat[i], rel_sat[i], wlb[i]))
                .collect(),
        ),
        (
            ENGAGEMENT_SCORE,
            (0..n)
                .map(|i| engagement_score(involvement[i], env_sat[i], job_sat[i]))
                .collect(),
        ),
        (
            CAREER_GROWTH_POTENTIAL,
            (0..n)
                .map(|i| career_growth_potential(yslp[i], training[i], rating[i]))
                .collect(),
        ),
        (
            PRODUCTIVITY_COST_RATIO,
            (0..n)
                .map(|i| productivity_cost_ratio(rating[i], involvement[i], ctc[i], median_ctc))
                .collect(),
        ),
        (CTC, ctc),
    ];

    for (name, values) in columns {
        put_numeric_column(df, name, values)?;
    }

    Ok(())
}

/// Mean, sample std and (optionally) target correlation of each feature
///
/// With a target, rows are ordered by correlation ascending; features with
/// an undefined correlation come last.
pub fn summarize_features(
    df: &DataFrame,
    features: &[&str],
    target: Option<&str>,
) -> Result<Vec<FeatureSummary>> {
    let target_values = match target {
        Some(name) => Some(numeric_column(df, name)?),
        None => None,
    };

    let mut summaries = features
        .iter()
        .map(|&name| {
            let values = numeric_column(df, name)?;
            Ok(FeatureSummary {
                name: name.to_string(),
                mean: mean(&values),
                std: sample_std(&values),
                target_correlation: target_values.as_ref().and_then(|t| pearson(&values, t)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if target.is_some() {
        summaries.sort_by(|a, b| match (a.target_correlation, b.target_correlation) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctc_manager_example() {
        let ctc = cost_to_company(5000.0, 3.0, "Manager");
        assert!((ctc - 82_800.0).abs() < 1e-6, "got {}", ctc);
    }

    #[test]
    fn test_ctc_unlisted_role_uses_default_multiplier() {
        let ctc = cost_to_company(1000.0, 1.0, "Astronaut");
        assert!((ctc - 1000.0 * 12.0 * 1.05 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_work_life_imbalance_example() {
        assert_eq!(work_life_imbalance(2.0, "Yes"), 2.0);
        assert_eq!(work_life_imbalance(3.0, "Yes"), 1.0);
        assert_eq!(work_life_imbalance(2.0, "No"), 1.0);
        assert_eq!(work_life_imbalance(4.0, "No"), 0.0);
    }

    #[test]
    fn test_performance_risk() {
        // (5-3) + 2 + 1.5 + 1.5*(4-2) = 8.5
        assert_eq!(performance_risk(3.0, "Yes", 3.0, 2.0), 8.5);
        // (5-4) + 0 + 0 + 0 = 1
        assert_eq!(performance_risk(4.0, "No", 2.0, 4.0), 1.0);
    }

    #[test]
    fn test_retention_priority_score() {
        let score = retention_priority_score(2.0, 3.0, 5000.0);
        assert!((score - 5.0 / 5001.0f64.ln() * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_promotion_risk_and_ratios() {
        assert_eq!(promotion_risk(4.0, 7.0), 0.5);
        assert_eq!(salary_to_job_level_ratio(6000.0, 2.0), 3000.0);
        assert_eq!(growth_opportunity_index(3.0, 1.0), 2.0);
        assert_eq!(career_advancement_ratio(2.0, 9.0), 0.2);
        assert_eq!(overtime_distance_risk("Yes", 10.0), 2.0);
        assert_eq!(overtime_distance_risk("No", 10.0), 0.0);
    }

    #[test]
    fn test_critical_role() {
        assert_eq!(critical_role("Manager", 1.0), 1.0);
        assert_eq!(critical_role("Sales Executive", 4.0), 1.0);
        assert_eq!(critical_role("Sales Executive", 3.0), 0.0);
    }

    #[test]
    fn test_division_by_zero_is_not_guarded() {
        assert!(salary_to_job_level_ratio(5000.0, 0.0).is_infinite());
    }

    #[test]
    fn test_engagement_and_growth() {
        assert!((engagement_score(4.0, 4.0, 4.0) - 4.0).abs() < 1e-12);
        assert!((career_growth_potential(0.0, 2.0, 3.0) - (2.0 + 0.6 + 0.9)).abs() < 1e-12);
    }

    #[test]
    fn test_productivity_cost_ratio_at_median_cost() {
        assert_eq!(productivity_cost_ratio(3.0, 2.0, 50_000.0, 50_000.0), 6.0);
    }

    #[test]
    fn test_summaries_sorted_by_target_correlation() {
        let df = df! {
            "up" => [1.0f64, 2.0, 3.0, 4.0],
            "down" => [4.0f64, 3.0, 2.0, 1.0],
            "flat" => [1.0f64, 1.0, 1.0, 1.0],
            "target" => [0i32, 0, 1, 1],
        }
        .unwrap();

        let summaries = summarize_features(&df, &["flat", "up", "down"], Some("target")).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["down", "up", "flat"]);
        assert!(summaries[2].target_correlation.is_none());

        let unsorted = summarize_features(&df, &["flat", "up"], None).unwrap();
        assert_eq!(unsorted[0].name, "flat");
        assert!((unsorted[1].std - 1.2909944487358056).abs() < 1e-12);
    }

    fn employees() -> DataFrame {
        df! {
            MONTHLY_INCOME => [3000i64, 5000, 4000, 9000],
            JOB_LEVEL => [1i64, 1, 2, 2],
            JOB_ROLE => ["Sales Executive", "Manager", "Research Scientist", "Manager"],
            PERFORMANCE_RATING => [3i64, 4, 3, 3],
            OVER_TIME => ["Yes", "No", "No", "Yes"],
            YEARS_SINCE_LAST_PROMOTION => [1i64, 3, 0, 5],
            YEARS_AT_COMPANY => [2i64, 6, 1, 10],
            DISTANCE_FROM_HOME => [5i64, 12, 3, 20],
            WORK_LIFE_BALANCE => [2i64, 3, 4, 1],
            TRAINING_TIMES_LAST_YEAR => [2i64, 3, 1, 4],
            JOB_INVOLVEMENT => [3i64, 2, 4, 3],
            JOB_SATISFACTION => [4i64, 2, 3, 1],
            ENVIRONMENT_SATISFACTION => [3i64, 3, 2, 4],
            RELATIONSHIP_SATISFACTION => [2i64, 4, 3, 3],
            TOTAL_WORKING_YEARS => [4i64, 10, 2, 15],
        }
        .unwrap()
    }

    #[test]
    fn test_attrition_aggregates_group_income_by_level() {
        let mut df = employees();
        let aggregates = engineer_attrition_features(&mut df).unwrap();
        assert_eq!(aggregates.level_mean_income.get("1"), Some(&4000.0));
        assert_eq!(aggregates.level_mean_income.get("2"), Some(&6500.0));

        let relative = numeric_column(&df, RELATIVE_COMPENSATION).unwrap();
        assert_eq!(relative[0], 0.75);
        assert_eq!(relative[3], 9000.0 / 6500.0);
    }

    #[test]
    fn test_frozen_aggregates_make_rows_independent_of_batch() {
        let mut full = employees();
        let attrition = engineer_attrition_features(&mut full).unwrap();
        let retention = engineer_retention_features(&mut full).unwrap();

        let mut single = employees().slice(3, 1);
        apply_attrition_features(&mut single, &attrition).unwrap();
        apply_retention_features(&mut single, &retention).unwrap();

        for name in ATTRITION_FEATURES.iter().chain(RETENTION_FEATURES.iter()) {
            let batch = numeric_column(&full, name).unwrap()[3];
            let alone = numeric_column(&single, name).unwrap()[0];
            assert_eq!(batch, alone, "{} changed when scored alone", name);
        }
        assert_ne!(numeric_column(&single, RELATIVE_COMPENSATION).unwrap()[0], 1.0);
    }

    #[test]
    fn test_unseen_job_level_gives_nan_relative_compensation() {
        let mut df = employees();
        let aggregates = FeatureAggregates::for_attrition(&df.slice(0, 2)).unwrap();
        apply_attrition_features(&mut df, &aggregates).unwrap();
        let relative = numeric_column(&df, RELATIVE_COMPENSATION).unwrap();
        assert!(relative[0].is_finite());
        assert!(relative[2].is_nan());
    }

    #[test]
    fn test_aggregates_survive_json() {
        let mut df = employees();
        let aggregates = engineer_retention_features(&mut df).unwrap();
        assert!(aggregates.median_ctc.is_some());
        let json = serde_json::to_string(&aggregates).unwrap();
        let back: FeatureAggregates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, aggregates);
    }
}
