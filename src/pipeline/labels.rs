//! Keep / Let Go label synthesis for the retention pipeline
//!
//! The label is produced by a fixed cascade of business rules over the
//! engineered retention features. The three medians the rules reference are
//! computed once over the whole dataset before any rule is evaluated.

use std::fmt;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregate::median;
use super::loader::{numeric_column, require_columns};
use super::schema::*;

/// Basis the label medians were computed over, recorded in run metadata
pub const LABEL_MEDIAN_BASIS: &str = "full_dataset";

/// Outcome of the rule cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetentionDecision {
    Keep,
    LetGo,
}

impl RetentionDecision {
    /// Binary encoding used as the model target (Let Go is the event)
    pub fn as_label(self) -> i32 {
        match self {
            RetentionDecision::Keep => 0,
            RetentionDecision::LetGo => 1,
        }
    }

    pub fn from_label(label: i32) -> Self {
        if label == 1 {
            RetentionDecision::LetGo
        } else {
            RetentionDecision::Keep
        }
    }
}

impl fmt::Display for RetentionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionDecision::Keep => write!(f, "Keep"),
            RetentionDecision::LetGo => write!(f, "Let Go"),
        }
    }
}

/// Population medians referenced by rules 2 and 4
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelMedians {
    pub ctc: f64,
    pub productivity_cost_ratio: f64,
    pub retention_priority_score: f64,
}

impl LabelMedians {
    /// Medians over every row of `df`
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            ctc: median(&numeric_column(df, CTC)?),
            productivity_cost_ratio: median(&numeric_column(df, PRODUCTIVITY_COST_RATIO)?),
            retention_priority_score: median(&numeric_column(df, RETENTION_PRIORITY_SCORE)?),
        })
    }
}

/// The row fields the rule cascade reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInputs {
    pub critical_role: f64,
    pub attrition: f64,
    pub performance_risk: f64,
    pub performance_rating: f64,
    pub ctc: f64,
    pub productivity_cost_ratio: f64,
    pub engagement_score: f64,
    pub satisfaction_composite: f64,
    pub retention_priority_score: f64,
}

/// Apply the rule cascade to one employee; the first matching rule wins
pub fn decide(row: &DecisionInputs, medians: &LabelMedians) -> RetentionDecision {
    if row.critical_role == 1.0 {
        return RetentionDecision::Keep;
    }

    if (row.attrition == 1.0 || row.performance_risk > 5.0)
        && row.performance_rating <= 3.0
        && row.ctc > medians.ctc
        && row.productivity_cost_ratio < medians.productivity_cost_ratio
    {
        return RetentionDecision::LetGo;
    }

    if row.performance_rating >= 4.0
        || (row.engagement_score >= 4.0 && row.satisfaction_composite >= 3.5)
    {
        return RetentionDecision::Keep;
    }

    if row.retention_priority_score < medians.retention_priority_score {
        RetentionDecision::LetGo
    } else {
        RetentionDecision::Keep
    }
}

/// Label counts and the cost released by the Let Go rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelSummary {
    pub keep: usize,
    pub let_go: usize,
    /// Sum of CTC over Let Go rows
    pub potential_savings: f64,
}

impl LabelSummary {
    pub fn let_go_pct(&self) -> f64 {
        let total = self.keep + self.let_go;
        if total == 0 {
            0.0
        } else {
            self.let_go as f64 / total as f64 * 100.0
        }
    }
}

/// Compute medians, evaluate every row and append the `RetentionDecision`
/// column (0 = Keep, 1 = Let Go)
pub fn synthesize_labels(df: &mut DataFrame) -> Result<(LabelMedians, LabelSummary)> {
    require_columns(
        df,
        &[
            CRITICAL_ROLE,
            ATTRITION_BINARY,
            PERFORMANCE_RISK,
            PERFORMANCE_RATING,
            CTC,
            PRODUCTIVITY_COST_RATIO,
            ENGAGEMENT_SCORE,
            SATISFACTION_COMPOSITE,
            RETENTION_PRIORITY_SCORE,
        ],
    )?;

    let medians = LabelMedians::from_frame(df)?;

    let critical = numeric_column(df, CRITICAL_ROLE)?;
    let attrition = numeric_column(df, ATTRITION_BINARY)?;
    let perf_risk = numeric_column(df, PERFORMANCE_RISK)?;
    let rating = numeric_column(df, PERFORMANCE_RATING)?;
    let ctc = numeric_column(df, CTC)?;
    let ratio = numeric_column(df, PRODUCTIVITY_COST_RATIO)?;
    let engagement = numeric_column(df, ENGAGEMENT_SCORE)?;
    let satisfaction = numeric_column(df, SATISFACTION_COMPOSITE)?;
    let priority = numeric_column(df, RETENTION_PRIORITY_SCORE)?;

    let mut summary = LabelSummary {
        keep: 0,
        let_go: 0,
        potential_savings: 0.0,
    };

    let labels: Vec<i32> = (0..df.height())
        .map(|i| {
            let row = DecisionInputs {
                critical_role: critical[i],
                attrition: attrition[i],
                performance_risk: perf_risk[i],
                performance_rating: rating[i],
                ctc: ctc[i],
                productivity_cost_ratio: ratio[i],
                engagement_score: engagement[i],
                satisfaction_composite: satisfaction[i],
                retention_priority_score: priority[i],
            };
            let decision = decide(&row, &medians);
            match decision {
                RetentionDecision::Keep => summary.keep += 1,
                RetentionDecision::LetGo => {
                    summary.let_go += 1;
                    summary.potential_savings += ctc[i];
                }
            }
            decision.as_label()
        })
        .collect();

    df.with_column(Column::new(RETENTION_DECISION.into(), labels))?;

    Ok((medians, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medians() -> LabelMedians {
        LabelMedians {
            ctc: 60_000.0,
            productivity_cost_ratio: 9.0,
            retention_priority_score: 50.0,
        }
    }

    fn base_row() -> DecisionInputs {
        DecisionInputs {
            critical_role: 0.0,
            attrition: 0.0,
            performance_risk: 3.0,
            performance_rating: 3.0,
            ctc: 50_000.0,
            productivity_cost_ratio: 10.0,
            engagement_score: 2.5,
            satisfaction_composite: 2.5,
            retention_priority_score: 60.0,
        }
    }

    #[test]
    fn test_critical_role_always_kept() {
        let row = DecisionInputs {
            critical_role: 1.0,
            attrition: 1.0,
            performance_risk: 9.0,
            ctc: 1e6,
            productivity_cost_ratio: 0.1,
            retention_priority_score: 0.0,
            ..base_row()
        };
        assert_eq!(decide(&row, &medians()), RetentionDecision::Keep);
    }

    #[test]
    fn test_expensive_underperformer_let_go() {
        let row = DecisionInputs {
            attrition: 1.0,
            ctc: 80_000.0,
            productivity_cost_ratio: 5.0,
            ..base_row()
        };
        assert_eq!(decide(&row, &medians()), RetentionDecision::LetGo);

        // High performance risk substitutes for attrition
        let row = DecisionInputs {
            performance_risk: 6.0,
            ..row
        };
        assert_eq!(decide(&row, &medians()), RetentionDecision::LetGo);
    }

    #[test]
    fn test_high_performer_kept() {
        let row = DecisionInputs {
            performance_rating: 4.0,
            retention_priority_score: 0.0,
            ..base_row()
        };
        assert_eq!(decide(&row, &medians()), RetentionDecision::Keep);

        let engaged = DecisionInputs {
            engagement_score: 4.0,
            satisfaction_composite: 3.5,
            retention_priority_score: 0.0,
            ..base_row()
        };
        assert_eq!(decide(&engaged, &medians()), RetentionDecision::Keep);
    }

    #[test]
    fn test_fallback_on_priority_median() {
        let low = DecisionInputs {
            retention_priority_score: 40.0,
            ..base_row()
        };
        assert_eq!(decide(&low, &medians()), RetentionDecision::LetGo);

        let at_median = DecisionInputs {
            retention_priority_score: 50.0,
            ..base_row()
        };
        assert_eq!(decide(&at_median, &medians()), RetentionDecision::Keep);
    }

    #[test]
    fn test_decision_display_and_labels() {
        assert_eq!(RetentionDecision::LetGo.to_string(), "Let Go");
        assert_eq!(RetentionDecision::Keep.as_label(), 0);
        assert_eq!(RetentionDecision::from_label(1), RetentionDecision::LetGo);
    }

    #[test]
    fn test_synthesize_labels_appends_column() {
        let mut df = df! {
            CRITICAL_ROLE => [1.0f64, 0.0, 0.0],
            ATTRITION_BINARY => [0i32, 1, 0],
            PERFORMANCE_RISK => [2.0f64, 7.0, 1.0],
            PERFORMANCE_RATING => [3i64, 3, 4],
            CTC => [70_000.0f64, 90_000.0, 30_000.0],
            PRODUCTIVITY_COST_RATIO => [8.0f64, 4.0, 12.0],
            ENGAGEMENT_SCORE => [3.0f64, 2.0, 3.0],
            SATISFACTION_COMPOSITE => [3.0f64, 2.0, 3.0],
            RETENTION_PRIORITY_SCORE => [60.0f64, 50.0, 70.0],
        }
        .unwrap();

        let (medians, summary) = synthesize_labels(&mut df).unwrap();
        assert_eq!(medians.ctc, 70_000.0);
        assert_eq!(medians.productivity_cost_ratio, 8.0);

        let labels: Vec<Option<i32>> = df
            .column(RETENTION_DECISION)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(labels, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(summary.keep, 2);
        assert_eq!(summary.let_go, 1);
        assert_eq!(summary.potential_savings, 90_000.0);
    }
}
