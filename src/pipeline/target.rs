//! Target column analysis and mapping
//!
//! Converts the categorical attrition field (`Yes`/`No`) into the binary 0/1
//! column that model training expects.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::loader::string_column;

/// Mapping configuration for converting target column values to binary 0/1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (event)
    pub event_value: String,
    /// Value that maps to 0 (non-event)
    pub non_event_value: String,
}

impl TargetMapping {
    /// Create a new target mapping
    pub fn new(event_value: impl Into<String>, non_event_value: impl Into<String>) -> Self {
        Self {
            event_value: event_value.into(),
            non_event_value: non_event_value.into(),
        }
    }

    /// The attrition field: an employee who left is the event
    pub fn attrition() -> Self {
        Self::new("Yes", "No")
    }
}

/// Event/non-event counts of a mapped target column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSummary {
    pub events: usize,
    pub non_events: usize,
    pub ignored: usize,
}

impl TargetSummary {
    pub fn total(&self) -> usize {
        self.events + self.non_events + self.ignored
    }

    /// Event share of all mapped rows, in percent
    pub fn event_pct(&self) -> f64 {
        let mapped = self.events + self.non_events;
        if mapped == 0 {
            0.0
        } else {
            self.events as f64 / mapped as f64 * 100.0
        }
    }

    /// Non-event share of all mapped rows, in percent
    pub fn non_event_pct(&self) -> f64 {
        let mapped = self.events + self.non_events;
        if mapped == 0 {
            0.0
        } else {
            self.non_events as f64 / mapped as f64 * 100.0
        }
    }
}

/// Create a binary target mask based on the mapping
///
/// Returns a Vec<Option<i32>> where:
/// - Some(1) for event values
/// - Some(0) for non-event values
/// - None for values that don't match either
pub fn create_target_mask(
    df: &DataFrame,
    target: &str,
    mapping: &TargetMapping,
) -> Result<Vec<Option<i32>>> {
    let values = string_column(df, target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let mask = values
        .iter()
        .map(|v| {
            if v == &mapping.event_value {
                Some(1)
            } else if v == &mapping.non_event_value {
                Some(0)
            } else {
                None
            }
        })
        .collect();

    Ok(mask)
}

/// Count how many records match the event and non-event values
pub fn summarize_target(
    df: &DataFrame,
    target: &str,
    mapping: &TargetMapping,
) -> Result<TargetSummary> {
    let mask = create_target_mask(df, target, mapping)?;

    Ok(TargetSummary {
        events: mask.iter().filter(|v| **v == Some(1)).count(),
        non_events: mask.iter().filter(|v| **v == Some(0)).count(),
        ignored: mask.iter().filter(|v| v.is_none()).count(),
    })
}

/// Add a binary 0/1 `Int32` column derived from `source` via `mapping`
///
/// Every row must match one side of the mapping.
pub fn add_binary_target(
    df: &mut DataFrame,
    source: &str,
    mapping: &TargetMapping,
    binary_name: &str,
) -> Result<()> {
    let mask = create_target_mask(df, source, mapping)?;

    let unmapped = mask.iter().filter(|v| v.is_none()).count();
    if unmapped > 0 {
        anyhow::bail!(
            "Target column '{}' has {} value(s) that are neither '{}' nor '{}'",
            source,
            unmapped,
            mapping.event_value,
            mapping.non_event_value
        );
    }

    let binary: Vec<i32> = mask.into_iter().map(|v| v.unwrap_or(0)).collect();
    df.with_column(Column::new(binary_name.into(), binary))
        .with_context(|| format!("Failed to add binary target '{}'", binary_name))?;

    Ok(())
}
