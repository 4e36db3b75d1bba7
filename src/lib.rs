//! Talent Analytics: Attrition and Retention Library
//!
//! Two batch pipelines over an HR employee table: attrition prediction with
//! Shapley-value explanations, and rule-derived retention decisions with
//! cost analysis.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod utils;

pub use runner::{run_attrition, run_dashboard, run_retention, run_score};
