//! Runner module - the end-to-end pipelines behind each subcommand

mod attrition;
mod common;
mod dashboard;
mod retention;
mod score;

pub use attrition::run_attrition;
pub use dashboard::run_dashboard;
pub use retention::run_retention;
pub use score::run_score;
