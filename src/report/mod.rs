//! Report module - risk analysis, console tables, charts and exports

pub mod dashboard;
pub mod export;
pub mod plots;
pub mod risk;
pub mod summary;

pub use dashboard::{build_dashboard, write_dashboard, DashboardData, DASHBOARD_FILE};
pub use export::*;
pub use plots::PlotWriter;
pub use risk::*;
pub use summary::*;
