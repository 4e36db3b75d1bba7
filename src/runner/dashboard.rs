//! Dashboard JSON from the two pipeline exports

use std::path::Path;

use anyhow::Result;

use crate::model::TrainedModel;
use crate::report::{self, build_dashboard, write_dashboard};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_detail,
    print_info,
};

/// Join the exports; `model` contributes its metrics only when the file exists
pub fn run_dashboard(
    attrition: &Path,
    retention: &Path,
    model: &Path,
    output: &Path,
    infer_schema_length: usize,
) -> Result<()> {
    print_banner("DASHBOARD EXPORT", env!("CARGO_PKG_VERSION"));

    let spinner = create_spinner("Joining attrition and retention exports...");
    let mut data = build_dashboard(attrition, retention, infer_schema_length)?;
    if model.exists() {
        data = data.with_model(&TrainedModel::load(model)?);
    }
    write_dashboard(&data, output)?;
    finish_with_success(&spinner, "Dashboard data written");

    print_detail("Employees", data.employees.len());
    print_detail("Departments", data.departments.len());
    print_detail("Job roles", data.job_roles.len());
    match &data.model_performance {
        Some(performance) => print_detail(
            "Model",
            format!("{} (test ROC AUC {:.4})", performance.model, performance.test_auc),
        ),
        None => print_info(&format!(
            "No model at {}, model metrics omitted",
            model.display()
        )),
    }
    report::display_department_summaries(&data.departments);
    print_detail("Output", output.display());

    print_completion("Dashboard export complete!");
    Ok(())
}
