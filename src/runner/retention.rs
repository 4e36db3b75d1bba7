//! Retention decision pipeline

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Result;
use polars::prelude::*;

use super::common::{
    ensure_output_dir, load_step, output_path, prepare_step, report_evaluation,
    report_importances, EvaluationView,
};
use crate::cli::RunConfig;
use crate::model::selection::select_retention_model;
use crate::model::TrainedModel;
use crate::pipeline::labels::LABEL_MEDIAN_BASIS;
use crate::pipeline::schema::{self, PipelineKind};
use crate::pipeline::{
    engineer_retention_features, numeric_column, string_column, summarize_features,
    synthesize_labels, StratifiedKFold, RETENTION_FEATURES,
};
use crate::report::plots as charts;
use crate::report::{
    self, attach_retention_predictions, bucket_distribution, export_retention_dashboard,
    let_go_by_group, let_go_by_level, CostAnalysis, PlotWriter, RetentionRiskCategory,
    RunMetadata, RETENTION_DASHBOARD_FILE, RUN_METADATA_FILE,
};
use crate::utils::{
    create_spinner, finish_with_success, format_currency, print_banner, print_completion,
    print_config, print_detail, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

const LEAKAGE_WARNING: &str = "Decision-label medians are computed over the full dataset \
     before the train/test split; test scores may be optimistic";

/// Run the retention pipeline end to end
pub fn run_retention(config: &RunConfig) -> Result<()> {
    let pipeline = PipelineKind::Retention;
    print_banner(pipeline.title(), env!("CARGO_PKG_VERSION"));
    print_config(
        &config.input,
        &config.output_dir,
        schema::RETENTION_DECISION,
        config.test_size,
        config.seed,
    );
    ensure_output_dir(config)?;
    let mut plots = PlotWriter::new(&config.output_dir, config.plots);

    // Step 1: Load
    let mut df = load_step(1, config)?;

    // Step 2: Feature engineering
    print_step_header(2, "Feature Engineering");
    let step_start = Instant::now();
    let aggregates = engineer_retention_features(&mut df)?;
    print_success(&format!("Added {} engineered features", RETENTION_FEATURES.len()));
    print_step_time(step_start.elapsed());

    // Step 3: Decision labels
    print_step_header(3, "Retention Decision Labels");
    let step_start = Instant::now();
    let (medians, label_summary) = synthesize_labels(&mut df)?;
    print_detail("Median CTC", format_currency(medians.ctc));
    print_detail(
        "Median productivity/cost ratio",
        format!("{:.6}", medians.productivity_cost_ratio),
    );
    print_detail(
        "Median retention priority",
        format!("{:.2}", medians.retention_priority_score),
    );
    report::display_label_summary(&label_summary);
    print_warning(LEAKAGE_WARNING);
    let summaries = summarize_features(&df, &RETENTION_FEATURES, Some(schema::RETENTION_DECISION))?;
    report::display_feature_summary(&summaries);
    print_step_time(step_start.elapsed());

    // Step 4: Preprocessing
    let data = prepare_step(4, &df, pipeline, config)?;

    // Step 5: Model training
    print_step_header(5, "Model Training & Tuning");
    let step_start = Instant::now();
    let spinner = create_spinner("Tuning gradient boosting...");
    let cv = StratifiedKFold::new(config.cv_folds, config.seed);
    let selection = select_retention_model(
        &data.x_train,
        &data.y_train,
        &data.x_test,
        &data.y_test,
        &cv,
        config.seed,
    )?;
    finish_with_success(&spinner, "Model training complete");

    if let Some(grid) = &selection.grid {
        print_info(&format!(
            "Grid search over {} parameter sets, best mean CV ROC AUC {:.4}",
            grid.points.len(),
            grid.best_score
        ));
        report::display_grid_points(&grid.points, 5);
    }
    report_evaluation(
        &selection,
        &data.y_test,
        &EvaluationView {
            title: "Retention Decision",
            negative_label: "Keep",
            positive_label: "Let Go",
            roc_file: "retention_decision_roc.svg",
            calibration_file: "retention_decision_calibration.svg",
        },
        &mut plots,
    )?;
    print_step_time(step_start.elapsed());

    let best = selection.best_result();
    let model = TrainedModel::new(
        pipeline,
        best.name.clone(),
        data.preprocessor.clone(),
        best.classifier.clone(),
        best.auc,
    )
    .with_aggregates(aggregates);
    let feature_names = model.feature_names();

    // Step 6: Importances
    print_step_header(6, "Feature Importance");
    let step_start = Instant::now();
    report_importances(
        &model,
        &mut plots,
        "retention_feature_importance.svg",
        "Top 20 Features for Retention Decisions",
    )?;
    print_step_time(step_start.elapsed());

    // Step 7: Recommendations
    print_step_header(7, "Retention Recommendations & Cost Analysis");
    let step_start = Instant::now();
    let probabilities = model.predict_proba(&df)?;
    let predictions = model.predict(&df)?;
    attach_retention_predictions(&mut df, &probabilities, &predictions)?;

    let categories: Vec<RetentionRiskCategory> = probabilities
        .iter()
        .map(|&p| RetentionRiskCategory::from_probability(p))
        .collect();
    report::display_risk_distribution(
        "RETENTION RISK DISTRIBUTION",
        &bucket_distribution(&RetentionRiskCategory::ALL, &categories),
    );

    let departments = string_column(&df, schema::DEPARTMENT)?;
    report::display_let_go_shares(
        "LET GO BY DEPARTMENT",
        "Department",
        &let_go_by_group(&departments, &predictions),
    );
    let levels = numeric_column(&df, schema::JOB_LEVEL)?;
    report::display_let_go_shares(
        "LET GO BY JOB LEVEL",
        "Job Level",
        &let_go_by_level(&levels, &predictions),
    );

    let ctc = numeric_column(&df, schema::CTC)?;
    let cost = CostAnalysis::from_recommendations(&ctc, &predictions);
    report::display_cost_analysis(&cost);

    render_recommendation_charts(&df, &departments, &predictions, &categories, &mut plots)?;
    print_step_time(step_start.elapsed());

    // Step 8: Save
    print_step_header(8, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing model and dashboard data...");
    let model_path = output_path(config, pipeline.model_file_name());
    model.save(&model_path)?;
    let export_path = output_path(config, RETENTION_DASHBOARD_FILE);
    export_retention_dashboard(&df, &export_path)?;

    let mut metadata = RunMetadata::new(pipeline, config, df.height(), feature_names, &selection);
    metadata.label_median_basis = Some(LABEL_MEDIAN_BASIS.to_string());
    metadata.warnings.push(LEAKAGE_WARNING.to_string());
    let metadata_path = output_path(config, RUN_METADATA_FILE);
    metadata.save(&metadata_path)?;
    finish_with_success(&spinner, "Results saved");
    print_detail("Model", model_path.display());
    print_detail("Dashboard data", export_path.display());
    print_detail("Run metadata", metadata_path.display());
    print_step_time(step_start.elapsed());

    let mut artifacts = vec![model_path, export_path, metadata_path];
    artifacts.extend(plots.written().iter().cloned());
    report::display_artifacts(&artifacts);

    print_completion("Retention decision analysis complete!");
    Ok(())
}

fn render_recommendation_charts(
    df: &DataFrame,
    departments: &[String],
    predictions: &[f64],
    categories: &[RetentionRiskCategory],
    plots: &mut PlotWriter,
) -> Result<()> {
    if !plots.enabled() {
        return Ok(());
    }

    let mut counts: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (department, &prediction) in departments.iter().zip(predictions) {
        let entry = counts.entry(department.as_str()).or_default();
        if prediction == 1.0 {
            entry.1 += 1.0;
        } else {
            entry.0 += 1.0;
        }
    }
    let names: Vec<String> = counts.keys().map(|k| k.to_string()).collect();
    let stacks = [
        ("Keep", counts.values().map(|c| c.0).collect::<Vec<f64>>()),
        ("Let Go", counts.values().map(|c| c.1).collect::<Vec<f64>>()),
    ];
    plots.draw("retention_by_department.svg", |p| {
        charts::stacked_bars(
            p,
            "Retention Recommendations by Department",
            "Department",
            "Employees",
            &names,
            &stacks,
        )
    })?;

    let series = performance_cost_series(
        &numeric_column(df, schema::PERFORMANCE_RATING)?,
        &numeric_column(df, schema::CTC)?,
        &numeric_column(df, schema::JOB_LEVEL)?,
        categories,
    );
    plots.draw("performance_vs_cost.svg", |p| {
        charts::grouped_scatter(
            p,
            "Performance vs. Cost with Retention Recommendations",
            "Performance Rating",
            "Annual Cost (CTC)",
            &series,
        )
    })
}

/// One (rating, CTC) point series per retention risk category; the marker
/// radius grows with the category's mean job level
fn performance_cost_series(
    rating: &[f64],
    ctc: &[f64],
    levels: &[f64],
    categories: &[RetentionRiskCategory],
) -> Vec<(String, Vec<(f64, f64)>, u32)> {
    RetentionRiskCategory::ALL
        .iter()
        .map(|&category| {
            let members: Vec<usize> = (0..categories.len())
                .filter(|&i| categories[i] == category)
                .collect();
            let points = members.iter().map(|&i| (rating[i], ctc[i])).collect();
            let mean_level = if members.is_empty() {
                1.0
            } else {
                members.iter().map(|&i| levels[i]).sum::<f64>() / members.len() as f64
            };
            (category.to_string(), points, (mean_level.round() as u32 + 1).max(2))
        })
        .collect()
}
