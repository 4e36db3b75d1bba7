//! Attrition prediction pipeline

use std::time::Instant;

use anyhow::Result;
use polars::prelude::*;

use super::common::{
    ensure_output_dir, load_step, output_path, prepare_step, report_evaluation,
    report_importances, EvaluationView, ModelData,
};
use crate::cli::RunConfig;
use crate::model::explain::{explain, ShapExplanation};
use crate::model::selection::select_attrition_model;
use crate::model::TrainedModel;
use crate::pipeline::aggregate::GroupStat;
use crate::pipeline::schema::{self, PipelineKind};
use crate::pipeline::{
    engineer_attrition_features, explore, numeric_column, string_column, summarize_features,
    EdaReport, StratifiedKFold, ATTRITION_FEATURES,
};
use crate::report::plots as charts;
use crate::report::{
    self, attach_attrition_predictions, bucket_distribution, group_risk, save_dataset,
    FactorComparison, PlotWriter, RiskCategory, RunMetadata, ATTRITION_PROFILES_FILE,
    RUN_METADATA_FILE,
};
use crate::utils::{
    create_progress_bar, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_detail, print_info, print_step_header,
    print_step_time, print_success, print_warning,
};

/// Numeric columns compared between high-risk employees and everyone
const RISK_FACTORS: [&str; 5] = [
    schema::MONTHLY_INCOME,
    schema::JOB_SATISFACTION,
    schema::WORK_LIFE_BALANCE,
    schema::YEARS_SINCE_LAST_PROMOTION,
    schema::DISTANCE_FROM_HOME,
];

fn rate_bars(stats: &[GroupStat]) -> Vec<(String, f64)> {
    stats.iter().map(|s| (s.group.clone(), s.mean)).collect()
}

/// Run the attrition pipeline end to end
pub fn run_attrition(config: &RunConfig) -> Result<()> {
    let pipeline = PipelineKind::Attrition;
    print_banner(pipeline.title(), env!("CARGO_PKG_VERSION"));
    print_config(
        &config.input,
        &config.output_dir,
        schema::ATTRITION,
        config.test_size,
        config.seed,
    );
    ensure_output_dir(config)?;
    let mut plots = PlotWriter::new(&config.output_dir, config.plots);

    // Step 1: Load
    let mut df = load_step(1, config)?;

    // Step 2: Exploration
    print_step_header(2, "Exploratory Analysis");
    let step_start = Instant::now();
    let eda = explore(&df)?;
    report::display_group_rates("ATTRITION BY DEPARTMENT", "Department", &eda.department_rates);
    report::display_group_rates("ATTRITION BY JOB ROLE", "Job Role", &eda.role_rates);
    report::display_group_rates("ATTRITION BY OVERTIME", "OverTime", &eda.overtime_rates);
    report::display_group_rates(
        "ATTRITION BY WORK-LIFE BALANCE",
        "WorkLifeBalance",
        &eda.work_life_rates,
    );
    let strong = eda.correlations.correlated_pairs(0.7);
    if !strong.is_empty() {
        println!();
        print_count("strongly correlated pair(s)", strong.len(), Some("(|r| > 0.7)"));
        for pair in strong.iter().take(5) {
            println!(
                "      {} ↔ {}: {:+.3}",
                pair.feature1, pair.feature2, pair.correlation
            );
        }
    }
    println!();
    for line in eda.insights() {
        print_info(&line);
    }
    render_eda_charts(&eda, &mut plots)?;
    print_step_time(step_start.elapsed());

    // Step 3: Feature engineering
    print_step_header(3, "Feature Engineering");
    let step_start = Instant::now();
    let aggregates = engineer_attrition_features(&mut df)?;
    let summaries = summarize_features(&df, &ATTRITION_FEATURES, Some(schema::ATTRITION_BINARY))?;
    report::display_feature_summary(&summaries);
    print_success(&format!("Added {} engineered features", ATTRITION_FEATURES.len()));
    print_step_time(step_start.elapsed());

    // Step 4: Preprocessing
    let data = prepare_step(4, &df, pipeline, config)?;

    // Step 5: Model selection
    print_step_header(5, "Model Training & Selection");
    let step_start = Instant::now();
    let spinner = create_spinner("Training candidate models and tuning the winner...");
    let cv = StratifiedKFold::new(config.cv_folds, config.seed);
    let selection = select_attrition_model(
        &data.x_train,
        &data.y_train,
        &data.x_test,
        &data.y_test,
        &cv,
        config.seed,
    )?;
    finish_with_success(&spinner, "Model selection complete");

    if let Some(cv_summary) = &selection.cv {
        report::display_cv_summary(cv_summary);
    }
    if let Some(grid) = &selection.grid {
        println!();
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
            title: "Attrition",
            negative_label: "Stayed",
            positive_label: "Left",
            roc_file: "roc_curves_comparison.svg",
            calibration_file: "calibration_curve.svg",
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

    // Step 6: Interpretation
    print_step_header(6, "Feature Importance & Explanations");
    let step_start = Instant::now();
    report_importances(
        &model,
        &mut plots,
        "feature_importances.svg",
        "Top 20 Feature Importances",
    )?;
    let mut warnings = Vec::new();
    if let Err(e) = explanation_step(config, &model, &data, &feature_names, &mut plots) {
        let message = format!("Shapley explanation skipped: {:#}", e);
        print_warning(&message);
        warnings.push(message);
    }
    print_step_time(step_start.elapsed());

    // Step 7: Risk analysis
    print_step_header(7, "Attrition Risk Analysis");
    let step_start = Instant::now();
    let probabilities = model.predict_proba(&df)?;
    risk_analysis(&df, &probabilities)?;
    print_step_time(step_start.elapsed());

    // Step 8: Save
    print_step_header(8, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing model and risk profiles...");
    let model_path = output_path(config, pipeline.model_file_name());
    model.save(&model_path)?;
    attach_attrition_predictions(&mut df, &probabilities)?;
    let profiles_path = output_path(config, ATTRITION_PROFILES_FILE);
    save_dataset(&mut df, &profiles_path)?;

    let mut metadata = RunMetadata::new(pipeline, config, df.height(), feature_names, &selection);
    metadata.warnings = warnings;
    let metadata_path = output_path(config, RUN_METADATA_FILE);
    metadata.save(&metadata_path)?;
    finish_with_success(&spinner, "Results saved");
    print_detail("Model", model_path.display());
    print_detail("Risk profiles", profiles_path.display());
    print_detail("Run metadata", metadata_path.display());
    print_step_time(step_start.elapsed());

    let mut artifacts = vec![model_path, profiles_path, metadata_path];
    artifacts.extend(plots.written().iter().cloned());
    report::display_artifacts(&artifacts);

    print_completion("Attrition prediction complete!");
    Ok(())
}

fn render_eda_charts(eda: &EdaReport, plots: &mut PlotWriter) -> Result<()> {
    if !plots.enabled() {
        return Ok(());
    }
    let pb = create_progress_bar(7, "Rendering charts");

    plots.draw("age_distribution.svg", |p| {
        charts::dodged_histogram(
            p,
            "Age Distribution by Attrition Status",
            "Age",
            [("No", eda.ages_stayed.as_slice()), ("Yes", eda.ages_left.as_slice())],
            20,
        )
    })?;
    pb.inc(1);

    let departments = rate_bars(&eda.department_rates);
    plots.draw("dept_attrition.svg", |p| {
        charts::bar_chart(p, "Attrition Rate by Department", "Department", "Attrition Rate (%)", &departments)
    })?;
    pb.inc(1);

    let roles = rate_bars(&eda.role_rates);
    plots.draw("role_attrition.svg", |p| {
        charts::bar_chart(p, "Attrition Rate by Job Role", "Job Role", "Attrition Rate (%)", &roles)
    })?;
    pb.inc(1);

    let boxes: Vec<(String, _)> = [("No", eda.income_stayed), ("Yes", eda.income_left)]
        .into_iter()
        .filter_map(|(label, stats)| stats.map(|s| (label.to_string(), s)))
        .collect();
    plots.draw("income_attrition.svg", |p| {
        charts::box_plot(p, "Monthly Income by Attrition Status", "MonthlyIncome", &boxes)
    })?;
    pb.inc(1);

    plots.draw("correlation_matrix.svg", |p| {
        charts::correlation_heatmap(p, "Feature Correlation Matrix", &eda.correlations)
    })?;
    pb.inc(1);

    let overtime = rate_bars(&eda.overtime_rates);
    plots.draw("overtime_attrition.svg", |p| {
        charts::bar_chart(p, "Attrition Rate by Overtime", "OverTime", "Attrition Rate (%)", &overtime)
    })?;
    pb.inc(1);

    let wlb = rate_bars(&eda.work_life_rates);
    plots.draw("wlb_attrition.svg", |p| {
        charts::bar_chart(p, "Attrition Rate by Work-Life Balance", "WorkLifeBalance", "Attrition Rate (%)", &wlb)
    })?;
    pb.inc(1);

    finish_with_success(&pb, "Exploration charts rendered");
    Ok(())
}

/// Shapley values for a sample of test rows against training rows
fn explanation_step(
    config: &RunConfig,
    model: &TrainedModel,
    data: &ModelData,
    feature_names: &[String],
    plots: &mut PlotWriter,
) -> Result<()> {
    let spinner = create_spinner("Computing Shapley values...");
    let explanation = match explain(
        &model.classifier,
        &data.x_train,
        &data.x_test,
        feature_names,
        &config.shap,
    ) {
        Ok(explanation) => explanation,
        Err(e) => {
            finish_with_warning(&spinner, "Shapley values could not be computed");
            return Err(e.into());
        }
    };
    finish_with_success(
        &spinner,
        &format!("Explained {} test rows", explanation.sample_rows.len()),
    );

    let ranked = explanation.mean_abs();
    report::display_top_features("MEAN |SHAP| BY FEATURE", &ranked, 10);
    print_detail("Base value (mean predicted risk)", format!("{:.4}", explanation.base_value));

    let top: Vec<(String, f64)> = ranked.iter().take(20).cloned().collect();
    plots.draw("shap_summary.svg", |p| {
        charts::horizontal_bars(p, "Mean |SHAP| Value by Feature", "mean |SHAP value|", &top)
    })?;

    for (k, &feature) in explanation.top_feature_indices(3).iter().enumerate() {
        let points: Vec<(f64, f64)> = explanation
            .samples
            .column(feature)
            .iter()
            .copied()
            .zip(explanation.values.column(feature).iter().copied())
            .collect();
        let name = &explanation.feature_names[feature];
        plots.draw(&format!("shap_dependence_{}.svg", k + 1), |p| {
            charts::scatter(
                p,
                &format!("SHAP Dependence: {}", name),
                &format!("{} (scaled)", name),
                "SHAP value",
                &points,
            )
        })?;
    }

    high_risk_breakdown(&explanation, plots)
}

fn high_risk_breakdown(explanation: &ShapExplanation, plots: &mut PlotWriter) -> Result<()> {
    let Some(sample) = explanation.highest_risk_sample() else {
        return Ok(());
    };
    let contributions = explanation.breakdown(sample);
    println!();
    print_info(&format!(
        "Highest-risk sampled employee: test row {} with predicted risk {:.4}",
        explanation.sample_rows[sample], explanation.predictions[sample]
    ));
    let top: Vec<(String, f64)> = contributions
        .iter()
        .take(15)
        .map(|c| (c.feature.clone(), c.shap))
        .collect();
    report::display_top_features("HIGH-RISK EMPLOYEE DRIVERS", &top, 10);
    plots.draw("high_risk_explanation.svg", |p| {
        charts::horizontal_bars(p, "Drivers of the Highest-Risk Prediction", "SHAP value", &top)
    })
}

fn risk_analysis(df: &DataFrame, probabilities: &[f64]) -> Result<()> {
    let categories: Vec<RiskCategory> = probabilities
        .iter()
        .map(|&p| RiskCategory::from_probability(p))
        .collect();
    report::display_risk_distribution(
        "RISK DISTRIBUTION",
        &bucket_distribution(&RiskCategory::ALL, &categories),
    );

    let departments = string_column(df, schema::DEPARTMENT)?;
    report::display_group_risk(
        "RISK BY DEPARTMENT",
        "Department",
        &group_risk(&departments, probabilities),
        usize::MAX,
    );
    let roles = string_column(df, schema::JOB_ROLE)?;
    report::display_group_risk(
        "RISK BY JOB ROLE",
        "Job Role",
        &group_risk(&roles, probabilities),
        usize::MAX,
    );

    let high: Vec<bool> = categories.iter().map(|&c| c == RiskCategory::High).collect();
    let high_count = high.iter().filter(|&&h| h).count();
    if high_count == 0 {
        print_info("No employees in the high risk category");
        return Ok(());
    }

    let mut comparisons = RISK_FACTORS
        .iter()
        .map(|&factor| Ok(FactorComparison::numeric(factor, &numeric_column(df, factor)?, &high)))
        .collect::<Result<Vec<_>>>()?;
    comparisons.push(FactorComparison::share(
        "OverTime (% Yes)",
        &string_column(df, schema::OVER_TIME)?,
        "Yes",
        &high,
    ));
    report::display_factor_comparisons(&comparisons);
    Ok(())
}
