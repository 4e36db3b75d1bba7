//! Steps shared by the two training pipelines

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;
use ndarray::{Array2, Axis};
use polars::prelude::*;

use crate::cli::RunConfig;
use crate::model::metrics::{calibration_curve, RocCurve};
use crate::model::selection::Selection;
use crate::model::TrainedModel;
use crate::pipeline::schema::{PipelineKind, ATTRITION, ATTRITION_BINARY};
use crate::pipeline::{
    add_binary_target, analyze_missing_values, dataset_stats, excluded_columns, load_dataset,
    numeric_column, stratified_train_test_split, summarize_target, total_missing, Preprocessor,
    TargetMapping,
};
use crate::report::{self, PlotWriter};
use crate::utils::{
    create_spinner, finish_with_success, print_detail, print_info, print_step_header,
    print_step_time, print_success,
};

/// Create the output directory if needed
pub(crate) fn ensure_output_dir(config: &RunConfig) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })
}

pub(crate) fn output_path(config: &RunConfig, file_name: &str) -> PathBuf {
    config.output_dir.join(file_name)
}

/// Load the dataset, report its shape and nulls, and add `AttritionBinary`
pub(crate) fn load_step(step: u8, config: &RunConfig) -> Result<DataFrame> {
    print_step_header(step, "Load Dataset");
    let step_start = Instant::now();

    let spinner = create_spinner("Reading employee records...");
    let mut df = load_dataset(&config.input, config.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");

    let stats = dataset_stats(&df);
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", stats.rows);
    println!("      Columns: {}", stats.columns);
    println!("      Estimated memory: {:.2} MB", stats.memory_mb);
    report::display_dtype_summary(&crate::pipeline::dtype_summary(&df));

    let missing = analyze_missing_values(&df)?;
    if total_missing(&missing) == 0 {
        print_info("No missing values found");
    } else {
        report::display_missing_values(&missing);
    }

    let mapping = TargetMapping::attrition();
    let summary = summarize_target(&df, ATTRITION, &mapping)?;
    report::display_target_summary(&summary);
    add_binary_target(&mut df, ATTRITION, &mapping, ATTRITION_BINARY)?;
    print_success("Attrition converted to binary");

    print_step_time(step_start.elapsed());
    Ok(df)
}

/// Train/test matrices of one pipeline
pub(crate) struct ModelData {
    pub preprocessor: Preprocessor,
    pub x_train: Array2<f64>,
    pub y_train: Vec<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Vec<f64>,
}

/// Stratified split, then fit the preprocessor on the training rows only
pub(crate) fn prepare_step(
    step: u8,
    df: &DataFrame,
    pipeline: PipelineKind,
    config: &RunConfig,
) -> Result<ModelData> {
    print_step_header(step, "Preprocessing & Split");
    let step_start = Instant::now();

    let y = numeric_column(df, pipeline.target_column())?;
    let split = stratified_train_test_split(&y, config.test_size, config.seed)?;
    let exclude = excluded_columns(pipeline.label_columns());
    let preprocessor = Preprocessor::fit(df, &split.train, &exclude)?;
    let x = preprocessor.transform(df)?;

    let pick = |rows: &[usize]| rows.iter().map(|&i| y[i]).collect::<Vec<f64>>();
    let data = ModelData {
        x_train: x.select(Axis(0), &split.train),
        y_train: pick(&split.train),
        x_test: x.select(Axis(0), &split.test),
        y_test: pick(&split.test),
        preprocessor,
    };

    print_detail("Training rows", data.y_train.len());
    print_detail("Test rows", data.y_test.len());
    print_detail("Numeric columns", data.preprocessor.numeric.len());
    print_detail("Categorical columns", data.preprocessor.categorical.len());
    print_detail("Model features", data.preprocessor.n_features());
    print_success("Preprocessor fitted on training rows");

    print_step_time(step_start.elapsed());
    Ok(data)
}

/// Labels and chart files of one evaluation report
pub(crate) struct EvaluationView<'a> {
    pub title: &'a str,
    pub negative_label: &'a str,
    pub positive_label: &'a str,
    pub roc_file: &'a str,
    pub calibration_file: &'a str,
}

/// Print and plot the held-out evaluation of the selected model
pub(crate) fn report_evaluation(
    selection: &Selection,
    y_test: &[f64],
    view: &EvaluationView<'_>,
    plots: &mut PlotWriter,
) -> Result<()> {
    let best = selection.best_result();
    report::display_model_comparison(&selection.results, selection.best);
    println!();
    println!(
        "    {} {}",
        style("Selected:").dim(),
        style(&best.name).green().bold()
    );
    print_detail("Parameters", best.classifier.describe_params());
    report::display_classification_report(
        &best.report,
        &best.confusion,
        view.negative_label,
        view.positive_label,
    );

    let curves: Vec<(String, f64, &RocCurve)> = selection
        .results
        .iter()
        .map(|r| (r.name.clone(), r.auc, &r.roc))
        .collect();
    plots.draw(view.roc_file, |p| {
        report::plots::roc_curves(p, &format!("ROC Curve for {} Model", view.title), &curves)
    })?;

    let calibration = calibration_curve(y_test, &best.proba, 10);
    plots.draw(view.calibration_file, |p| {
        report::plots::calibration_plot(
            p,
            &format!("Calibration Plot for {} Model", view.title),
            &calibration,
        )
    })?;
    Ok(())
}

/// Print the top importances and plot the top 20; models without
/// importances are skipped
pub(crate) fn report_importances(
    model: &TrainedModel,
    plots: &mut PlotWriter,
    file_name: &str,
    title: &str,
) -> Result<Option<Vec<(String, f64)>>> {
    let Some(ranked) = model.ranked_importances() else {
        print_info(&format!("{} does not expose feature importances", model.classifier.name()));
        return Ok(None);
    };

    report::display_top_features("TOP 10 FEATURES", &ranked, 10);
    let top: Vec<(String, f64)> = ranked.iter().take(20).cloned().collect();
    plots.draw(file_name, |p| {
        report::plots::horizontal_bars(p, title, "Relative Importance", &top)
    })?;
    Ok(Some(ranked))
}
