//! Scoring a dataset with a saved model

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use crate::cli::scored_output_path;
use crate::model::TrainedModel;
use crate::pipeline::schema::{self, PipelineKind};
use crate::pipeline::{
    add_binary_target, apply_attrition_features, apply_retention_features, load_dataset,
    TargetMapping,
};
use crate::report::{
    self, attach_attrition_predictions, attach_retention_predictions, bucket_distribution,
    save_dataset, RetentionRiskCategory, RiskCategory,
};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_detail,
    print_info, print_step_header, print_step_time,
};

/// Engineer the model's features on `input`, score every row and save
/// the frame with the prediction columns appended
///
/// Features referencing population aggregates use the values frozen at
/// training time, so a row scores the same in any batch.
pub fn run_score(
    model_path: &Path,
    input: &Path,
    output: Option<&Path>,
    infer_schema_length: usize,
) -> Result<()> {
    print_banner("SCORE", env!("CARGO_PKG_VERSION"));

    print_step_header(1, "Load Model & Data");
    let step_start = Instant::now();
    let model = TrainedModel::load(model_path)?;
    print_detail("Model", &model.name);
    print_detail("Pipeline", model.pipeline);
    print_detail("Test ROC AUC at training", format!("{:.4}", model.test_auc));
    if model.crate_version != env!("CARGO_PKG_VERSION") {
        print_info(&format!(
            "Model was written by version {}, scoring with {}",
            model.crate_version,
            env!("CARGO_PKG_VERSION")
        ));
    }

    let mut df = load_dataset(input, infer_schema_length)?;
    print_detail("Rows", df.height());
    print_step_time(step_start.elapsed());

    print_step_header(2, "Engineer Features & Score");
    let step_start = Instant::now();
    let spinner = create_spinner("Scoring employees...");
    if df.get_column_names().iter().any(|c| c.as_str() == schema::ATTRITION) {
        add_binary_target(
            &mut df,
            schema::ATTRITION,
            &TargetMapping::attrition(),
            schema::ATTRITION_BINARY,
        )?;
    }
    match model.pipeline {
        PipelineKind::Attrition => apply_attrition_features(&mut df, &model.aggregates)?,
        PipelineKind::Retention => apply_retention_features(&mut df, &model.aggregates)?,
    }
    let probabilities = model.predict_proba(&df)?;
    match model.pipeline {
        PipelineKind::Attrition => {
            attach_attrition_predictions(&mut df, &probabilities)?;
        }
        PipelineKind::Retention => {
            let predictions = model.predict(&df)?;
            attach_retention_predictions(&mut df, &probabilities, &predictions)?;
        }
    }
    finish_with_success(&spinner, &format!("Scored {} rows", probabilities.len()));

    match model.pipeline {
        PipelineKind::Attrition => {
            let categories: Vec<RiskCategory> = probabilities
                .iter()
                .map(|&p| RiskCategory::from_probability(p))
                .collect();
            report::display_risk_distribution(
                "RISK DISTRIBUTION",
                &bucket_distribution(&RiskCategory::ALL, &categories),
            );
        }
        PipelineKind::Retention => {
            let categories: Vec<RetentionRiskCategory> = probabilities
                .iter()
                .map(|&p| RetentionRiskCategory::from_probability(p))
                .collect();
            report::display_risk_distribution(
                "RETENTION RISK DISTRIBUTION",
                &bucket_distribution(&RetentionRiskCategory::ALL, &categories),
            );
        }
    }
    print_step_time(step_start.elapsed());

    let output_path = scored_output_path(input, output);
    save_dataset(&mut df, &output_path)?;
    print_detail("Output", output_path.display());

    print_completion("Scoring complete!");
    Ok(())
}
