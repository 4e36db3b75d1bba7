//! Tests for CLI argument parsing

use clap::Parser;
use std::path::{Path, PathBuf};
use talent_analytics::cli::{scored_output_path, Cli, Commands, DEFAULT_INPUT};
use talent_analytics::pipeline::schema::PipelineKind;

#[test]
fn test_attrition_default_values() {
    let cli = Cli::parse_from(["talent", "attrition"]);
    let Commands::Attrition(args) = cli.command else {
        panic!("expected the attrition subcommand");
    };

    assert_eq!(args.input, PathBuf::from(DEFAULT_INPUT));
    assert_eq!(args.output_dir, PathBuf::from("."));
    assert_eq!(args.seed, 42, "Default seed should be 42");
    assert_eq!(args.test_size, None);
    assert_eq!(args.cv_folds, 5, "Default CV folds should be 5");
    assert_eq!(args.shap_samples, 100);
    assert_eq!(args.shap_permutations, 50);
    assert!(!args.no_plots, "Plots should be rendered by default");
    assert_eq!(args.infer_schema_length, 10000);
}

#[test]
fn test_pipeline_specific_test_size_defaults() {
    let cli = Cli::parse_from(["talent", "attrition"]);
    let Commands::Attrition(args) = cli.command else {
        panic!("expected the attrition subcommand");
    };
    assert_eq!(args.to_config(PipelineKind::Attrition).test_size, 0.2);

    let cli = Cli::parse_from(["talent", "retention"]);
    let Commands::Retention(args) = cli.command else {
        panic!("expected the retention subcommand");
    };
    assert_eq!(args.to_config(PipelineKind::Retention).test_size, 0.25);
}

#[test]
fn test_custom_training_options() {
    let cli = Cli::parse_from([
        "talent",
        "retention",
        "-i",
        "hr.csv",
        "-o",
        "out",
        "--seed",
        "7",
        "--test-size",
        "0.3",
        "--cv-folds",
        "3",
        "--shap-samples",
        "10",
        "--shap-permutations",
        "5",
        "--no-plots",
    ]);
    let Commands::Retention(args) = cli.command else {
        panic!("expected the retention subcommand");
    };

    let config = args.to_config(PipelineKind::Retention);
    assert_eq!(config.input, PathBuf::from("hr.csv"));
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.seed, 7);
    assert_eq!(config.test_size, 0.3);
    assert_eq!(config.cv_folds, 3);
    assert_eq!(config.shap.n_samples, 10);
    assert_eq!(config.shap.n_permutations, 5);
    assert_eq!(config.shap.seed, 7, "Explanations share the run seed");
    assert!(!config.plots);
}

#[test]
fn test_invalid_test_size_rejected() {
    for value in ["0", "1", "1.5", "-0.2", "abc"] {
        let result = Cli::try_parse_from(["talent", "attrition", "--test-size", value]);
        assert!(result.is_err(), "test size {} should be rejected", value);
    }
}

#[test]
fn test_invalid_cv_folds_rejected() {
    let result = Cli::try_parse_from(["talent", "attrition", "--cv-folds", "1"]);
    assert!(result.is_err());
}

#[test]
fn test_score_requires_model_and_input() {
    assert!(Cli::try_parse_from(["talent", "score", "-i", "hr.csv"]).is_err());
    assert!(Cli::try_parse_from(["talent", "score", "-m", "model.json"]).is_err());

    let cli = Cli::parse_from(["talent", "score", "-m", "model.json", "-i", "new_hires.csv"]);
    match cli.command {
        Commands::Score { model, input, output, .. } => {
            assert_eq!(model, PathBuf::from("model.json"));
            assert_eq!(
                scored_output_path(&input, output.as_deref()),
                PathBuf::from("new_hires_scored.csv")
            );
        }
        other => panic!("expected score, got {:?}", other),
    }
}

#[test]
fn test_score_parquet_output_keeps_extension() {
    assert_eq!(
        scored_output_path(Path::new("/data/hr.parquet"), None),
        PathBuf::from("/data/hr_scored.parquet")
    );
}

#[test]
fn test_dashboard_defaults() {
    let cli = Cli::parse_from(["talent", "dashboard"]);
    match cli.command {
        Commands::Dashboard {
            attrition,
            retention,
            model,
            output,
            infer_schema_length,
        } => {
            assert_eq!(attrition, PathBuf::from("attrition_risk_profiles.csv"));
            assert_eq!(retention, PathBuf::from("retention_dashboard_data.csv"));
            assert_eq!(model, PathBuf::from("attrition_prediction_model.json"));
            assert_eq!(output, PathBuf::from("dashboard_data.json"));
            assert_eq!(infer_schema_length, 10000);
        }
        other => panic!("expected dashboard, got {:?}", other),
    }
}

#[test]
fn test_subcommand_required() {
    assert!(Cli::try_parse_from(["talent"]).is_err());
}
