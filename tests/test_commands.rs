//! Smoke tests for the `talent` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("talent")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("attrition"))
        .stdout(predicate::str::contains("retention"))
        .stdout(predicate::str::contains("score"))
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn test_invalid_test_size_fails() {
    Command::cargo_bin("talent")
        .unwrap()
        .args(["attrition", "--test-size", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("test_size"));
}

#[test]
fn test_missing_input_fails_with_path() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("talent")
        .unwrap()
        .args(["attrition", "-i", "does_not_exist.csv", "--no-plots", "-o"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist.csv"));
}

#[test]
fn test_retention_writes_dashboard_export() {
    let mut df = common::create_hr_dataframe(120, 11);
    let (temp_dir, input) = common::write_temp_csv(&mut df, "hr.csv");

    Command::cargo_bin("talent")
        .unwrap()
        .arg("retention")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(temp_dir.path())
        .args(["--cv-folds", "2", "--no-plots"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COST ANALYSIS"));

    assert!(temp_dir.path().join("retention_decision_model.json").exists());
    assert!(temp_dir.path().join("retention_dashboard_data.csv").exists());
    assert!(temp_dir.path().join("run_metadata.json").exists());
}

#[test]
fn test_dashboard_joins_exports() {
    let temp_dir = TempDir::new().unwrap();
    let attrition = temp_dir.path().join("attrition.csv");
    let retention = temp_dir.path().join("retention.csv");
    let output = temp_dir.path().join("dashboard.json");

    let mut file = std::fs::File::create(&attrition).unwrap();
    writeln!(
        file,
        "EmployeeNumber,Department,JobRole,Age,Gender,PerformanceRating,MonthlyIncome,\
         JobSatisfaction,EnvironmentSatisfaction,RelationshipSatisfaction,WorkLifeBalance,\
         YearsAtCompany,JobLevel,OverTime,DistanceFromHome,AttritionProbability"
    )
    .unwrap();
    writeln!(file, "1,Sales,Sales Executive,30,Male,3,5000,3,3,3,3,2,2,Yes,5,0.8").unwrap();
    writeln!(file, "2,Sales,Manager,45,Female,4,12000,4,4,4,4,10,4,No,2,0.1").unwrap();
    drop(file);

    let mut file = std::fs::File::create(&retention).unwrap();
    writeln!(file, "EmployeeNumber,RetentionRecommendation").unwrap();
    writeln!(file, "1,Let Go").unwrap();
    writeln!(file, "2,Keep").unwrap();
    drop(file);

    Command::cargo_bin("talent")
        .unwrap()
        .arg("dashboard")
        .arg("--attrition")
        .arg(&attrition)
        .arg("--retention")
        .arg(&retention)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(data["employees"].as_array().unwrap().len(), 2);
    assert_eq!(data["employees"][0]["retentionDecision"], "Let Go");
    assert_eq!(data["departments"][0]["name"], "Sales");
    assert_eq!(data["departments"][0]["letGo"], 1);
    assert_eq!(data["departments"][0]["costSavings"], 60000.0);
}
