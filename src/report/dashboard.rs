//! Dashboard JSON built from the attrition and retention exports
//!
//! Employees come from the attrition risk profiles. Retention decisions are
//! joined by `EmployeeNumber`; an employee missing from the retention export
//! counts as Keep. When the attrition model artifact is available its test
//! AUC and top importances are included as well.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::model::TrainedModel;
use crate::pipeline::aggregate::numeric_key;
use crate::pipeline::schema;
use crate::pipeline::{load_dataset, numeric_column, require_columns, string_column, RetentionDecision};
use crate::report::risk::RiskCategory;

/// Default output file of the `dashboard` command
pub const DASHBOARD_FILE: &str = "dashboard_data.json";

/// Number of ranked features kept in the dashboard
pub const DASHBOARD_TOP_FEATURES: usize = 10;

/// Predicted probability at which an employee counts toward attrition rates
pub const ATTRITION_THRESHOLD: f64 = 0.5;

const ATTRITION_INPUTS: [&str; 16] = [
    schema::EMPLOYEE_NUMBER,
    schema::DEPARTMENT,
    schema::JOB_ROLE,
    schema::AGE,
    schema::GENDER,
    schema::PERFORMANCE_RATING,
    schema::MONTHLY_INCOME,
    schema::JOB_SATISFACTION,
    schema::ENVIRONMENT_SATISFACTION,
    schema::RELATIONSHIP_SATISFACTION,
    schema::WORK_LIFE_BALANCE,
    schema::YEARS_AT_COMPANY,
    schema::JOB_LEVEL,
    schema::OVER_TIME,
    schema::DISTANCE_FROM_HOME,
    schema::ATTRITION_PROBABILITY,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: String,
    pub name: String,
    pub department: String,
    pub job_role: String,
    pub age: f64,
    pub gender: String,
    pub attrition_risk: f64,
    pub attrition_category: String,
    pub retention_decision: String,
    pub performance: f64,
    pub monthly_salary: f64,
    /// Mean of job, environment, relationship satisfaction and work-life balance
    pub satisfaction_score: f64,
    pub work_life_balance: f64,
    pub years_at_company: f64,
    pub job_level: f64,
    pub overtime: String,
    pub distance_from_home: f64,
}

impl EmployeeSummary {
    fn is_let_go(&self) -> bool {
        self.retention_decision == RetentionDecision::LetGo.to_string()
    }

    fn at_risk(&self) -> bool {
        self.attrition_risk >= ATTRITION_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub name: String,
    pub keep: usize,
    pub let_go: usize,
    /// Percent of employees at or above the attrition threshold
    pub attrition_rate: f64,
    pub avg_satisfaction: f64,
    pub avg_performance: f64,
    /// Annual salary of the Let Go employees
    pub cost_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRoleSummary {
    pub name: String,
    pub count: usize,
    pub attrition_rate: f64,
    pub avg_salary: f64,
    /// Share of employees at or above the attrition threshold
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    pub model: String,
    pub test_auc: f64,
    pub trained_with: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub generated_at: String,
    pub employees: Vec<EmployeeSummary>,
    pub departments: Vec<DepartmentSummary>,
    pub job_roles: Vec<JobRoleSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feature_importance: Vec<FeatureImportance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_performance: Option<ModelPerformance>,
}

impl DashboardData {
    /// Attach the selected model's test AUC and its top importances
    pub fn with_model(mut self, model: &TrainedModel) -> Self {
        self.feature_importance = model
            .ranked_importances()
            .unwrap_or_default()
            .into_iter()
            .take(DASHBOARD_TOP_FEATURES)
            .map(|(feature, importance)| FeatureImportance { feature, importance })
            .collect();
        self.model_performance = Some(ModelPerformance {
            model: model.name.clone(),
            test_auc: model.test_auc,
            trained_with: model.crate_version.clone(),
        });
        self
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Join attrition profiles with retention recommendations
pub fn employee_summaries(attrition: &DataFrame, retention: &DataFrame) -> Result<Vec<EmployeeSummary>> {
    require_columns(attrition, &ATTRITION_INPUTS).context("Attrition export is incomplete")?;
    require_columns(
        retention,
        &[schema::EMPLOYEE_NUMBER, schema::RETENTION_RECOMMENDATION],
    )
    .context("Retention export is incomplete")?;

    let decisions: HashMap<String, String> = numeric_column(retention, schema::EMPLOYEE_NUMBER)?
        .into_iter()
        .map(numeric_key)
        .zip(string_column(retention, schema::RETENTION_RECOMMENDATION)?)
        .collect();

    let num = |name: &str| numeric_column(attrition, name);
    let text = |name: &str| string_column(attrition, name);

    let ids = num(schema::EMPLOYEE_NUMBER)?;
    let departments = text(schema::DEPARTMENT)?;
    let roles = text(schema::JOB_ROLE)?;
    let ages = num(schema::AGE)?;
    let genders = text(schema::GENDER)?;
    let performance = num(schema::PERFORMANCE_RATING)?;
    let income = num(schema::MONTHLY_INCOME)?;
    let job_sat = num(schema::JOB_SATISFACTION)?;
    let env_sat = num(schema::ENVIRONMENT_SATISFACTION)?;
    let rel_sat = num(schema::RELATIONSHIP_SATISFACTION)?;
    let wlb = num(schema::WORK_LIFE_BALANCE)?;
    let tenure = num(schema::YEARS_AT_COMPANY)?;
    let levels = num(schema::JOB_LEVEL)?;
    let overtime = text(schema::OVER_TIME)?;
    let distance = num(schema::DISTANCE_FROM_HOME)?;
    let risk = num(schema::ATTRITION_PROBABILITY)?;

    let keep = RetentionDecision::Keep.to_string();
    let employees = (0..attrition.height())
        .map(|i| {
            let id = numeric_key(ids[i]);
            let satisfaction = [job_sat[i], env_sat[i], rel_sat[i], wlb[i]]
                .iter()
                .map(|v| if v.is_finite() { *v } else { 0.0 })
                .sum::<f64>()
                / 4.0;
            EmployeeSummary {
                name: format!("Employee {}", id),
                retention_decision: decisions.get(&id).cloned().unwrap_or_else(|| keep.clone()),
                id,
                department: departments[i].clone(),
                job_role: roles[i].clone(),
                age: ages[i],
                gender: genders[i].clone(),
                attrition_risk: risk[i],
                attrition_category: RiskCategory::from_probability(risk[i]).to_string(),
                performance: performance[i],
                monthly_salary: income[i],
                satisfaction_score: satisfaction,
                work_life_balance: wlb[i],
                years_at_company: tenure[i],
                job_level: levels[i],
                overtime: overtime[i].clone(),
                distance_from_home: distance[i],
            }
        })
        .collect();
    Ok(employees)
}

/// Per-department keep/let-go counts and averages, ordered by name
pub fn department_summaries(employees: &[EmployeeSummary]) -> Vec<DepartmentSummary> {
    let mut groups: BTreeMap<&str, Vec<&EmployeeSummary>> = BTreeMap::new();
    for e in employees {
        groups.entry(e.department.as_str()).or_default().push(e);
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let total = members.len() as f64;
            let let_go = members.iter().filter(|e| e.is_let_go()).count();
            let at_risk = members.iter().filter(|e| e.at_risk()).count();
            DepartmentSummary {
                name: name.to_string(),
                keep: members.len() - let_go,
                let_go,
                attrition_rate: round1(at_risk as f64 / total * 100.0),
                avg_satisfaction: round1(members.iter().map(|e| e.satisfaction_score).sum::<f64>() / total),
                avg_performance: round1(members.iter().map(|e| e.performance).sum::<f64>() / total),
                cost_savings: members
                    .iter()
                    .filter(|e| e.is_let_go())
                    .map(|e| e.monthly_salary * 12.0)
                    .sum(),
            }
        })
        .collect()
}

/// Per-role head count, attrition rate and average salary, ordered by name
pub fn job_role_summaries(employees: &[EmployeeSummary]) -> Vec<JobRoleSummary> {
    let mut groups: BTreeMap<&str, Vec<&EmployeeSummary>> = BTreeMap::new();
    for e in employees {
        groups.entry(e.job_role.as_str()).or_default().push(e);
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let total = members.len() as f64;
            let at_risk = members.iter().filter(|e| e.at_risk()).count() as f64;
            JobRoleSummary {
                name: name.to_string(),
                count: members.len(),
                attrition_rate: round1(at_risk / total * 100.0),
                avg_salary: (members.iter().map(|e| e.monthly_salary).sum::<f64>() / total).round(),
                risk_score: at_risk / total,
            }
        })
        .collect()
}

/// Load both exports and build the dashboard document
pub fn build_dashboard(
    attrition_path: &Path,
    retention_path: &Path,
    infer_schema_length: usize,
) -> Result<DashboardData> {
    let attrition = load_dataset(attrition_path, infer_schema_length)?;
    let retention = load_dataset(retention_path, infer_schema_length)?;
    let employees = employee_summaries(&attrition, &retention)?;
    Ok(DashboardData {
        generated_at: Utc::now().to_rfc3339(),
        departments: department_summaries(&employees),
        job_roles: job_role_summaries(&employees),
        employees,
        feature_importance: Vec::new(),
        model_performance: None,
    })
}

pub fn write_dashboard(data: &DashboardData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize dashboard data")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write dashboard data: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrition_frame() -> DataFrame {
        df! {
            "EmployeeNumber" => [1i64, 2, 3],
            "Department" => ["Sales", "Sales", "HR"],
            "JobRole" => ["Sales Executive", "Sales Executive", "Manager"],
            "Age" => [30i64, 40, 50],
            "Gender" => ["Male", "Female", "Male"],
            "PerformanceRating" => [3i64, 4, 3],
            "MonthlyIncome" => [5000i64, 7000, 10000],
            "JobSatisfaction" => [4i64, 2, 3],
            "EnvironmentSatisfaction" => [4i64, 2, 3],
            "RelationshipSatisfaction" => [4i64, 2, 3],
            "WorkLifeBalance" => [4i64, 2, 3],
            "YearsAtCompany" => [5i64, 10, 20],
            "JobLevel" => [2i64, 3, 5],
            "OverTime" => ["Yes", "No", "No"],
            "DistanceFromHome" => [3i64, 10, 1],
            "AttritionProbability" => [0.7f64, 0.2, 0.5],
        }
        .unwrap()
    }

    fn retention_frame() -> DataFrame {
        df! {
            "EmployeeNumber" => [2i64, 1],
            "RetentionRecommendation" => ["Keep", "Let Go"],
        }
        .unwrap()
    }

    #[test]
    fn test_employees_join_by_employee_number() {
        let employees = employee_summaries(&attrition_frame(), &retention_frame()).unwrap();
        assert_eq!(employees.len(), 3);
        assert_eq!(employees[0].id, "1");
        assert_eq!(employees[0].retention_decision, "Let Go");
        assert_eq!(employees[1].retention_decision, "Keep");
        // absent from the retention export
        assert_eq!(employees[2].retention_decision, "Keep");
        assert_eq!(employees[0].satisfaction_score, 4.0);
        assert_eq!(employees[0].attrition_category, "High Risk");
    }

    #[test]
    fn test_department_aggregates() {
        let employees = employee_summaries(&attrition_frame(), &retention_frame()).unwrap();
        let departments = department_summaries(&employees);
        assert_eq!(departments.len(), 2);

        let hr = &departments[0];
        assert_eq!(hr.name, "HR");
        assert_eq!(hr.attrition_rate, 100.0);
        assert_eq!(hr.cost_savings, 0.0);

        let sales = &departments[1];
        assert_eq!((sales.keep, sales.let_go), (1, 1));
        assert_eq!(sales.attrition_rate, 50.0);
        assert_eq!(sales.avg_satisfaction, 3.0);
        assert_eq!(sales.avg_performance, 3.5);
        assert_eq!(sales.cost_savings, 60_000.0);
    }

    #[test]
    fn test_job_role_aggregates() {
        let employees = employee_summaries(&attrition_frame(), &retention_frame()).unwrap();
        let roles = job_role_summaries(&employees);
        let sales = roles.iter().find(|r| r.name == "Sales Executive").unwrap();
        assert_eq!(sales.count, 2);
        assert_eq!(sales.avg_salary, 6000.0);
        assert_eq!(sales.risk_score, 0.5);
    }

    #[test]
    fn test_missing_columns_error() {
        let partial = df! { "EmployeeNumber" => [1i64] }.unwrap();
        assert!(employee_summaries(&partial, &retention_frame()).is_err());
    }

    #[test]
    fn test_model_metrics_included_when_model_given() {
        use crate::model::{Classifier, GradientBoosting, GradientBoostingParams};
        use crate::pipeline::schema::PipelineKind;
        use crate::pipeline::Preprocessor;

        let tenure: Vec<f64> = (0..40).map(|i| (i % 20) as f64).collect();
        let noise: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        let y: Vec<f64> = tenure.iter().map(|&t| if t < 8.0 { 1.0 } else { 0.0 }).collect();
        let frame = df! { "YearsAtCompany" => tenure, "Noise" => noise }.unwrap();

        let rows: Vec<usize> = (0..40).collect();
        let preprocessor = Preprocessor::fit(&frame, &rows, &[]).unwrap();
        let x = preprocessor.transform(&frame).unwrap();
        let mut classifier = Classifier::GradientBoosting(GradientBoosting::new(GradientBoostingParams {
            n_estimators: 10,
            ..GradientBoostingParams::default()
        }));
        classifier.fit(&x, &y).unwrap();
        let model = TrainedModel::new(PipelineKind::Attrition, "Gradient Boosting", preprocessor, classifier, 0.91);

        let employees = employee_summaries(&attrition_frame(), &retention_frame()).unwrap();
        let bare = DashboardData {
            generated_at: String::new(),
            departments: department_summaries(&employees),
            job_roles: job_role_summaries(&employees),
            employees,
            feature_importance: Vec::new(),
            model_performance: None,
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("featureImportance").is_none());
        assert!(json.get("modelPerformance").is_none());

        let data = bare.with_model(&model);
        assert_eq!(data.feature_importance.len(), 2);
        assert_eq!(data.feature_importance[0].feature, "YearsAtCompany");
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["modelPerformance"]["model"], "Gradient Boosting");
        assert_eq!(json["modelPerformance"]["testAuc"], 0.91);
    }
}
