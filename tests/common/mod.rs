//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tempfile::TempDir;

const DEPARTMENT_ROLES: [(&str, &[&str]); 3] = [
    (
        "Sales",
        &["Sales Executive", "Sales Representative", "Manager"],
    ),
    (
        "Research & Development",
        &[
            "Research Scientist",
            "Laboratory Technician",
            "Manufacturing Director",
            "Healthcare Representative",
            "Research Director",
        ],
    ),
    ("Human Resources", &["Human Resources", "Manager"]),
];

const EDUCATION_FIELDS: [&str; 4] = ["Life Sciences", "Medical", "Marketing", "Technical Degree"];
const TRAVEL: [&str; 3] = ["Travel_Rarely", "Travel_Frequently", "Non-Travel"];
const MARITAL: [&str; 3] = ["Single", "Married", "Divorced"];

/// Create a synthetic employee table with every column of the HR dataset
///
/// Attrition is drawn from a logistic score over overtime, job satisfaction,
/// income and tenure, so both pipelines find real signal. The same `seed`
/// always produces the same frame.
pub fn create_hr_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut age = Vec::with_capacity(rows);
    let mut attrition = Vec::with_capacity(rows);
    let mut business_travel = Vec::with_capacity(rows);
    let mut daily_rate = Vec::with_capacity(rows);
    let mut department = Vec::with_capacity(rows);
    let mut distance = Vec::with_capacity(rows);
    let mut education = Vec::with_capacity(rows);
    let mut education_field = Vec::with_capacity(rows);
    let mut employee_number = Vec::with_capacity(rows);
    let mut env_sat = Vec::with_capacity(rows);
    let mut gender = Vec::with_capacity(rows);
    let mut hourly_rate = Vec::with_capacity(rows);
    let mut involvement = Vec::with_capacity(rows);
    let mut job_level = Vec::with_capacity(rows);
    let mut job_role = Vec::with_capacity(rows);
    let mut job_sat = Vec::with_capacity(rows);
    let mut marital = Vec::with_capacity(rows);
    let mut income = Vec::with_capacity(rows);
    let mut monthly_rate = Vec::with_capacity(rows);
    let mut companies = Vec::with_capacity(rows);
    let mut overtime = Vec::with_capacity(rows);
    let mut hike = Vec::with_capacity(rows);
    let mut rating = Vec::with_capacity(rows);
    let mut rel_sat = Vec::with_capacity(rows);
    let mut stock = Vec::with_capacity(rows);
    let mut total_years = Vec::with_capacity(rows);
    let mut training = Vec::with_capacity(rows);
    let mut wlb = Vec::with_capacity(rows);
    let mut years_company = Vec::with_capacity(rows);
    let mut years_role = Vec::with_capacity(rows);
    let mut years_promotion = Vec::with_capacity(rows);
    let mut years_manager = Vec::with_capacity(rows);

    for i in 0..rows {
        let (dept, roles) = DEPARTMENT_ROLES[rng.gen_range(0..DEPARTMENT_ROLES.len())];
        let role = *roles.choose(&mut rng).unwrap_or(&"Manager");
        let level: i64 = rng.gen_range(1..=5);
        let a: i64 = rng.gen_range(20..=60);
        let total: i64 = rng.gen_range(0..=(a - 18).min(40));
        let at_company: i64 = rng.gen_range(0..=total);
        let since_promotion: i64 = rng.gen_range(0..=at_company);
        let pay: i64 = 1500 * level + rng.gen_range(0..3000);
        let ot = rng.gen_bool(0.3);
        let js: i64 = rng.gen_range(1..=4);
        let balance: i64 = rng.gen_range(1..=4);

        let score = -1.6 + if ot { 1.5 } else { 0.0 } - 0.45 * (js as f64 - 2.5)
            - 0.00015 * (pay as f64 - 6000.0)
            - 0.05 * at_company as f64
            - 0.3 * (balance as f64 - 2.5);
        let p_leave = 1.0 / (1.0 + (-score).exp());
        let left = rng.gen_bool(p_leave.clamp(0.02, 0.98));

        age.push(a);
        attrition.push(if left { "Yes" } else { "No" });
        business_travel.push(TRAVEL[rng.gen_range(0..TRAVEL.len())]);
        daily_rate.push(rng.gen_range(100..1500i64));
        department.push(dept);
        distance.push(rng.gen_range(1..=29i64));
        education.push(rng.gen_range(1..=5i64));
        education_field.push(EDUCATION_FIELDS[rng.gen_range(0..EDUCATION_FIELDS.len())]);
        employee_number.push(i as i64 + 1);
        env_sat.push(rng.gen_range(1..=4i64));
        gender.push(if rng.gen_bool(0.5) { "Male" } else { "Female" });
        hourly_rate.push(rng.gen_range(30..=100i64));
        involvement.push(rng.gen_range(1..=4i64));
        job_level.push(level);
        job_role.push(role);
        job_sat.push(js);
        marital.push(MARITAL[rng.gen_range(0..MARITAL.len())]);
        income.push(pay);
        monthly_rate.push(rng.gen_range(2000..27000i64));
        companies.push(rng.gen_range(0..=9i64));
        overtime.push(if ot { "Yes" } else { "No" });
        hike.push(rng.gen_range(11..=25i64));
        rating.push(if rng.gen_bool(0.15) { 4i64 } else { 3 });
        rel_sat.push(rng.gen_range(1..=4i64));
        stock.push(rng.gen_range(0..=3i64));
        total_years.push(total);
        training.push(rng.gen_range(0..=6i64));
        wlb.push(balance);
        years_company.push(at_company);
        years_role.push(rng.gen_range(0..=at_company));
        years_promotion.push(since_promotion);
        years_manager.push(rng.gen_range(0..=at_company));
    }

    df! {
        "Age" => age,
        "Attrition" => attrition,
        "BusinessTravel" => business_travel,
        "DailyRate" => daily_rate,
        "Department" => department,
        "DistanceFromHome" => distance,
        "Education" => education,
        "EducationField" => education_field,
        "EmployeeCount" => vec![1i64; rows],
        "EmployeeNumber" => employee_number,
        "EnvironmentSatisfaction" => env_sat,
        "Gender" => gender,
        "HourlyRate" => hourly_rate,
        "JobInvolvement" => involvement,
        "JobLevel" => job_level,
        "JobRole" => job_role,
        "JobSatisfaction" => job_sat,
        "MaritalStatus" => marital,
        "MonthlyIncome" => income,
        "MonthlyRate" => monthly_rate,
        "NumCompaniesWorked" => companies,
        "Over18" => vec!["Y"; rows],
        "OverTime" => overtime,
        "PercentSalaryHike" => hike,
        "PerformanceRating" => rating,
        "RelationshipSatisfaction" => rel_sat,
        "StandardHours" => vec![80i64; rows],
        "StockOptionLevel" => stock,
        "TotalWorkingYears" => total_years,
        "TrainingTimesLastYear" => training,
        "WorkLifeBalance" => wlb,
        "YearsAtCompany" => years_company,
        "YearsInCurrentRole" => years_role,
        "YearsSinceLastPromotion" => years_promotion,
        "YearsWithCurrManager" => years_manager,
    }
    .unwrap()
}

/// Write `df` as CSV into a fresh temp directory
///
/// The directory is deleted when the returned `TempDir` is dropped.
pub fn write_temp_csv(df: &mut DataFrame, file_name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(file_name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    (temp_dir, path)
}

/// Write `df` as CSV to `path`
pub fn write_csv(df: &mut DataFrame, path: &std::path::Path) {
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Synthetic HR table with `AttritionBinary` already added
pub fn create_labelled_hr_dataframe(rows: usize, seed: u64) -> DataFrame {
    use talent_analytics::pipeline::schema::{ATTRITION, ATTRITION_BINARY};
    use talent_analytics::pipeline::{add_binary_target, TargetMapping};

    let mut df = create_hr_dataframe(rows, seed);
    add_binary_target(&mut df, ATTRITION, &TargetMapping::attrition(), ATTRITION_BINARY).unwrap();
    df
}
