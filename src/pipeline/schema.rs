//! Column names of the HR employee dataset and of the derived columns

pub const AGE: &str = "Age";
pub const ATTRITION: &str = "Attrition";
pub const DEPARTMENT: &str = "Department";
pub const DISTANCE_FROM_HOME: &str = "DistanceFromHome";
pub const EMPLOYEE_COUNT: &str = "EmployeeCount";
pub const EMPLOYEE_NUMBER: &str = "EmployeeNumber";
pub const ENVIRONMENT_SATISFACTION: &str = "EnvironmentSatisfaction";
pub const GENDER: &str = "Gender";
pub const JOB_INVOLVEMENT: &str = "JobInvolvement";
pub const JOB_LEVEL: &str = "JobLevel";
pub const JOB_ROLE: &str = "JobRole";
pub const JOB_SATISFACTION: &str = "JobSatisfaction";
pub const MONTHLY_INCOME: &str = "MonthlyIncome";
pub const OVER_18: &str = "Over18";
pub const OVER_TIME: &str = "OverTime";
pub const PERFORMANCE_RATING: &str = "PerformanceRating";
pub const RELATIONSHIP_SATISFACTION: &str = "RelationshipSatisfaction";
pub const STANDARD_HOURS: &str = "StandardHours";
pub const TOTAL_WORKING_YEARS: &str = "TotalWorkingYears";
pub const TRAINING_TIMES_LAST_YEAR: &str = "TrainingTimesLastYear";
pub const WORK_LIFE_BALANCE: &str = "WorkLifeBalance";
pub const YEARS_AT_COMPANY: &str = "YearsAtCompany";
pub const YEARS_SINCE_LAST_PROMOTION: &str = "YearsSinceLastPromotion";

/// Binary attrition target (Yes = 1, No = 0)
pub const ATTRITION_BINARY: &str = "AttritionBinary";

// Attrition pipeline features
pub const SALARY_TO_JOB_LEVEL_RATIO: &str = "SalaryToJobLevelRatio";
pub const PROMOTION_RISK: &str = "PromotionRisk";
pub const COMMUTE_DIFFICULTY: &str = "CommuteDifficulty";
pub const RELATIVE_COMPENSATION: &str = "RelativeCompensation";
pub const WORK_LIFE_IMBALANCE: &str = "WorkLifeImbalance";
pub const GROWTH_OPPORTUNITY_INDEX: &str = "GrowthOpportunityIndex";
pub const JOB_ENGAGEMENT: &str = "JobEngagement";
pub const SATISFACTION_COMPOSITE: &str = "SatisfactionComposite";
pub const CAREER_ADVANCEMENT_RATIO: &str = "CareerAdvancementRatio";
pub const OVERTIME_DISTANCE_RISK: &str = "OvertimeDistanceRisk";

// Retention pipeline features
pub const CTC: &str = "CTC";
pub const PERFORMANCE_RISK: &str = "PerformanceRisk";
pub const RETENTION_PRIORITY_SCORE: &str = "RetentionPriorityScore";
pub const CRITICAL_ROLE: &str = "CriticalRole";
pub const ENGAGEMENT_SCORE: &str = "EngagementScore";
pub const CAREER_GROWTH_POTENTIAL: &str = "CareerGrowthPotential";
pub const PRODUCTIVITY_COST_RATIO: &str = "ProductivityCostRatio";

/// Synthesized retention label (Let Go = 1, Keep = 0)
pub const RETENTION_DECISION: &str = "RetentionDecision";

// Prediction outputs
pub const ATTRITION_PROBABILITY: &str = "AttritionProbability";
pub const RISK_CATEGORY: &str = "RiskCategory";
pub const RETENTION_PROBABILITY: &str = "RetentionProbability";
pub const RETENTION_RECOMMENDATION: &str = "RetentionRecommendation";
pub const RETENTION_RISK_CATEGORY: &str = "RetentionRiskCategory";

/// Identifier and constant columns never used as model inputs
pub const NON_FEATURE_COLUMNS: [&str; 5] =
    [ATTRITION, EMPLOYEE_COUNT, EMPLOYEE_NUMBER, STANDARD_HOURS, OVER_18];

/// Raw columns read by the attrition feature formulas
pub const ATTRITION_FEATURE_INPUTS: [&str; 13] = [
    MONTHLY_INCOME,
    JOB_LEVEL,
    YEARS_SINCE_LAST_PROMOTION,
    YEARS_AT_COMPANY,
    DISTANCE_FROM_HOME,
    WORK_LIFE_BALANCE,
    OVER_TIME,
    TRAINING_TIMES_LAST_YEAR,
    JOB_INVOLVEMENT,
    JOB_SATISFACTION,
    ENVIRONMENT_SATISFACTION,
    RELATIONSHIP_SATISFACTION,
    TOTAL_WORKING_YEARS,
];

/// Raw columns read by the retention feature formulas
pub const RETENTION_FEATURE_INPUTS: [&str; 12] = [
    MONTHLY_INCOME,
    JOB_LEVEL,
    JOB_ROLE,
    PERFORMANCE_RATING,
    OVER_TIME,
    YEARS_SINCE_LAST_PROMOTION,
    WORK_LIFE_BALANCE,
    JOB_INVOLVEMENT,
    JOB_SATISFACTION,
    ENVIRONMENT_SATISFACTION,
    RELATIONSHIP_SATISFACTION,
    TRAINING_TIMES_LAST_YEAR,
];

/// Which of the two pipelines produced a frame or a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Attrition,
    Retention,
}

impl PipelineKind {
    /// Binary column the pipeline's model is trained on
    pub fn target_column(self) -> &'static str {
        match self {
            PipelineKind::Attrition => ATTRITION_BINARY,
            PipelineKind::Retention => RETENTION_DECISION,
        }
    }

    /// Label columns kept out of the feature matrix
    pub fn label_columns(self) -> &'static [&'static str] {
        match self {
            PipelineKind::Attrition => &[ATTRITION_BINARY],
            PipelineKind::Retention => &[ATTRITION_BINARY, RETENTION_DECISION],
        }
    }

    /// File name of the serialized model artifact
    pub fn model_file_name(self) -> &'static str {
        match self {
            PipelineKind::Attrition => "attrition_prediction_model.json",
            PipelineKind::Retention => "retention_decision_model.json",
        }
    }

    /// Held-out share used when none is given on the command line
    pub fn default_test_size(self) -> f64 {
        match self {
            PipelineKind::Attrition => 0.2,
            PipelineKind::Retention => 0.25,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PipelineKind::Attrition => "ATTRITION PREDICTION",
            PipelineKind::Retention => "RETENTION DECISION",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Attrition => write!(f, "attrition"),
            PipelineKind::Retention => write!(f, "retention"),
        }
    }
}
