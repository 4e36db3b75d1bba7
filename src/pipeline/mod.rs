//! Pipeline module - data loading, exploration, feature engineering,
//! label synthesis and model-ready preprocessing

pub mod aggregate;
pub mod correlation;
pub mod eda;
pub mod features;
pub mod labels;
pub mod loader;
pub mod missing;
pub mod preprocess;
pub mod schema;
pub mod split;
pub mod target;

pub use correlation::{CorrelatedPair, CorrelationMatrix};
pub use eda::{explore, EdaReport};
pub use features::{
    apply_attrition_features, apply_retention_features, engineer_attrition_features,
    engineer_retention_features, summarize_features, FeatureAggregates, FeatureSummary,
    ATTRITION_FEATURES, RETENTION_FEATURES,
};
pub use labels::{synthesize_labels, LabelMedians, LabelSummary, RetentionDecision};
pub use loader::*;
pub use missing::*;
pub use preprocess::{excluded_columns, Preprocessor};
pub use split::{stratified_train_test_split, Split, StratifiedKFold};
pub use target::*;
