pub mod checks;
pub mod errors;
pub mod metrics;
pub mod readers;
pub mod report;
pub mod rules;
pub mod runner;
pub mod stats;
pub mod types;
pub mod utils;
pub mod validator;

pub use checks::{
    AnomalyCheck, CheckResult, CheckStatus, ConsistencyCheck, DatasetCheck, Issue, IssueKind,
    NullCheck, RangeCheck, SchemaCheck,
};
pub use errors::{GuardError, GuardResult};
pub use metrics::Scores;
pub use readers::load_table;
pub use report::{compare_versions, MetricValue, ValidationReport};
pub use rules::{RuleCheckResult, RuleEngine, RuleKind, ValidationRule};
pub use runner::{Catalog, CheckRunner, RunOutput};
pub use types::Batch;
pub use validator::healthcare::{
    ClinicalContext, ComplianceThresholds, HealthcareConfig, HealthcareOutputType, OutputMetadata,
};
pub use validator::{HealthcareValidator, ModelValidator};
