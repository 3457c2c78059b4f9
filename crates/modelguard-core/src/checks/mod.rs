//! Data-quality checks over a single dataset, and the result record each one
//! produces when executed by the [`CheckRunner`](crate::runner::CheckRunner).

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::{GuardError, GuardResult};
use crate::types::Batch;

pub mod anomaly;
pub mod consistency;
pub mod null;
pub mod range;
pub mod schema;

pub use anomaly::{AnomalyCheck, AnomalyCheckResult};
pub use consistency::ConsistencyCheck;
pub use null::{NullCheck, NullCheckResult};
pub use range::RangeCheck;
pub use schema::{SchemaCheck, SchemaCheckResult};

/// A pluggable check that inspects one dataset.
pub trait DatasetCheck: Send + Sync {
    /// Returns the display name of the check.
    fn name(&self) -> &'static str;
    /// Runs the check and lists what it found. An empty list means the check passed.
    fn issues(&self, batch: &Batch) -> GuardResult<Vec<Issue>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NullValue,
    MissingColumn,
    TypeMismatch,
    Anomaly,
    OutOfRange,
    MissingReference,
    OrphanedRecord,
    /// The check itself could not run
    CheckError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub count: usize,
    pub details: String,
}

impl Issue {
    pub fn new(kind: IssueKind, column: Option<&str>, count: usize, details: String) -> Self {
        Self {
            kind,
            column: column.map(str::to_string),
            count,
            details,
        }
    }
}

/// Outcome of one executed check. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub status: CheckStatus,
    pub timestamp: String,
    pub issues: Vec<Issue>,
}

impl CheckResult {
    pub fn from_issues(check_name: &str, table: Option<&str>, issues: Vec<Issue>) -> Self {
        let status = if issues.is_empty() {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        Self {
            check_name: check_name.to_string(),
            table: table.map(str::to_string),
            status,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            issues,
        }
    }

    /// Sentinel result for a check that raised instead of completing.
    pub fn errored(check_name: &str, table: Option<&str>, error: &GuardError) -> Self {
        let issue = Issue::new(IssueKind::CheckError, None, 0, error.to_string());
        Self::from_issues(check_name, table, vec![issue])
    }

    pub fn is_passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}
