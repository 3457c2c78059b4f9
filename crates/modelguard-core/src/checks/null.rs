use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::checks::{DatasetCheck, Issue, IssueKind};
use crate::errors::GuardResult;
use crate::types::Batch;

pub const DEFAULT_NULL_THRESHOLD: f64 = 0.1;

/// Completeness check: flags columns whose missing-value fraction exceeds a threshold.
#[derive(Debug, Clone)]
pub struct NullCheck {
    threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullCheckResult {
    pub null_counts: BTreeMap<String, usize>,
    /// Missing fraction per column, in `[0, 1]`
    pub null_percentages: BTreeMap<String, f64>,
    /// Columns over the threshold, with their missing fraction
    pub failed_columns: BTreeMap<String, f64>,
    /// Missing cells over all cells, in percent
    pub total_null_percentage: f64,
    pub passed: bool,
    pub threshold: f64,
}

impl NullCheck {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn run(&self, batch: &Batch) -> NullCheckResult {
        let n_rows = batch.num_rows();
        let schema = batch.schema();

        let mut null_counts = BTreeMap::new();
        let mut null_percentages = BTreeMap::new();
        let mut failed_columns = BTreeMap::new();
        let mut total_nulls = 0usize;

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let nulls = array.null_count();
            let fraction = if n_rows > 0 {
                nulls as f64 / n_rows as f64
            } else {
                0.0
            };
            total_nulls += nulls;
            if fraction > self.threshold {
                failed_columns.insert(field.name().clone(), fraction);
            }
            null_counts.insert(field.name().clone(), nulls);
            null_percentages.insert(field.name().clone(), fraction);
        }

        let total_cells = n_rows * batch.num_columns();
        let total_null_percentage = if total_cells > 0 {
            total_nulls as f64 / total_cells as f64 * 100.0
        } else {
            0.0
        };

        NullCheckResult {
            passed: failed_columns.is_empty(),
            null_counts,
            null_percentages,
            failed_columns,
            total_null_percentage,
            threshold: self.threshold,
        }
    }
}

impl Default for NullCheck {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_THRESHOLD)
    }
}

impl DatasetCheck for NullCheck {
    fn name(&self) -> &'static str {
        "Null Value Check"
    }

    fn issues(&self, batch: &Batch) -> GuardResult<Vec<Issue>> {
        let result = self.run(batch);
        let issues = result
            .failed_columns
            .iter()
            .map(|(column, fraction)| {
                let count = result.null_counts[column];
                Issue::new(
                    IssueKind::NullValue,
                    Some(column),
                    count,
                    format!(
                        "Found {count} null values in column {column} ({:.2}% > {:.2}%)",
                        fraction * 100.0,
                        self.threshold * 100.0
                    ),
                )
            })
            .collect();
        Ok(issues)
    }
}
