use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::checks::{DatasetCheck, Issue, IssueKind};
use crate::errors::GuardResult;
use crate::stats::{quantile_sorted, sorted, Stats};
use crate::types::{as_float64, column, numeric_columns, Batch};

pub const DEFAULT_Z_THRESHOLD: f64 = 1.5;

/// Statistical anomaly detection on numeric columns by z-score.
///
/// A constant column (standard deviation exactly zero) has every z-score set
/// to zero, so it never reports anomalies whatever the threshold.
#[derive(Debug, Clone)]
pub struct AnomalyCheck {
    z_threshold: f64,
    columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnomalies {
    pub count: usize,
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCheckResult {
    pub anomalies: BTreeMap<String, ColumnAnomalies>,
    pub stats_summary: BTreeMap<String, ColumnSummary>,
    pub z_threshold: f64,
    pub columns_checked: Vec<String>,
    pub passed: bool,
}

impl AnomalyCheck {
    pub fn new(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            columns: None,
        }
    }

    /// Restrict the check to an explicit list of columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn run(&self, batch: &Batch) -> GuardResult<AnomalyCheckResult> {
        let columns_checked = match &self.columns {
            Some(columns) => columns.clone(),
            None => numeric_columns(batch),
        };
        let n_rows = batch.num_rows();

        let mut anomalies = BTreeMap::new();
        let mut stats_summary = BTreeMap::new();

        for name in &columns_checked {
            let values = as_float64(column(batch, name)?.as_ref())?;

            // (row index, value) of the non-null entries
            let present: Vec<(usize, f64)> = values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i, v)))
                .collect();
            let stats = Stats::from_values(present.iter().map(|(_, v)| *v));
            let std = stats.std_dev();

            let (indices, flagged): (Vec<usize>, Vec<f64>) = present
                .iter()
                .filter(|(_, v)| z_score(*v, stats.mean(), std) > self.z_threshold)
                .copied()
                .unzip();

            if !stats.is_empty() {
                let ordered = sorted(&present.iter().map(|(_, v)| *v).collect::<Vec<_>>());
                stats_summary.insert(
                    name.clone(),
                    ColumnSummary {
                        mean: stats.mean(),
                        std,
                        min: stats.min(),
                        max: stats.max(),
                        q1: quantile_sorted(&ordered, 0.25).unwrap_or(stats.min()),
                        median: quantile_sorted(&ordered, 0.5).unwrap_or(stats.mean()),
                        q3: quantile_sorted(&ordered, 0.75).unwrap_or(stats.max()),
                    },
                );
            }

            let percentage = if n_rows > 0 {
                indices.len() as f64 / n_rows as f64 * 100.0
            } else {
                0.0
            };
            tracing::debug!(column = %name, anomalies = indices.len(), "anomaly scan");
            anomalies.insert(
                name.clone(),
                ColumnAnomalies {
                    count: indices.len(),
                    indices,
                    values: flagged,
                    percentage,
                },
            );
        }

        Ok(AnomalyCheckResult {
            passed: anomalies.values().all(|a| a.count == 0),
            anomalies,
            stats_summary,
            z_threshold: self.z_threshold,
            columns_checked,
        })
    }
}

/// Absolute z-score, defined as zero when the standard deviation is zero.
#[inline]
fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 {
        0.0
    } else {
        ((value - mean) / std).abs()
    }
}

impl Default for AnomalyCheck {
    fn default() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }
}

impl DatasetCheck for AnomalyCheck {
    fn name(&self) -> &'static str {
        "Anomaly Check"
    }

    fn issues(&self, batch: &Batch) -> GuardResult<Vec<Issue>> {
        let result = self.run(batch)?;
        let issues = result
            .anomalies
            .iter()
            .filter(|(_, a)| a.count > 0)
            .map(|(column, a)| {
                Issue::new(
                    IssueKind::Anomaly,
                    Some(column),
                    a.count,
                    format!(
                        "Found {} values with z-score above {} in column {column}",
                        a.count, self.z_threshold
                    ),
                )
            })
            .collect();
        Ok(issues)
    }
}
