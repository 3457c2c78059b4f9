//! The validation report aggregate and the records stored in it.

use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::rules::RuleCheckResult;
use crate::utils::serde_helpers::{empty_as_none, non_finite};
use crate::validator::healthcare::{HealthcareBias, HealthcareValidation};

/// Percentage change above which a metric delta is reported.
pub const SIGNIFICANT_CHANGE: f64 = 5.0;
/// Percentage change above which a significant delta is `high` severity.
pub const HIGH_SEVERITY_CHANGE: f64 = 10.0;

/// Local time in ISO-8601 with microseconds.
pub fn iso_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Matrix(Vec<Vec<u64>>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            MetricValue::Matrix(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_auc: Option<f64>,
    pub confusion_matrix: Vec<Vec<u64>>,
}

impl PerformanceMetrics {
    /// Flatten into the report's metric mapping.
    pub fn to_metric_map(&self) -> BTreeMap<String, MetricValue> {
        let mut map = BTreeMap::new();
        map.insert("accuracy".to_string(), MetricValue::Scalar(self.accuracy));
        map.insert("precision".to_string(), MetricValue::Scalar(self.precision));
        map.insert("recall".to_string(), MetricValue::Scalar(self.recall));
        map.insert("f1".to_string(), MetricValue::Scalar(self.f1));
        if let Some(auc) = self.roc_auc {
            map.insert("roc_auc".to_string(), MetricValue::Scalar(auc));
        }
        map.insert(
            "confusion_matrix".to_string(),
            MetricValue::Matrix(self.confusion_matrix.clone()),
        );
        map
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub within_range_percentage: f64,
    pub outliers_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValidation {
    pub timestamp: String,
    pub total_outputs: usize,
    pub statistics: OutputStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_check: Option<RangeSummary>,
    pub checks: Vec<RuleCheckResult>,
}

/// Metrics of one group of a sensitive attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub size: usize,
    pub mean_prediction: f64,
    pub std_prediction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_positive_rate: Option<f64>,
}

impl GroupMetrics {
    pub const FIELDS: [&'static str; 9] = [
        "size",
        "mean_prediction",
        "std_prediction",
        "accuracy",
        "precision",
        "recall",
        "outcome_rate",
        "prediction_rate",
        "false_positive_rate",
    ];

    /// Value of a metric by name, `None` when it was not computed.
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            "size" => Some(self.size as f64),
            "mean_prediction" => Some(self.mean_prediction),
            "std_prediction" => Some(self.std_prediction),
            "accuracy" => self.accuracy,
            "precision" => self.precision,
            "recall" => self.recall,
            "outcome_rate" => self.outcome_rate,
            "prediction_rate" => self.prediction_rate,
            "false_positive_rate" => self.false_positive_rate,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disparity {
    /// `max / min`, `+inf` when the denominator is zero.
    #[serde(with = "non_finite")]
    pub ratio: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDisparities {
    pub group_metrics: BTreeMap<String, GroupMetrics>,
    pub disparities: BTreeMap<String, Disparity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    pub timestamp: String,
    pub group_disparities: BTreeMap<String, AttributeDisparities>,
}

impl BiasAnalysis {
    /// Largest disparity ratio over every attribute and metric, 0 when there is none.
    pub fn max_ratio(&self) -> f64 {
        self.group_disparities
            .values()
            .flat_map(|a| a.disparities.values())
            .map(|d| d.ratio)
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub absolute_change: f64,
    #[serde(with = "non_finite")]
    pub percentage_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantChange {
    pub metric: String,
    #[serde(with = "non_finite")]
    pub change: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub timestamp: String,
    pub base_version: String,
    pub compare_version: String,
    pub metric_deltas: BTreeMap<String, MetricDelta>,
    pub significant_changes: Vec<SignificantChange>,
}

/// Everything recorded about one model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub model_name: String,
    pub model_version: String,
    pub timestamp: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
    #[serde(default)]
    pub validation_checks: Vec<OutputValidation>,
    #[serde(with = "empty_as_none", default)]
    pub bias_analysis: Option<BiasAnalysis>,
    #[serde(with = "empty_as_none", default)]
    pub performance_comparison: Option<VersionComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcare_validation: Option<HealthcareValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcare_bias: Option<HealthcareBias>,
}

impl ValidationReport {
    pub fn new(model_name: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_version: model_version.into(),
            timestamp: iso_timestamp(),
            metrics: BTreeMap::new(),
            validation_checks: Vec::new(),
            bias_analysis: None,
            performance_comparison: None,
            healthcare_validation: None,
            healthcare_bias: None,
        }
    }

    pub fn scalar_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(MetricValue::as_scalar)
    }
}

/// Delta of every scalar metric `base` and `other` have in common.
pub fn compare_versions(base: &ValidationReport, other: &ValidationReport) -> VersionComparison {
    let mut metric_deltas = BTreeMap::new();
    let mut significant_changes = Vec::new();

    for (metric, value) in &base.metrics {
        let (Some(base_value), Some(other_value)) = (value.as_scalar(), other.scalar_metric(metric))
        else {
            continue;
        };
        let absolute_change = base_value - other_value;
        let percentage_change = if other_value != 0.0 {
            absolute_change / other_value * 100.0
        } else {
            f64::INFINITY
        };
        metric_deltas.insert(
            metric.clone(),
            MetricDelta {
                absolute_change,
                percentage_change,
            },
        );

        if percentage_change.abs() > SIGNIFICANT_CHANGE {
            let severity = if percentage_change.abs() > HIGH_SEVERITY_CHANGE {
                Severity::High
            } else {
                Severity::Medium
            };
            significant_changes.push(SignificantChange {
                metric: metric.clone(),
                change: percentage_change,
                severity,
            });
        }
    }

    VersionComparison {
        timestamp: iso_timestamp(),
        base_version: base.model_version.clone(),
        compare_version: other.model_version.clone(),
        metric_deltas,
        significant_changes,
    }
}
