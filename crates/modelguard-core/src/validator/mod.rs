//! Model validators. Each instance owns one [`ValidationReport`] that every
//! validation call records into.

use std::collections::BTreeMap;

use tracing::info;

use crate::errors::{GuardError, GuardResult};
use crate::metrics::{self, Scores};
use crate::report::{
    self, iso_timestamp, AttributeDisparities, BiasAnalysis, OutputStatistics, OutputValidation,
    PerformanceMetrics, RangeSummary, ValidationReport, VersionComparison,
};
use crate::rules::{range_summary, RuleEngine, ValidationRule};
use crate::stats::{median, Stats};
use crate::types::Batch;

pub mod bias;
pub mod healthcare;

pub use healthcare::HealthcareValidator;

pub struct ModelValidator {
    report: ValidationReport,
}

impl ModelValidator {
    pub fn new(model_name: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            report: ValidationReport::new(model_name, model_version),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.report.model_name
    }

    pub fn model_version(&self) -> &str {
        &self.report.model_version
    }

    /// Accuracy, weighted precision/recall/F1, the confusion matrix and, when
    /// scores are given, ROC-AUC. Replaces the report's `metrics`.
    pub fn validate_performance(
        &mut self,
        y_true: &[f64],
        y_pred: &[f64],
        y_prob: Option<Scores<'_>>,
    ) -> GuardResult<PerformanceMetrics> {
        GuardError::ensure_finite("y_true", y_true)?;
        GuardError::ensure_finite("y_pred", y_pred)?;
        match y_prob {
            Some(Scores::Binary(scores)) => GuardError::ensure_finite("y_prob", scores)?,
            Some(Scores::PerClass(rows)) => {
                for row in rows {
                    GuardError::ensure_finite("y_prob", row)?;
                }
            }
            None => {}
        }
        let accuracy = metrics::accuracy(y_true, y_pred)?;
        let scores = metrics::weighted_scores(y_true, y_pred)?;
        let roc_auc = match y_prob {
            Some(prob) => Some(metrics::roc_auc(y_true, prob)?),
            None => None,
        };
        let performance = PerformanceMetrics {
            accuracy,
            precision: scores.precision,
            recall: scores.recall,
            f1: scores.f1,
            roc_auc,
            confusion_matrix: metrics::confusion_matrix(y_true, y_pred)?,
        };

        self.report.metrics = performance.to_metric_map();
        info!(
            model = %self.report.model_name,
            version = %self.report.model_version,
            accuracy,
            "performance validation completed"
        );
        Ok(performance)
    }

    /// Summary statistics, optional range coverage and rule results for a
    /// numeric output array. Appended to the report's `validation_checks`.
    pub fn validate_outputs(
        &mut self,
        outputs: &[f64],
        expected_range: Option<(f64, f64)>,
        rules: &[ValidationRule],
    ) -> GuardResult<OutputValidation> {
        if outputs.is_empty() {
            return Err(GuardError::EmptyInput("outputs".to_string()));
        }
        GuardError::ensure_finite("outputs", outputs)?;
        let stats = Stats::from_values(outputs.iter().copied());
        let statistics = OutputStatistics {
            mean: stats.mean(),
            std: stats.population_std_dev(),
            min: stats.min(),
            max: stats.max(),
            median: median(outputs).unwrap_or(f64::NAN),
        };
        let range_check = expected_range.map(|(min, max)| {
            let (within_range_percentage, outliers_count) = range_summary(outputs, min, max);
            RangeSummary {
                within_range_percentage,
                outliers_count,
            }
        });
        let checks = rules
            .iter()
            .map(|rule| RuleEngine::evaluate(outputs, rule))
            .collect();

        let validation = OutputValidation {
            timestamp: iso_timestamp(),
            total_outputs: outputs.len(),
            statistics,
            range_check,
            checks,
        };
        self.report.validation_checks.push(validation.clone());
        info!(model = %self.report.model_name, outputs = outputs.len(), "output validation completed");
        Ok(validation)
    }

    /// Per-group prediction metrics and their disparities for every column of
    /// `sensitive_features`. Replaces the report's `bias_analysis`.
    pub fn analyze_bias(
        &mut self,
        predictions: &[f64],
        sensitive_features: &Batch,
        target: Option<&[f64]>,
    ) -> GuardResult<BiasAnalysis> {
        bias::ensure_rows(predictions, sensitive_features.num_rows(), target)?;

        let schema = sensitive_features.schema();
        let mut group_disparities = BTreeMap::new();
        for (field, labels) in schema.fields().iter().zip(sensitive_features.columns()) {
            let mut group_metrics = BTreeMap::new();
            for (group, indices) in bias::partition(labels.as_ref())? {
                let metrics = bias::group_metrics(predictions, &indices, target)?;
                group_metrics.insert(group, metrics);
            }
            let disparities = bias::disparities_including_zero(&group_metrics);
            group_disparities.insert(
                field.name().clone(),
                AttributeDisparities {
                    group_metrics,
                    disparities,
                },
            );
        }

        let analysis = BiasAnalysis {
            timestamp: iso_timestamp(),
            group_disparities,
        };
        self.report.bias_analysis = Some(analysis.clone());
        info!(model = %self.report.model_name, "bias analysis completed");
        Ok(analysis)
    }

    /// Compare this report's metrics with another version's. Stored as the
    /// report's `performance_comparison`.
    pub fn compare_versions(&mut self, other: &ValidationReport) -> VersionComparison {
        let comparison = report::compare_versions(&self.report, other);
        self.report.performance_comparison = Some(comparison.clone());
        info!(
            model = %self.report.model_name,
            base = %comparison.base_version,
            other = %comparison.compare_version,
            significant = comparison.significant_changes.len(),
            "version comparison completed"
        );
        comparison
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut ValidationReport {
        &mut self.report
    }

    pub fn into_report(self) -> ValidationReport {
        self.report
    }
}
