//! Healthcare layer over [`ModelValidator`]: a rule table keyed by output
//! type, clinical plausibility bounds, protected-attribute bias analysis and
//! regulatory compliance scoring.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{GuardError, GuardResult};
use crate::metrics::Scores;
use crate::report::{
    iso_timestamp, BiasAnalysis, Disparity, GroupMetrics, OutputValidation, PerformanceMetrics,
    ValidationReport, VersionComparison,
};
use crate::rules::{RuleCheckResult, RuleEngine, RuleKind, ValidationRule};
use crate::types::Batch;
use crate::utils::serde_helpers::non_finite;
use crate::validator::bias::{self, HEALTHCARE_DISPARITY_METRICS};
use crate::validator::ModelValidator;

pub const PROTECTED_ATTRIBUTES: [&str; 5] = ["age", "sex", "race", "ethnicity", "disability_status"];

pub const MAX_REALISTIC_COST: f64 = 1_000_000.0;
pub const BMI_MIN: f64 = 10.0;
pub const BMI_MAX: f64 = 60.0;
pub const DEFAULT_HIGH_COST_THRESHOLD: f64 = 50_000.0;
pub const PEDIATRIC_BMI_CAP: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceThresholds {
    pub minimum_accuracy: f64,
    pub maximum_bias: f64,
    pub maximum_disparity: f64,
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            minimum_accuracy: 0.90,
            maximum_bias: 0.10,
            maximum_disparity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthcareOutputType {
    #[serde(rename = "age_distribution")]
    Age,
    #[serde(rename = "bmi_distribution")]
    Bmi,
    #[serde(rename = "cost_distribution")]
    Cost,
}

impl HealthcareOutputType {
    pub const ALL: [HealthcareOutputType; 3] = [Self::Age, Self::Bmi, Self::Cost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age_distribution",
            Self::Bmi => "bmi_distribution",
            Self::Cost => "cost_distribution",
        }
    }
}

impl fmt::Display for HealthcareOutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthcareOutputType {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GuardError::unknown_category(s, Self::ALL.iter().map(|t| t.as_str())))
    }
}

/// The rule applied to each healthcare output type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcareRules {
    pub age_distribution: ValidationRule,
    pub bmi_distribution: ValidationRule,
    pub cost_distribution: ValidationRule,
}

impl Default for HealthcareRules {
    fn default() -> Self {
        Self {
            age_distribution: ValidationRule::range("age_range_check", 0.0, 120.0)
                .with_description("Check if age predictions/classifications are within valid ranges"),
            bmi_distribution: ValidationRule::range("bmi_range_check", BMI_MIN, BMI_MAX)
                .with_description("Check if BMI predictions are within valid ranges"),
            cost_distribution: ValidationRule::distribution("cost_distribution_check", 13_000.0, 5_000.0)
                .with_description("Check if cost predictions follow expected distribution"),
        }
    }
}

impl HealthcareRules {
    pub fn rule_for(&self, output_type: HealthcareOutputType) -> &ValidationRule {
        match output_type {
            HealthcareOutputType::Age => &self.age_distribution,
            HealthcareOutputType::Bmi => &self.bmi_distribution,
            HealthcareOutputType::Cost => &self.cost_distribution,
        }
    }
}

fn protected_attributes() -> Vec<String> {
    PROTECTED_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcareConfig {
    pub thresholds: ComplianceThresholds,
    pub rules: HealthcareRules,
    pub protected_attributes: Vec<String>,
}

impl Default for HealthcareConfig {
    fn default() -> Self {
        Self {
            thresholds: ComplianceThresholds::default(),
            rules: HealthcareRules::default(),
            protected_attributes: protected_attributes(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_context: Option<ClinicalContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_cost_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextValidity {
    pub valid: bool,
    pub context_specific_warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalValidity {
    pub clinically_valid: bool,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_specific: Option<ContextValidity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub name: String,
    pub passed: bool,
    #[serde(with = "non_finite")]
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub compliant: bool,
    pub checks: Vec<ComplianceCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareValidation {
    pub timestamp: String,
    pub output_type: HealthcareOutputType,
    pub healthcare_specific_checks: Vec<RuleCheckResult>,
    pub clinical_validity: ClinicalValidity,
    pub regulatory_compliance: ComplianceReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthcareDisparity {
    pub groups: BTreeMap<String, GroupMetrics>,
    pub disparity_metrics: BTreeMap<String, Disparity>,
}

impl HealthcareDisparity {
    /// The disparity with the largest ratio, if any metric was compared.
    pub fn worst(&self) -> Option<Disparity> {
        self.disparity_metrics
            .values()
            .copied()
            .max_by(|a, b| a.ratio.total_cmp(&b.ratio))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareBias {
    pub timestamp: String,
    pub protected_attributes: BTreeMap<String, HealthcareDisparity>,
    /// Worst disparity per protected attribute.
    pub healthcare_disparities: BTreeMap<String, Disparity>,
    pub compliance_status: ComplianceStatus,
}

pub struct HealthcareValidator {
    base: ModelValidator,
    config: HealthcareConfig,
}

impl HealthcareValidator {
    pub fn new(model_name: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self::with_config(model_name, model_version, HealthcareConfig::default())
    }

    pub fn with_config(
        model_name: impl Into<String>,
        model_version: impl Into<String>,
        config: HealthcareConfig,
    ) -> Self {
        Self {
            base: ModelValidator::new(model_name, model_version),
            config,
        }
    }

    pub fn config(&self) -> &HealthcareConfig {
        &self.config
    }

    pub fn validate_performance(
        &mut self,
        y_true: &[f64],
        y_pred: &[f64],
        y_prob: Option<Scores<'_>>,
    ) -> GuardResult<PerformanceMetrics> {
        self.base.validate_performance(y_true, y_pred, y_prob)
    }

    pub fn validate_outputs(
        &mut self,
        outputs: &[f64],
        expected_range: Option<(f64, f64)>,
        rules: &[ValidationRule],
    ) -> GuardResult<OutputValidation> {
        self.base.validate_outputs(outputs, expected_range, rules)
    }

    pub fn analyze_bias(
        &mut self,
        predictions: &[f64],
        sensitive_features: &Batch,
        target: Option<&[f64]>,
    ) -> GuardResult<BiasAnalysis> {
        self.base.analyze_bias(predictions, sensitive_features, target)
    }

    pub fn compare_versions(&mut self, other: &ValidationReport) -> VersionComparison {
        self.base.compare_versions(other)
    }

    pub fn report(&self) -> &ValidationReport {
        self.base.report()
    }

    pub fn into_report(self) -> ValidationReport {
        self.base.into_report()
    }

    /// Apply the output type's rule, clinical bounds and compliance checks.
    /// Replaces the report's `healthcare_validation`.
    pub fn validate_healthcare_outputs(
        &mut self,
        outputs: &[f64],
        output_type: &str,
        metadata: Option<&OutputMetadata>,
    ) -> GuardResult<HealthcareValidation> {
        if outputs.is_empty() {
            return Err(GuardError::EmptyInput("outputs".to_string()));
        }
        GuardError::ensure_finite("outputs", outputs)?;
        let output_type: HealthcareOutputType = output_type.parse()?;

        let rule = self.config.rules.rule_for(output_type);
        let validation = HealthcareValidation {
            timestamp: iso_timestamp(),
            output_type,
            healthcare_specific_checks: vec![RuleEngine::evaluate(outputs, rule)],
            clinical_validity: self.check_clinical_validity(outputs, output_type, metadata),
            regulatory_compliance: self.check_regulatory_compliance(),
        };

        self.base.report_mut().healthcare_validation = Some(validation.clone());
        info!(output_type = %output_type, "healthcare validation completed");
        Ok(validation)
    }

    /// Physiological and business plausibility of the outputs.
    pub fn check_clinical_validity(
        &self,
        outputs: &[f64],
        output_type: HealthcareOutputType,
        metadata: Option<&OutputMetadata>,
    ) -> ClinicalValidity {
        let mut warnings = Vec::new();
        match output_type {
            HealthcareOutputType::Cost => {
                if outputs.iter().any(|v| *v < 0.0) {
                    warnings.push("Negative cost predictions detected".to_string());
                }
                if outputs.iter().any(|v| *v > MAX_REALISTIC_COST) {
                    warnings.push("Extremely high cost predictions detected".to_string());
                }
            }
            HealthcareOutputType::Bmi => {
                if outputs.iter().any(|v| *v < BMI_MIN || *v > BMI_MAX) {
                    warnings.push("Physiologically impossible BMI values detected".to_string());
                }
            }
            HealthcareOutputType::Age => {}
        }

        let context_specific = metadata
            .and_then(|m| m.clinical_context.as_ref())
            .map(|context| self.check_context_specific_validity(outputs, output_type, context));

        ClinicalValidity {
            clinically_valid: warnings.is_empty(),
            warnings,
            context_specific,
        }
    }

    /// Stricter expectations for a care setting or population. The setting is
    /// consulted first; the population only applies outside an emergency.
    pub fn check_context_specific_validity(
        &self,
        outputs: &[f64],
        output_type: HealthcareOutputType,
        context: &ClinicalContext,
    ) -> ContextValidity {
        let mut warnings = Vec::new();
        if context.setting.as_deref() == Some("emergency") {
            if output_type == HealthcareOutputType::Cost {
                let threshold = context
                    .high_cost_threshold
                    .unwrap_or(DEFAULT_HIGH_COST_THRESHOLD);
                let high = outputs.iter().filter(|v| **v > threshold).count();
                if high > 0 {
                    warnings.push(format!("{high} predictions exceed emergency cost threshold"));
                }
            }
        } else if context.population.as_deref() == Some("pediatric")
            && output_type == HealthcareOutputType::Bmi
            && outputs.iter().any(|v| *v > PEDIATRIC_BMI_CAP)
        {
            warnings.push("Extremely high BMI predictions for pediatric population".to_string());
        }

        ContextValidity {
            valid: warnings.is_empty(),
            context_specific_warnings: warnings,
        }
    }

    /// Accuracy floor and bias ceiling against what the report already holds.
    ///
    /// Only the checks with recorded data are evaluated, so a report with
    /// neither metrics nor a bias analysis is compliant.
    pub fn check_regulatory_compliance(&self) -> ComplianceReport {
        let thresholds = self.config.thresholds;
        let report = self.base.report();
        let mut checks = Vec::new();

        if let Some(accuracy) = report.scalar_metric("accuracy") {
            checks.push(ComplianceCheck {
                name: "minimum_accuracy".to_string(),
                passed: accuracy >= thresholds.minimum_accuracy,
                value: accuracy,
                threshold: thresholds.minimum_accuracy,
            });
        }
        if let Some(analysis) = &report.bias_analysis {
            let max_disparity = analysis.max_ratio();
            let threshold = 1.0 + thresholds.maximum_bias;
            checks.push(ComplianceCheck {
                name: "maximum_bias".to_string(),
                passed: max_disparity <= threshold,
                value: max_disparity,
                threshold,
            });
        }

        ComplianceReport {
            compliant: checks.iter().all(|c| c.passed),
            checks,
        }
    }

    /// Group disparities for each protected attribute present in
    /// `sensitive_features`, ignoring zero-valued groups when looking for the
    /// minimum. Replaces the report's `healthcare_bias`.
    pub fn analyze_healthcare_bias(
        &mut self,
        predictions: &[f64],
        sensitive_features: &Batch,
        target: Option<&[f64]>,
    ) -> GuardResult<HealthcareBias> {
        bias::ensure_rows(predictions, sensitive_features.num_rows(), target)?;
        let ceiling = 1.0 + self.config.thresholds.maximum_disparity;

        let mut protected_attributes = BTreeMap::new();
        let mut healthcare_disparities = BTreeMap::new();
        let mut compliance_status = ComplianceStatus::Compliant;

        for attribute in &self.config.protected_attributes {
            let Some(labels) = sensitive_features.column_by_name(attribute) else {
                debug!(attribute = %attribute, "protected attribute not present");
                continue;
            };
            let groups: BTreeMap<String, GroupMetrics> = bias::partition(labels.as_ref())?
                .into_iter()
                .map(|(group, indices)| {
                    let metrics = bias::healthcare_group_metrics(predictions, &indices, target);
                    (group, metrics)
                })
                .collect();
            let disparity_metrics = if groups.len() > 1 {
                bias::disparities_positive_only(&groups, &HEALTHCARE_DISPARITY_METRICS)
            } else {
                BTreeMap::new()
            };
            let disparity = HealthcareDisparity {
                groups,
                disparity_metrics,
            };

            if let Some(worst) = disparity.worst() {
                if worst.ratio > ceiling {
                    compliance_status = ComplianceStatus::NonCompliant;
                }
                healthcare_disparities.insert(attribute.clone(), worst);
            }
            protected_attributes.insert(attribute.clone(), disparity);
        }

        let analysis = HealthcareBias {
            timestamp: iso_timestamp(),
            protected_attributes,
            healthcare_disparities,
            compliance_status,
        };
        self.base.report_mut().healthcare_bias = Some(analysis.clone());
        info!(status = ?analysis.compliance_status, "healthcare bias analysis completed");
        Ok(analysis)
    }
}
