use arrow::datatypes::{DataType, Field, Schema};
use arrow_array::{ArrayRef, StringArray};
use modelguard_core::validator::healthcare::{ComplianceStatus, PROTECTED_ATTRIBUTES};
use modelguard_core::{
    Batch, ClinicalContext, GuardError, HealthcareConfig, HealthcareOutputType,
    HealthcareValidator, OutputMetadata,
};
use std::sync::Arc;

fn features(columns: &[(&str, Vec<&str>)]) -> Batch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, values)| Arc::new(StringArray::from(values.clone())) as ArrayRef)
        .collect();
    Batch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

fn emergency() -> OutputMetadata {
    OutputMetadata {
        clinical_context: Some(ClinicalContext {
            setting: Some("emergency".to_string()),
            population: None,
            high_cost_threshold: None,
        }),
    }
}

#[test]
fn test_rejects_invalid_outputs() {
    let mut validator = HealthcareValidator::new("charges", "1.0");
    let err = validator
        .validate_healthcare_outputs(&[], "cost_distribution", None)
        .unwrap_err();
    assert!(matches!(err, GuardError::EmptyInput(_)));

    let err = validator
        .validate_healthcare_outputs(&[1.0], "heart_rate", None)
        .unwrap_err();
    assert!(matches!(err, GuardError::UnknownCategory { .. }));

    let err = validator
        .validate_healthcare_outputs(&[24.0, f64::NAN], "bmi_distribution", None)
        .unwrap_err();
    assert!(matches!(err, GuardError::NonFiniteInput { index: 1, .. }));
    assert!(validator.report().healthcare_validation.is_none());
}

#[test]
fn test_cost_outputs_in_emergency() {
    let mut validator = HealthcareValidator::new("charges", "1.0");
    let outputs = [-10.0, 12_000.0, 60_000.0, 2_000_000.0];
    let validation = validator
        .validate_healthcare_outputs(&outputs, "cost_distribution", Some(&emergency()))
        .unwrap();

    assert_eq!(validation.output_type, HealthcareOutputType::Cost);
    assert_eq!(validation.healthcare_specific_checks.len(), 1);
    assert!(!validation.healthcare_specific_checks[0].passed);

    let clinical = &validation.clinical_validity;
    assert!(!clinical.clinically_valid);
    assert_eq!(clinical.warnings.len(), 2);
    let context = clinical.context_specific.as_ref().unwrap();
    assert!(!context.valid);
    assert_eq!(
        context.context_specific_warnings,
        vec!["2 predictions exceed emergency cost threshold"]
    );
    assert_eq!(validator.report().healthcare_validation.as_ref(), Some(&validation));
}

#[test]
fn test_custom_emergency_threshold() {
    let validator = HealthcareValidator::new("charges", "1.0");
    let context = ClinicalContext {
        setting: Some("emergency".to_string()),
        population: None,
        high_cost_threshold: Some(100_000.0),
    };
    let result = validator.check_context_specific_validity(
        &[60_000.0],
        HealthcareOutputType::Cost,
        &context,
    );
    assert!(result.valid);
}

#[test]
fn test_pediatric_bmi() {
    let mut validator = HealthcareValidator::new("bmi", "1.0");
    let metadata = OutputMetadata {
        clinical_context: Some(ClinicalContext {
            setting: Some("outpatient".to_string()),
            population: Some("pediatric".to_string()),
            high_cost_threshold: None,
        }),
    };
    let validation = validator
        .validate_healthcare_outputs(&[18.0, 42.0, 25.0], "bmi_distribution", Some(&metadata))
        .unwrap();
    assert!(validation.clinical_validity.clinically_valid);
    assert!(validation.healthcare_specific_checks[0].passed);
    let context = validation.clinical_validity.context_specific.unwrap();
    assert_eq!(
        context.context_specific_warnings,
        vec!["Extremely high BMI predictions for pediatric population"]
    );
}

#[test]
fn test_compliance_uses_recorded_metrics_and_bias() {
    let mut validator = HealthcareValidator::new("readmission", "1.0");
    validator
        .validate_performance(&[1.0, 0.0, 1.0, 0.0], &[1.0, 0.0, 0.0, 0.0], None)
        .unwrap();
    let compliance = validator.check_regulatory_compliance();
    assert!(!compliance.compliant);
    assert_eq!(compliance.checks.len(), 1);
    assert_eq!(compliance.checks[0].name, "minimum_accuracy");
    assert_eq!(compliance.checks[0].value, 0.75);

    let sex = features(&[("sex", vec!["F", "F", "M", "M"])]);
    validator
        .analyze_bias(&[0.4, 0.6, 0.4, 0.6], &sex, None)
        .unwrap();
    let compliance = validator.check_regulatory_compliance();
    assert_eq!(compliance.checks.len(), 2);
    assert_eq!(compliance.checks[1].name, "maximum_bias");
    assert!(compliance.checks[1].passed);
    assert!((compliance.checks[1].threshold - 1.1).abs() < 1e-12);
}

#[test]
fn test_healthcare_bias_flags_disparity() {
    let mut validator = HealthcareValidator::new("readmission", "1.0");
    let sensitive = features(&[
        ("sex", vec!["F", "F", "M", "M"]),
        ("race", vec!["a", "a", "a", "a"]),
        ("region", vec!["ne", "nw", "ne", "nw"]),
    ]);
    let predictions = [1.0, 1.0, 1.0, 0.0];
    let target = [1.0, 0.0, 0.0, 0.0];
    let analysis = validator
        .analyze_healthcare_bias(&predictions, &sensitive, Some(&target))
        .unwrap();

    // region is not protected; race has a single group so nothing is compared
    assert!(!analysis.protected_attributes.contains_key("region"));
    assert!(analysis.protected_attributes["race"].disparity_metrics.is_empty());
    assert!(!analysis.healthcare_disparities.contains_key("race"));

    let sex = &analysis.protected_attributes["sex"];
    assert_eq!(sex.disparity_metrics["mean_prediction"].ratio, 2.0);
    assert_eq!(sex.disparity_metrics["false_positive_rate"].ratio, 2.0);
    assert_eq!(analysis.healthcare_disparities["sex"].ratio, 2.0);
    assert_eq!(analysis.compliance_status, ComplianceStatus::NonCompliant);
    assert!(validator.report().healthcare_bias.is_some());
}

#[test]
fn test_healthcare_bias_ignores_zero_groups() {
    let mut validator = HealthcareValidator::new("readmission", "1.0");
    let sensitive = features(&[("sex", vec!["F", "F", "M", "M", "X", "X"])]);
    let analysis = validator
        .analyze_healthcare_bias(&[1.0, 1.0, 1.05, 1.05, 0.0, 0.0], &sensitive, None)
        .unwrap();
    let mean = analysis.protected_attributes["sex"].disparity_metrics["mean_prediction"];
    assert!((mean.ratio - 1.05).abs() < 1e-12);
    assert_eq!(analysis.compliance_status, ComplianceStatus::Compliant);
}

#[test]
fn test_configured_protected_attributes() {
    let config = HealthcareConfig {
        protected_attributes: vec!["region".to_string()],
        ..HealthcareConfig::default()
    };
    assert_eq!(HealthcareConfig::default().protected_attributes.len(), PROTECTED_ATTRIBUTES.len());
    let mut validator = HealthcareValidator::with_config("readmission", "1.0", config);
    let sensitive = features(&[("region", vec!["ne", "nw"]), ("sex", vec!["F", "M"])]);
    let analysis = validator
        .analyze_healthcare_bias(&[1.0, 2.0], &sensitive, None)
        .unwrap();
    assert_eq!(analysis.protected_attributes.len(), 1);
    assert_eq!(analysis.healthcare_disparities["region"].ratio, 2.0);
}
