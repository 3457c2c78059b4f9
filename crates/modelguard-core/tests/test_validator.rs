use arrow::datatypes::{DataType, Field, Schema};
use arrow_array::{Int64Array, StringArray};
use modelguard_core::report::Severity;
use modelguard_core::{
    Batch, MetricValue, ModelValidator, RuleKind, Scores, ValidationReport, ValidationRule,
};
use std::sync::Arc;

fn sensitive_features() -> Batch {
    let schema = Schema::new(vec![
        Field::new("sex", DataType::Utf8, true),
        Field::new("children", DataType::Int64, true),
    ]);
    Batch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["female", "male", "female", "male"])),
            Arc::new(Int64Array::from(vec![0, 0, 1, 1])),
        ],
    )
    .unwrap()
}

#[test]
fn test_end_to_end_version_comparison() {
    let mut validator = ModelValidator::new("readmission", "2.0");
    let metrics = validator
        .validate_performance(&[1.0, 0.0, 1.0, 0.0], &[1.0, 0.0, 0.0, 0.0], None)
        .unwrap();
    assert_eq!(metrics.accuracy, 0.75);
    assert_eq!(
        validator.report().metrics["accuracy"],
        MetricValue::Scalar(0.75)
    );

    let mut previous = ValidationReport::new("readmission", "1.0");
    previous
        .metrics
        .insert("accuracy".to_string(), MetricValue::Scalar(0.70));

    let comparison = validator.compare_versions(&previous);
    let delta = comparison.metric_deltas["accuracy"];
    assert!((delta.absolute_change - 0.05).abs() < 1e-9);
    assert!((delta.percentage_change - 7.14).abs() < 0.01);

    let change = comparison
        .significant_changes
        .iter()
        .find(|c| c.metric == "accuracy")
        .unwrap();
    assert_eq!(change.severity, Severity::Medium);
    assert_eq!(
        validator.report().performance_comparison.as_ref(),
        Some(&comparison)
    );
}

#[test]
fn test_multiclass_metrics() {
    let mut validator = ModelValidator::new("region", "1.0");
    let y_true = [0.0, 1.0, 2.0, 2.0, 1.0, 0.0];
    let y_pred = [0.0, 1.0, 2.0, 1.0, 1.0, 0.0];
    let rows = vec![
        vec![0.7, 0.2, 0.1],
        vec![0.1, 0.7, 0.2],
        vec![0.1, 0.2, 0.7],
        vec![0.1, 0.5, 0.4],
        vec![0.2, 0.6, 0.2],
        vec![0.8, 0.1, 0.1],
    ];
    let metrics = validator
        .validate_performance(&y_true, &y_pred, Some(Scores::PerClass(&rows)))
        .unwrap();
    assert!((metrics.accuracy - 5.0 / 6.0).abs() < 1e-12);
    assert_eq!(metrics.confusion_matrix[2], vec![0, 1, 1]);
    assert!(metrics.roc_auc.unwrap() > 0.9);
    assert!(validator.report().metrics.contains_key("roc_auc"));
}

#[test]
fn test_output_rules_and_range() {
    let mut validator = ModelValidator::new("charges", "1.0");
    let rules = vec![
        ValidationRule::range("score_range", 0.0, 10.0),
        ValidationRule::new("skew", "not supported", RuleKind::Unknown),
    ];
    let validation = validator
        .validate_outputs(&[5.0, 10.0, 15.0], Some((0.0, 10.0)), &rules)
        .unwrap();

    let range = validation.range_check.unwrap();
    assert!((range.within_range_percentage - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(range.outliers_count, 1);
    assert_eq!(validation.statistics.mean, 10.0);
    assert_eq!(validation.checks.len(), 2);
    assert!(!validation.checks[0].passed);
    assert!(!validation.checks[1].passed);
    assert!(validation.checks[1].details.is_empty());
}

#[test]
fn test_bias_analysis_per_attribute() {
    let mut validator = ModelValidator::new("readmission", "1.0");
    let predictions = [1.0, 0.0, 1.0, 1.0];
    let target = [1.0, 0.0, 0.0, 1.0];
    let analysis = validator
        .analyze_bias(&predictions, &sensitive_features(), Some(&target))
        .unwrap();

    let sex = &analysis.group_disparities["sex"];
    assert_eq!(sex.group_metrics.len(), 2);
    assert_eq!(sex.group_metrics["female"].mean_prediction, 1.0);
    assert_eq!(sex.group_metrics["male"].mean_prediction, 0.5);
    assert_eq!(sex.disparities["mean_prediction"].ratio, 2.0);
    assert!(sex.disparities.contains_key("accuracy"));

    let children = &analysis.group_disparities["children"];
    assert_eq!(children.group_metrics["0"].size, 2);
    assert_eq!(children.group_metrics["1"].accuracy, Some(0.5));
}

#[test]
fn test_report_json_carries_sentinel() {
    let mut validator = ModelValidator::new("charges", "1.0");
    validator
        .analyze_bias(&[100.0, 0.0, 100.0, 0.0], &sensitive_features(), None)
        .unwrap();
    let value = serde_json::to_value(validator.report()).unwrap();
    let ratio = &value["bias_analysis"]["group_disparities"]["sex"]["disparities"]
        ["mean_prediction"]["ratio"];
    assert_eq!(ratio, "Infinity");

    let loaded: ValidationReport = serde_json::from_value(value).unwrap();
    let analysis = loaded.bias_analysis.unwrap();
    assert!(analysis.group_disparities["sex"].disparities["mean_prediction"]
        .ratio
        .is_infinite());
}
