use std::collections::{BTreeMap, BTreeSet};

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

use crate::checks::{DatasetCheck, Issue, IssueKind};
use crate::errors::{GuardError, GuardResult};
use crate::types::Batch;

/// Schema conformance check.
///
/// Reports two strictness levels: `passed` only requires the required
/// columns, `schema_valid` also requires every expected column and matching
/// column types. Unexpected extra columns are listed but never fail either.
#[derive(Debug, Clone, Default)]
pub struct SchemaCheck {
    expected_columns: BTreeSet<String>,
    required_columns: BTreeSet<String>,
    column_types: BTreeMap<String, DataType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeViolation {
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCheckResult {
    pub missing_required: Vec<String>,
    pub missing_expected: Vec<String>,
    pub unexpected_columns: Vec<String>,
    pub type_violations: BTreeMap<String, TypeViolation>,
    pub passed: bool,
    pub actual_columns: Vec<String>,
    pub expected_columns: Vec<String>,
    pub required_columns: Vec<String>,
    pub schema_valid: bool,
}

impl SchemaCheck {
    pub fn new<I, S>(expected_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_columns: expected_columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_required<I, S>(mut self, required_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = required_columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, data_type: DataType) -> Self {
        self.column_types.insert(column.into(), data_type);
        self
    }

    pub fn run(&self, batch: &Batch) -> SchemaCheckResult {
        let schema = batch.schema();
        let actual_columns: BTreeSet<String> =
            schema.fields().iter().map(|f| f.name().clone()).collect();

        let missing_required: Vec<String> = self
            .required_columns
            .difference(&actual_columns)
            .cloned()
            .collect();
        let missing_expected: Vec<String> = self
            .expected_columns
            .difference(&actual_columns)
            .cloned()
            .collect();
        let unexpected_columns: Vec<String> = actual_columns
            .difference(&self.expected_columns)
            .cloned()
            .collect();

        let mut type_violations = BTreeMap::new();
        for (column, expected) in &self.column_types {
            let Ok(field) = schema.field_with_name(column) else {
                continue;
            };
            if !type_matches(expected, field.data_type()) {
                type_violations.insert(
                    column.clone(),
                    TypeViolation {
                        expected: expected.to_string(),
                        actual: field.data_type().to_string(),
                    },
                );
            }
        }

        let passed = missing_required.is_empty();
        let schema_valid = passed && missing_expected.is_empty() && type_violations.is_empty();

        SchemaCheckResult {
            missing_required,
            missing_expected,
            unexpected_columns,
            type_violations,
            passed,
            actual_columns: actual_columns.into_iter().collect(),
            expected_columns: self.expected_columns.iter().cloned().collect(),
            required_columns: self.required_columns.iter().cloned().collect(),
            schema_valid,
        }
    }
}

/// Numeric types match by family (any integer width, any float width);
/// everything else must match exactly.
pub fn type_matches(expected: &DataType, actual: &DataType) -> bool {
    if expected.is_integer() {
        actual.is_integer()
    } else if expected.is_floating() {
        actual.is_floating()
    } else if expected.is_numeric() {
        actual.is_numeric()
    } else {
        expected == actual
    }
}

/// Parse a logical type name as used in configuration files.
pub fn parse_logical_type(name: &str) -> GuardResult<DataType> {
    match name.to_lowercase().as_str() {
        "integer" | "int" | "int64" => Ok(DataType::Int64),
        "float" | "double" | "float64" => Ok(DataType::Float64),
        "numeric" | "decimal" => Ok(DataType::Decimal128(38, 10)),
        "string" | "utf8" | "text" => Ok(DataType::Utf8),
        "boolean" | "bool" => Ok(DataType::Boolean),
        "date" | "date32" => Ok(DataType::Date32),
        _ => Err(GuardError::unknown_category(
            name,
            ["integer", "float", "numeric", "string", "boolean", "date"],
        )),
    }
}

impl DatasetCheck for SchemaCheck {
    fn name(&self) -> &'static str {
        "Schema Check"
    }

    fn issues(&self, batch: &Batch) -> GuardResult<Vec<Issue>> {
        let result = self.run(batch);
        let mut issues = Vec::new();

        for column in &result.missing_required {
            issues.push(Issue::new(
                IssueKind::MissingColumn,
                Some(column),
                1,
                format!("Required column {column} is missing"),
            ));
        }
        for column in result
            .missing_expected
            .iter()
            .filter(|c| !self.required_columns.contains(*c))
        {
            issues.push(Issue::new(
                IssueKind::MissingColumn,
                Some(column),
                1,
                format!("Expected column {column} is missing"),
            ));
        }
        for (column, violation) in &result.type_violations {
            issues.push(Issue::new(
                IssueKind::TypeMismatch,
                Some(column),
                1,
                format!(
                    "Column {column} has type {} but {} was expected",
                    violation.actual, violation.expected
                ),
            ));
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use arrow_array::{ArrayRef, Float32Array, Int32Array, StringArray};
    use std::sync::Arc;

    fn insurance_batch(age_type: DataType) -> Batch {
        let age: ArrayRef = match age_type {
            DataType::Utf8 => Arc::new(StringArray::from(vec!["19", "18"])),
            _ => Arc::new(Int32Array::from(vec![19, 18])),
        };
        let schema = Schema::new(vec![
            Field::new("age", age.data_type().clone(), true),
            Field::new("bmi", DataType::Float32, true),
            Field::new("sex", DataType::Utf8, true),
            Field::new("region", DataType::Utf8, true),
        ]);
        Batch::try_new(
            Arc::new(schema),
            vec![
                age,
                Arc::new(Float32Array::from(vec![27.9, 33.77])),
                Arc::new(StringArray::from(vec!["female", "male"])),
                Arc::new(StringArray::from(vec!["southwest", "southeast"])),
            ],
        )
        .unwrap()
    }

    fn check() -> SchemaCheck {
        SchemaCheck::new(["age", "bmi", "sex", "charges"])
            .with_required(["age", "sex"])
            .with_column_type("age", DataType::Int64)
            .with_column_type("bmi", DataType::Float64)
            .with_column_type("sex", DataType::Utf8)
    }

    #[test]
    fn test_passed_but_not_valid_when_optional_column_missing() {
        let result = check().run(&insurance_batch(DataType::Int32));
        assert!(result.passed);
        assert!(!result.schema_valid);
        assert_eq!(result.missing_expected, vec!["charges"]);
        assert_eq!(result.unexpected_columns, vec!["region"]);
        // Int32 and Float32 belong to the expected numeric families
        assert!(result.type_violations.is_empty());
    }

    #[test]
    fn test_type_violation_on_string_age() {
        let result = check().run(&insurance_batch(DataType::Utf8));
        assert!(result.type_violations.contains_key("age"));
        assert_eq!(result.type_violations["age"].expected, "Int64");
        assert_eq!(result.type_violations["age"].actual, "Utf8");
        assert!(!result.schema_valid);
        assert!(result.passed);
    }

    #[test]
    fn test_missing_required_fails_both() {
        let check = SchemaCheck::new(["age", "smoker"]).with_required(["smoker"]);
        let result = check.run(&insurance_batch(DataType::Int32));
        assert!(!result.passed);
        assert!(!result.schema_valid);
        assert_eq!(result.missing_required, vec!["smoker"]);
    }

    #[test]
    fn test_schema_valid_implies_passed() {
        let check = SchemaCheck::new(["age", "bmi", "sex", "region"]).with_required(["age"]);
        let result = check.run(&insurance_batch(DataType::Int32));
        assert!(result.schema_valid);
        assert!(result.passed);
    }

    #[test]
    fn test_issues_do_not_repeat_required_columns() {
        let check = SchemaCheck::new(["age", "smoker", "children"]).with_required(["smoker"]);
        let issues = check.issues(&insurance_batch(DataType::Int32)).unwrap();
        let columns: Vec<_> = issues.iter().filter_map(|i| i.column.as_deref()).collect();
        assert_eq!(columns, vec!["smoker", "children"]);
    }

    #[test]
    fn test_parse_logical_type() {
        assert_eq!(parse_logical_type("Integer").unwrap(), DataType::Int64);
        assert_eq!(parse_logical_type("string").unwrap(), DataType::Utf8);
        assert!(parse_logical_type("blob").is_err());
    }
}
