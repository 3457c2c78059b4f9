use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::Stats;

/// Relative tolerance, as a share of the expected standard deviation, allowed
/// on both the mean and the standard deviation by a distribution rule.
pub const DISTRIBUTION_TOLERANCE: f64 = 0.1;

fn unnamed_rule() -> String {
    "unnamed_rule".to_string()
}

/// A declarative rule applied to a numeric output array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default = "unnamed_rule")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: RuleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Every value lies in the closed interval `[min, max]`.
    Range { min: f64, max: f64 },
    /// Mean and population standard deviation are both within
    /// `DISTRIBUTION_TOLERANCE * expected_std` of the expected values.
    Distribution { expected_mean: f64, expected_std: f64 },
    /// Any kind this engine does not know. Always evaluates to a failure.
    #[serde(other)]
    Unknown,
}

impl ValidationRule {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    pub fn range(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(name, "", RuleKind::Range { min, max })
    }

    pub fn distribution(name: impl Into<String>, expected_mean: f64, expected_std: f64) -> Self {
        Self::new(
            name,
            "",
            RuleKind::Distribution {
                expected_mean,
                expected_std,
            },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A numeric entry of a rule result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Count(u64),
    Value(f64),
}

impl Detail {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Detail::Count(n) => n as f64,
            Detail::Value(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheckResult {
    pub rule_name: String,
    pub description: String,
    pub passed: bool,
    pub details: BTreeMap<String, Detail>,
}

impl RuleCheckResult {
    fn failed(rule: &ValidationRule) -> Self {
        Self {
            rule_name: rule.name.clone(),
            description: rule.description.clone(),
            passed: false,
            details: BTreeMap::new(),
        }
    }
}

/// Share of `values` inside `[min, max]` as a percentage, and the count outside.
///
/// An empty slice is entirely within range.
pub fn range_summary(values: &[f64], min: f64, max: f64) -> (f64, usize) {
    if values.is_empty() {
        return (100.0, 0);
    }
    let outliers = values.iter().filter(|v| !(min..=max).contains(*v)).count();
    let within = (values.len() - outliers) as f64 / values.len() as f64 * 100.0;
    (within, outliers)
}

pub struct RuleEngine;

impl RuleEngine {
    pub fn evaluate(outputs: &[f64], rule: &ValidationRule) -> RuleCheckResult {
        let mut result = RuleCheckResult::failed(rule);
        match rule.kind {
            RuleKind::Range { min, max } => {
                let (within, outliers) = range_summary(outputs, min, max);
                result.passed = outliers == 0;
                result
                    .details
                    .insert("within_range_percentage".to_string(), Detail::Value(within));
                result
                    .details
                    .insert("outliers_count".to_string(), Detail::Count(outliers as u64));
            }
            RuleKind::Distribution {
                expected_mean,
                expected_std,
            } => {
                let stats = Stats::from_values(outputs.iter().copied());
                if stats.is_empty() {
                    return result;
                }
                let actual_mean = stats.mean();
                let actual_std = stats.population_std_dev();
                let tolerance = expected_std * DISTRIBUTION_TOLERANCE;
                result.passed = (actual_mean - expected_mean).abs() <= tolerance
                    && (actual_std - expected_std).abs() <= tolerance;
                for (key, value) in [
                    ("expected_mean", expected_mean),
                    ("actual_mean", actual_mean),
                    ("expected_std", expected_std),
                    ("actual_std", actual_std),
                ] {
                    result.details.insert(key.to_string(), Detail::Value(value));
                }
            }
            RuleKind::Unknown => {}
        }
        result
    }
}
