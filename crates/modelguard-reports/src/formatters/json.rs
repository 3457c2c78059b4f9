use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Error;

use modelguard_core::runner::RunOutput;
use modelguard_core::CheckResult;

use crate::Reporter;

/// Collects a whole run into one JSON document.
#[derive(Serialize, Deserialize)]
pub struct JsonFormatter {
    version: String,
    timestamp: String,
    passed: bool,
    checks: Vec<CheckEntry>,
}

#[derive(Serialize, Deserialize)]
struct CheckEntry {
    path: String,
    #[serde(flatten)]
    result: CheckResult,
}

impl JsonFormatter {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            passed: true,
            checks: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Reporter for JsonFormatter {
    fn on_start(&self) {}

    fn on_table_load(&self, _current: usize, _total: usize, _name: &str) {}

    fn on_run_start(&self) {}

    fn on_check_result(&mut self, output: &RunOutput) {
        self.passed &= output.result.is_passed();
        self.checks.push(CheckEntry {
            path: output.path.display().to_string(),
            result: output.result.clone(),
        });
    }

    fn on_summary(&self, _passed: usize, _failed: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelguard_core::{Issue, IssueKind};
    use std::path::PathBuf;

    #[test]
    fn test_collects_results() {
        let mut formatter = JsonFormatter::new("0.1.0");
        formatter.on_check_result(&RunOutput {
            result: CheckResult::from_issues("Null Value Check", Some("patients"), vec![]),
            path: PathBuf::from("out/a.json"),
        });
        let issue = Issue::new(IssueKind::OutOfRange, Some("age"), 1, "1 value".to_string());
        formatter.on_check_result(&RunOutput {
            result: CheckResult::from_issues("Value Range Check", Some("patients"), vec![issue]),
            path: PathBuf::from("out/b.json"),
        });

        let value: serde_json::Value = serde_json::from_str(&formatter.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], "0.1.0");
        assert_eq!(value["passed"], false);
        assert_eq!(value["checks"].as_array().unwrap().len(), 2);
        assert_eq!(value["checks"][1]["check_name"], "Value Range Check");
        assert_eq!(value["checks"][1]["issues"][0]["type"], "out_of_range");
        assert_eq!(value["checks"][0]["path"], "out/a.json");
    }
}
