use modelguard_core::runner::RunOutput;
use modelguard_core::CheckResult;

use crate::{utils::numbers::format_numbers, Reporter};

pub struct StdOutFormatter {
    intro: String,
}

impl StdOutFormatter {
    pub fn new(version: &str) -> Self {
        Self {
            intro: format!("ModelGuard v{version} - Data Quality Report"),
        }
    }

    /// One line per check, then one indented line per issue.
    pub fn render_result(result: &CheckResult) -> String {
        let status = if result.is_passed() { "PASSED" } else { "FAILED" };
        let scope = match &result.table {
            Some(table) => format!("{} [{table}]", result.check_name),
            None => result.check_name.clone(),
        };
        let mut out = format!("{scope} - {status}");

        let width = result
            .issues
            .iter()
            .map(|i| i.column.as_deref().map_or(0, str::len))
            .max()
            .unwrap_or(0);
        for issue in &result.issues {
            let column = issue.column.as_deref().unwrap_or("");
            let dots = ".".repeat(width - column.len() + 4);
            out.push_str(&format!(
                "\n  {column} {dots} {:>6}  {}",
                format_numbers(issue.count),
                issue.details
            ));
        }
        out
    }
}

impl Reporter for StdOutFormatter {
    fn on_start(&self) {
        println!("{}", self.intro);
        println!("{}", "=".repeat(self.intro.len()));
        println!("Loading data...");
    }

    fn on_table_load(&self, current: usize, total: usize, name: &str) {
        println!("  [{current}/{total}] {name}");
    }

    fn on_run_start(&self) {
        println!("\nRunning checks...");
    }

    fn on_check_result(&mut self, output: &RunOutput) {
        println!("\n{}", Self::render_result(&output.result));
        println!("  -> {}", output.path.display());
    }

    fn on_summary(&self, passed: usize, failed: usize) {
        println!("\n{}", "=".repeat(self.intro.len()));
        println!("Result: {failed} failed, {passed} passed");
    }
}
