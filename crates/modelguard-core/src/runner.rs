//! Sequential execution of dataset checks over a catalog of named tables.
//!
//! Every check result is written to its own JSON file as soon as it is
//! produced, so an interrupted run leaves the earlier results intact.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::checks::{CheckResult, ConsistencyCheck, DatasetCheck, NullCheck, RangeCheck};
use crate::errors::{GuardError, GuardResult};
use crate::types::Batch;

/// Registry of loaded tables, addressed by name.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tables: BTreeMap<String, Batch>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. A table with the same name is replaced.
    pub fn insert(&mut self, name: impl Into<String>, batch: Batch) {
        let _ = self.tables.insert(name.into(), batch);
    }

    pub fn get(&self, name: &str) -> GuardResult<&Batch> {
        self.tables
            .get(name)
            .ok_or_else(|| GuardError::MissingTable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// One unit of work in a run.
pub enum Step {
    Table {
        table: String,
        check: Box<dyn DatasetCheck>,
    },
    Consistency(ConsistencyCheck),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Table { check, .. } => check.name(),
            Step::Consistency(check) => check.name(),
        }
    }

    fn table(&self) -> Option<&str> {
        match self {
            Step::Table { table, .. } => Some(table),
            Step::Consistency(_) => None,
        }
    }

    fn execute(&self, catalog: &Catalog) -> GuardResult<CheckResult> {
        match self {
            Step::Table { table, check } => {
                let issues = check.issues(catalog.get(table)?)?;
                Ok(CheckResult::from_issues(check.name(), Some(table), issues))
            }
            Step::Consistency(check) => {
                let child = catalog.get(&check.child_table)?;
                let parent = catalog.get(&check.parent_table)?;
                let issues = check.issues(child, parent)?;
                Ok(CheckResult::from_issues(check.name(), None, issues))
            }
        }
    }
}

/// A persisted check result.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub result: CheckResult,
    pub path: PathBuf,
}

pub struct CheckRunner {
    results_dir: PathBuf,
    catalog: Catalog,
    steps: Vec<Step>,
}

impl CheckRunner {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            catalog: Catalog::new(),
            steps: Vec::new(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn add_table(&mut self, name: impl Into<String>, batch: Batch) {
        self.catalog.insert(name, batch);
    }

    /// Queue a check against a named table. The table only has to exist when the run starts.
    pub fn add_check(&mut self, table: impl Into<String>, check: Box<dyn DatasetCheck>) {
        self.steps.push(Step::Table {
            table: table.into(),
            check,
        });
    }

    pub fn add_consistency(&mut self, check: ConsistencyCheck) {
        self.steps.push(Step::Consistency(check));
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Queue the insurance data plan: null and range checks on `patients`
    /// then `insurance_charges`, then the reference between the two.
    pub fn with_insurance_plan(mut self) -> Self {
        let patients = RangeCheck::new()
            .with_bounds("age", 0.0, 120.0)
            .with_bounds("bmi", 10.0, 60.0)
            .with_bounds("children", 0.0, 10.0);
        let charges = RangeCheck::new().with_bounds("charges", 0.0, 100_000.0);

        self.add_check("patients", Box::new(NullCheck::new(0.0)));
        self.add_check("patients", Box::new(patients));
        self.add_check("insurance_charges", Box::new(NullCheck::new(0.0)));
        self.add_check("insurance_charges", Box::new(charges));
        self.add_consistency(ConsistencyCheck::new(
            "insurance_charges",
            "patient_id",
            "patients",
            "id",
        ));
        self
    }

    /// Execute every queued step in order and persist each result.
    ///
    /// A step that fails is recorded as a failed result; only I/O errors on
    /// the results directory abort the run.
    pub fn run(&self) -> GuardResult<Vec<RunOutput>> {
        fs::create_dir_all(&self.results_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut used = HashSet::new();
        let mut outputs = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let result = match step.execute(&self.catalog) {
                Ok(result) => result,
                Err(e) => {
                    warn!(check = step.name(), error = %e, "check failed to run");
                    CheckResult::errored(step.name(), step.table(), &e)
                }
            };
            let path = self.result_path(&stamp, &result.check_name, &mut used);
            fs::write(&path, serde_json::to_string_pretty(&result)?)?;
            info!(
                check = %result.check_name,
                status = ?result.status,
                issues = result.issues.len(),
                path = %path.display(),
                "check completed"
            );
            outputs.push(RunOutput { result, path });
        }
        Ok(outputs)
    }

    fn result_path(&self, stamp: &str, check_name: &str, used: &mut HashSet<String>) -> PathBuf {
        let base = format!("{stamp}_{}", check_name.replace(' ', ""));
        let mut name = base.clone();
        let mut n = 1;
        while !used.insert(name.clone()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        self.results_dir.join(format!("{name}.json"))
    }
}
