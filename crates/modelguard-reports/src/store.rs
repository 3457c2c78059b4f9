//! Persistence of validation report snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;
use tracing::info;

use modelguard_core::report::{self, VersionComparison};
use modelguard_core::{GuardResult, ValidationReport};

/// Keeps a name segment inside its directory.
fn file_part(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if std::path::is_separator(c) || c == '\0' { '_' } else { c })
        .collect()
}

/// A directory of saved report snapshots, created on first save.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Portable JSON form of a report: scalars, sequences and mappings only.
    /// Non-finite sentinels become the strings `"Infinity"`, `"-Infinity"` and `"NaN"`.
    pub fn serialize(report: &ValidationReport) -> GuardResult<Value> {
        Ok(serde_json::to_value(report)?)
    }

    /// Write `report` as `<model_name>_<model_version>_<timestamp>.json` and
    /// return the path. Path separators in the name and version become `_`. A snapshot saved within the same second replaces the previous one.
    pub fn save(&self, report: &ValidationReport) -> GuardResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!(
            "{}_{}_{stamp}.json",
            file_part(&report.model_name),
            file_part(&report.model_version)
        ));
        let value = Self::serialize(report)?;
        fs::write(&path, serde_json::to_string_pretty(&value)?)?;
        info!(path = %path.display(), "validation results saved");
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> GuardResult<ValidationReport> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn compare_versions(base: &ValidationReport, other: &ValidationReport) -> VersionComparison {
        report::compare_versions(base, other)
    }

    /// Compare two saved snapshots.
    pub fn compare_files(
        base: impl AsRef<Path>,
        other: impl AsRef<Path>,
    ) -> GuardResult<VersionComparison> {
        let base = Self::load(base)?;
        let other = Self::load(other)?;
        Ok(Self::compare_versions(&base, &other))
    }
}
