use serde::{Deserialize, Serialize};

use crate::checks::{Issue, IssueKind};
use crate::errors::GuardResult;
use crate::types::{column, value_label, Batch};
use crate::utils::hasher::{hash_key, KeySet, Xxh3Builder};

/// Referential consistency between a child key column and the parent key it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
}

impl ConsistencyCheck {
    pub fn new(
        child_table: impl Into<String>,
        child_column: impl Into<String>,
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        Self {
            child_table: child_table.into(),
            child_column: child_column.into(),
            parent_table: parent_table.into(),
            parent_column: parent_column.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        "Data Consistency Check"
    }

    /// Compare the distinct keys of both sides.
    pub fn issues(&self, child: &Batch, parent: &Batch) -> GuardResult<Vec<Issue>> {
        let child_keys = distinct_keys(child, &self.child_column)?;
        let parent_keys = distinct_keys(parent, &self.parent_column)?;

        let missing = child_keys.difference(&parent_keys).count();
        let orphaned = parent_keys.difference(&child_keys).count();

        let mut issues = Vec::new();
        if missing > 0 {
            issues.push(Issue::new(
                IssueKind::MissingReference,
                Some(&self.child_column),
                missing,
                format!(
                    "Found {missing} {} records with non-existent {} references",
                    self.child_table, self.parent_table
                ),
            ));
        }
        if orphaned > 0 {
            issues.push(Issue::new(
                IssueKind::OrphanedRecord,
                Some(&self.parent_column),
                orphaned,
                format!(
                    "Found {orphaned} {} records without {} records",
                    self.parent_table, self.child_table
                ),
            ));
        }
        Ok(issues)
    }
}

fn distinct_keys(batch: &Batch, name: &str) -> GuardResult<KeySet> {
    let array = column(batch, name)?;
    let mut keys = KeySet::with_hasher(Xxh3Builder);
    for i in 0..array.len() {
        if let Some(label) = value_label(array.as_ref(), i)? {
            keys.insert(hash_key(&label));
        }
    }
    Ok(keys)
}
