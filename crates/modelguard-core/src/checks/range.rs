use std::collections::BTreeMap;

use arrow_array::{Float64Array, Scalar};
use arrow_ord::cmp::{gt, lt};

use crate::checks::{DatasetCheck, Issue, IssueKind};
use crate::errors::GuardResult;
use crate::types::{as_float64, Batch};

/// Closed-interval bounds per column. Columns absent from the dataset are skipped,
/// nulls never count as violations.
#[derive(Debug, Clone, Default)]
pub struct RangeCheck {
    bounds: BTreeMap<String, (f64, f64)>,
}

impl RangeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(mut self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.bounds.insert(column.into(), (min, max));
        self
    }

    /// Number of values outside `[min, max]` per checked column.
    pub fn violations(&self, batch: &Batch) -> GuardResult<BTreeMap<String, usize>> {
        let mut out = BTreeMap::new();
        for (name, (min, max)) in &self.bounds {
            let Some(array) = batch.column_by_name(name) else {
                tracing::debug!(column = %name, "range check skipped, column absent");
                continue;
            };
            let values = as_float64(array.as_ref())?;
            let below = lt(&values, &Scalar::new(Float64Array::from(vec![*min])))?;
            let above = gt(&values, &Scalar::new(Float64Array::from(vec![*max])))?;
            out.insert(name.clone(), below.true_count() + above.true_count());
        }
        Ok(out)
    }
}

impl DatasetCheck for RangeCheck {
    fn name(&self) -> &'static str {
        "Value Range Check"
    }

    fn issues(&self, batch: &Batch) -> GuardResult<Vec<Issue>> {
        let issues = self
            .violations(batch)?
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(column, count)| {
                let (min, max) = self.bounds[&column];
                Issue::new(
                    IssueKind::OutOfRange,
                    Some(&column),
                    count,
                    format!("Found {count} values outside range [{min}, {max}] in column {column}"),
                )
            })
            .collect();
        Ok(issues)
    }
}
