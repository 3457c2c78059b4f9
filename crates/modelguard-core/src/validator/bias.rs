//! Group partitioning and disparity aggregation for sensitive attributes.

use std::collections::BTreeMap;

use arrow::array::Array;

use crate::errors::{GuardError, GuardResult};
use crate::metrics;
use crate::report::{Disparity, GroupMetrics};
use crate::stats::Stats;
use crate::types::value_label;

/// Metrics compared across groups by the healthcare analysis.
pub const HEALTHCARE_DISPARITY_METRICS: [&str; 3] =
    ["mean_prediction", "prediction_rate", "false_positive_rate"];

/// Row indices per distinct label. Null labels belong to no group.
pub fn partition(labels: &dyn Array) -> GuardResult<BTreeMap<String, Vec<usize>>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for i in 0..labels.len() {
        if let Some(label) = value_label(labels, i)? {
            groups.entry(label).or_default().push(i);
        }
    }
    Ok(groups)
}

pub fn ensure_rows(predictions: &[f64], rows: usize, target: Option<&[f64]>) -> GuardResult<()> {
    GuardError::ensure_aligned("predictions", predictions.len(), "sensitive_features", rows)?;
    GuardError::ensure_finite("predictions", predictions)?;
    if let Some(target) = target {
        GuardError::ensure_aligned("predictions", predictions.len(), "target", target.len())?;
        GuardError::ensure_finite("target", target)?;
    }
    Ok(())
}

fn pick(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|i| values[*i]).collect()
}

fn prediction_summary(predictions: &[f64]) -> GroupMetrics {
    let stats = Stats::from_values(predictions.iter().copied());
    GroupMetrics {
        size: predictions.len(),
        mean_prediction: stats.mean(),
        std_prediction: stats.population_std_dev(),
        ..GroupMetrics::default()
    }
}

/// Size, prediction mean and spread; with a target also accuracy and weighted precision/recall.
pub fn group_metrics(
    predictions: &[f64],
    indices: &[usize],
    target: Option<&[f64]>,
) -> GuardResult<GroupMetrics> {
    let preds = pick(predictions, indices);
    let mut group = prediction_summary(&preds);
    if let Some(target) = target {
        let truth = pick(target, indices);
        let scores = metrics::weighted_scores(&truth, &preds)?;
        group.accuracy = Some(metrics::accuracy(&truth, &preds)?);
        group.precision = Some(scores.precision);
        group.recall = Some(scores.recall);
    }
    Ok(group)
}

/// Size, prediction mean and spread; with a target also outcome, prediction
/// and false positive rates.
pub fn healthcare_group_metrics(
    predictions: &[f64],
    indices: &[usize],
    target: Option<&[f64]>,
) -> GroupMetrics {
    let preds = pick(predictions, indices);
    let mut group = prediction_summary(&preds);
    if let Some(target) = target {
        let truth = pick(target, indices);
        let negatives = truth.iter().filter(|t| **t == 0.0).count();
        let false_positives = truth
            .iter()
            .zip(&preds)
            .filter(|(t, p)| **t == 0.0 && **p == 1.0)
            .count();
        group.outcome_rate = Some(Stats::from_values(truth.iter().copied()).mean());
        group.prediction_rate = Some(group.mean_prediction);
        group.false_positive_rate = Some(if negatives > 0 {
            false_positives as f64 / negatives as f64
        } else {
            0.0
        });
    }
    group
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Disparity of every metric present in all groups. The minimum is taken
/// over all values, so a zero minimum yields an infinite ratio.
pub fn disparities_including_zero(
    groups: &BTreeMap<String, GroupMetrics>,
) -> BTreeMap<String, Disparity> {
    let mut out = BTreeMap::new();
    if groups.is_empty() {
        return out;
    }
    for metric in GroupMetrics::FIELDS {
        let values: Option<Vec<f64>> = groups.values().map(|g| g.get(metric)).collect();
        let Some((min, max)) = values.and_then(|v| min_max(v.into_iter())) else {
            continue;
        };
        let ratio = if min == 0.0 { f64::INFINITY } else { max / min };
        out.insert(
            metric.to_string(),
            Disparity {
                ratio,
                difference: max - min,
            },
        );
    }
    out
}

/// Disparity of the given metrics with the minimum taken over strictly
/// positive values only. Missing values count as zero; a metric that is zero
/// in every group is left out.
pub fn disparities_positive_only(
    groups: &BTreeMap<String, GroupMetrics>,
    metrics: &[&str],
) -> BTreeMap<String, Disparity> {
    let mut out = BTreeMap::new();
    for metric in metrics {
        let values: Vec<f64> = groups.values().map(|g| g.get(metric).unwrap_or(0.0)).collect();
        if values.iter().all(|v| *v == 0.0) {
            continue;
        }
        let Some((min, _)) = min_max(values.iter().copied().filter(|v| *v > 0.0)) else {
            continue;
        };
        let Some((_, max)) = min_max(values.into_iter()) else {
            continue;
        };
        out.insert(
            metric.to_string(),
            Disparity {
                ratio: max / min,
                difference: max - min,
            },
        );
    }
    out
}
