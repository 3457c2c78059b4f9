//! Classification metrics over numeric label arrays.
//!
//! Labels are compared as `f64`; the class set is the sorted union of the
//! labels seen in `y_true` and `y_pred`.

use crate::errors::{GuardError, GuardResult};
use crate::stats::cmp_f64;

/// Weighted (by true support) precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Prediction scores used for ROC-AUC.
#[derive(Debug, Clone, Copy)]
pub enum Scores<'a> {
    /// One score per row for the positive (larger) class of a binary problem.
    Binary(&'a [f64]),
    /// One score per class per row, columns ordered like the sorted `y_true` classes.
    PerClass(&'a [Vec<f64>]),
}

impl Scores<'_> {
    pub fn len(&self) -> usize {
        match self {
            Scores::Binary(s) => s.len(),
            Scores::PerClass(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[inline]
fn normalize(label: f64) -> f64 {
    // -0.0 and 0.0 are the same class
    if label == 0.0 { 0.0 } else { label }
}

/// Sorted distinct labels across all given arrays.
pub fn classes(arrays: &[&[f64]]) -> Vec<f64> {
    let mut out: Vec<f64> = arrays.iter().flat_map(|a| a.iter().map(|v| normalize(*v))).collect();
    out.sort_by(cmp_f64);
    out.dedup();
    out
}

fn class_index(classes: &[f64], label: f64) -> Option<usize> {
    classes.binary_search_by(|c| cmp_f64(c, &normalize(label))).ok()
}

fn check_inputs(y_true: &[f64], y_pred: &[f64]) -> GuardResult<()> {
    if y_true.is_empty() {
        return Err(GuardError::EmptyInput("y_true".to_string()));
    }
    if y_pred.is_empty() {
        return Err(GuardError::EmptyInput("y_pred".to_string()));
    }
    GuardError::ensure_aligned("y_true", y_true.len(), "y_pred", y_pred.len())
}

pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> GuardResult<f64> {
    check_inputs(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| normalize(**t) == normalize(**p))
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Rows are true classes, columns predicted classes.
pub fn confusion_matrix(y_true: &[f64], y_pred: &[f64]) -> GuardResult<Vec<Vec<u64>>> {
    check_inputs(y_true, y_pred)?;
    let classes = classes(&[y_true, y_pred]);
    let mut matrix = vec![vec![0u64; classes.len()]; classes.len()];
    for (t, p) in y_true.iter().zip(y_pred) {
        if let (Some(i), Some(j)) = (class_index(&classes, *t), class_index(&classes, *p)) {
            matrix[i][j] += 1;
        }
    }
    Ok(matrix)
}

pub fn weighted_scores(y_true: &[f64], y_pred: &[f64]) -> GuardResult<WeightedScores> {
    let matrix = confusion_matrix(y_true, y_pred)?;
    let total = y_true.len() as f64;
    let mut scores = WeightedScores {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };

    for (k, row) in matrix.iter().enumerate() {
        let support: u64 = row.iter().sum();
        if support == 0 {
            continue;
        }
        let tp = row[k] as f64;
        let predicted: u64 = matrix.iter().map(|r| r[k]).sum();
        let precision = if predicted > 0 { tp / predicted as f64 } else { 0.0 };
        let recall = tp / support as f64;
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let weight = support as f64 / total;
        scores.precision += weight * precision;
        scores.recall += weight * recall;
        scores.f1 += weight * f1;
    }
    Ok(scores)
}

/// 1-based ranks, ties share their average rank.
fn mid_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| cmp_f64(&values[*a], &values[*b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Area under the ROC curve of `scores` for the rows where `positive` is true.
fn binary_auc(positive: &[bool], scores: &[f64]) -> GuardResult<f64> {
    let n_pos = positive.iter().filter(|p| **p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(GuardError::UndefinedMetric(
            "ROC-AUC needs both positive and negative samples".to_string(),
        ));
    }
    let ranks = mid_ranks(scores);
    let rank_sum: f64 = ranks
        .iter()
        .zip(positive)
        .filter(|(_, p)| **p)
        .map(|(r, _)| r)
        .sum();
    let n_pos = n_pos as f64;
    Ok((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

/// One-vs-rest ROC-AUC, macro averaged over the classes of `y_true`.
pub fn roc_auc(y_true: &[f64], scores: Scores<'_>) -> GuardResult<f64> {
    if y_true.is_empty() {
        return Err(GuardError::EmptyInput("y_true".to_string()));
    }
    GuardError::ensure_aligned("y_true", y_true.len(), "y_prob", scores.len())?;
    let classes = classes(&[y_true]);
    if classes.len() < 2 {
        return Err(GuardError::UndefinedMetric(format!(
            "ROC-AUC is undefined with a single class ({}) in y_true",
            classes.len()
        )));
    }

    match scores {
        Scores::Binary(values) => {
            if classes.len() != 2 {
                return Err(GuardError::UndefinedMetric(format!(
                    "binary scores given for {} classes",
                    classes.len()
                )));
            }
            let positive: Vec<bool> = y_true.iter().map(|t| normalize(*t) == classes[1]).collect();
            binary_auc(&positive, values)
        }
        Scores::PerClass(rows) => {
            if let Some(row) = rows.iter().find(|r| r.len() != classes.len()) {
                return Err(GuardError::UndefinedMetric(format!(
                    "score rows have {} columns for {} classes",
                    row.len(),
                    classes.len()
                )));
            }
            let mut total = 0.0;
            for (k, class) in classes.iter().enumerate() {
                let positive: Vec<bool> = y_true.iter().map(|t| normalize(*t) == *class).collect();
                let column: Vec<f64> = rows.iter().map(|r| r[k]).collect();
                total += binary_auc(&positive, &column)?;
            }
            Ok(total / classes.len() as f64)
        }
    }
}
