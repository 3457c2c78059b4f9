use std::cmp::Ordering;

use num_traits::ToPrimitive;

/// Running summary of a numeric sequence
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::MAX,
            max: f64::MIN,
        }
    }
}

impl Stats {
    pub fn from_values<I, N>(values: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: ToPrimitive,
    {
        let mut stats = Stats::default();
        for value in values {
            stats.update(value);
        }
        stats
    }

    /// Welford's algorithm for running mean and variance
    #[inline]
    pub fn update<N: ToPrimitive>(&mut self, value: N) {
        let Some(value) = value.to_f64() else {
            return;
        };
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Standard deviation using sample variance (N-1)
    pub fn std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// Standard deviation using population variance (N)
    pub fn population_std_dev(&self) -> f64 {
        self.population_variance().sqrt()
    }

    /// Sample variance (divides by N-1)
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Population variance (divides by N)
    pub fn population_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

/// Sort a copy of `values` in ascending order, NaN last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())));
    out
}

/// Quantile of already sorted values with linear interpolation between ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

/// Total order used to rank labels and scores.
#[inline]
pub(crate) fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_stats_basic() {
        let stats = Stats::from_values(vec![1i64, 2, 3, 4, 5]);
        assert_eq!(stats.count(), 5);
        assert_eq!(stats.mean(), 3.0);
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 5.0);
    }

    #[test]
    fn test_welford_variance() {
        let stats = Stats::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.sample_variance(), 2.5);
        assert!((stats.std_dev() - 1.58113883).abs() < 1e-7);
        assert_eq!(stats.population_variance(), 2.0);
        assert!((stats.population_std_dev() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_incremental_updates() {
        let mut stats = Stats::from_values(vec![1, 2, 3]);
        stats.update(4);
        stats.update(5);
        assert_eq!(stats.count(), 5);
        assert_eq!(stats.mean(), 3.0);
    }

    #[test]
    fn test_edge_case_single_value() {
        let stats = Stats::from_values(vec![42.0]);
        assert_eq!(stats.count(), 1);
        assert_eq!(stats.mean(), 42.0);
        assert_eq!(stats.sample_variance(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);
    }

    #[test]
    fn test_edge_case_constant_values() {
        let stats = Stats::from_values(vec![5, 5, 5, 5, 5]);
        assert_eq!(stats.mean(), 5.0);
        assert_eq!(stats.sample_variance(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = Stats::from_values(Vec::<f64>::new());
        assert!(stats.is_empty());
        assert_eq!(stats.std_dev(), 0.0);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let values = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 0.75), Some(3.25));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_median_odd_length() {
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
    }
}
