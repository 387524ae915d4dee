//! Percentile Computation
//!
//! One convention is used everywhere: linear interpolation between the two
//! nearest order statistics at rank `p/100 * (n - 1)` of the sorted samples.
//! Under this rule the 0th percentile is the minimum, the 100th is the maximum
//! and the 50th is the conventional median for both odd and even `n`.

use serde::{Deserialize, Serialize};

/// Percentiles reported for every section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 5th percentile
    pub p5: f64,
    /// 25th percentile (first quartile)
    pub p25: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile (third quartile)
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
}

/// Sort samples ascending. NaN sorts last and never panics.
pub(crate) fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile of an already sorted, non-empty slice.
pub(crate) fn percentile_of_sorted(sorted: &[f64], percentile: f64) -> f64 {
    debug_assert!(!sorted.is_empty());

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let p = (percentile / 100.0).clamp(0.0, 1.0);
    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    let value = sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx]);
    // Rounding must never push an interpolated value outside its segment.
    value.max(sorted[lower_idx]).min(sorted[upper_idx])
}

/// Compute a single percentile from samples
///
/// Uses linear interpolation between nearest ranks. Returns `None` for an
/// empty sample set.
///
/// # Examples
///
/// ```
/// # use simplebench_stats::compute_percentile;
/// let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&samples, 50.0), Some(3.0));
/// assert_eq!(compute_percentile(&samples, 100.0), Some(5.0));
/// assert_eq!(compute_percentile(&[], 50.0), None);
/// ```
pub fn compute_percentile(samples: &[f64], percentile: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(percentile_of_sorted(&sorted_copy(samples), percentile))
}

/// Compute all reported percentiles, or `None` for an empty sample set
pub fn compute_percentiles(samples: &[f64]) -> Option<Percentiles> {
    if samples.is_empty() {
        return None;
    }
    Some(Percentiles::from_sorted(&sorted_copy(samples)))
}

impl Percentiles {
    pub(crate) fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p5: percentile_of_sorted(sorted, 5.0),
            p25: percentile_of_sorted(sorted, 25.0),
            p50: percentile_of_sorted(sorted, 50.0),
            p75: percentile_of_sorted(sorted, 75.0),
            p95: percentile_of_sorted(sorted, 95.0),
        }
    }

    /// Interquartile range
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }
}
