//! Summary Statistics
//!
//! Reduces a non-empty sample sequence to the summary reported per section.
//! Everything except the percentiles is order-independent; percentiles are
//! taken over the sorted copy using the convention in [`crate::percentiles`].

use crate::StatsError;
use crate::percentiles::{Percentiles, sorted_copy};
use serde::{Deserialize, Serialize};

/// Summary of one section's samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Arithmetic mean
    pub mean: f64,
    /// 50th percentile
    pub median: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// 5th percentile
    pub p5: f64,
    /// 25th percentile
    pub p25: f64,
    /// 75th percentile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
    /// Sample standard deviation (n - 1 denominator, 0 for a single sample)
    pub std_dev: f64,
    /// `std_dev / mean * 100`, or 0 when the mean is 0
    pub relative_std_dev: f64,
    /// Number of samples summarized
    pub sample_count: usize,
}

/// Compute summary statistics over a non-empty, finite sample sequence.
///
/// Returns [`StatsError::Empty`] instead of zero-valued statistics when there
/// is nothing to summarize.
pub fn compute_statistics(samples: &[f64]) -> Result<Statistics, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::Empty);
    }
    if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
        return Err(StatsError::NonFinite {
            index,
            value: samples[index],
        });
    }

    // Incremental mean: identical samples reproduce their value exactly.
    let mut mean = samples[0];
    for (i, &x) in samples.iter().enumerate().skip(1) {
        mean += (x - mean) / (i + 1) as f64;
    }

    let std_dev = if samples.len() < 2 {
        0.0
    } else {
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
        variance.sqrt()
    };

    let relative_std_dev = if mean == 0.0 {
        0.0
    } else {
        (std_dev / mean).abs() * 100.0
    };

    let sorted = sorted_copy(samples);
    let percentiles = Percentiles::from_sorted(&sorted);

    Ok(Statistics {
        mean,
        median: percentiles.p50,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p5: percentiles.p5,
        p25: percentiles.p25,
        p75: percentiles.p75,
        p95: percentiles.p95,
        std_dev,
        relative_std_dev,
        sample_count: samples.len(),
    })
}

impl Statistics {
    /// Interquartile range
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }

    /// Check if distribution appears stable (relative std dev under threshold)
    pub fn is_stable(&self, rsd_threshold: f64) -> bool {
        self.relative_std_dev < rsd_threshold
    }
}
