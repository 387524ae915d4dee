#![warn(missing_docs)]
//! SimpleBench Statistical Engine
//!
//! Reduces measured samples to summary statistics:
//! - Mean, median, min, max and sample standard deviation
//! - 5th/25th/75th/95th percentiles by linear interpolation
//! - Relative standard deviation for stability checks
//! - Per-section transforms (throughput is summarized as `n / time`)

mod percentiles;
mod section;
mod summary;

pub use percentiles::{Percentiles, compute_percentile, compute_percentiles};
pub use section::{Section, compute_section, ops_per_second};
pub use summary::{Statistics, compute_statistics};

/// Errors produced when summarizing samples
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// No samples were supplied
    #[error("cannot summarize an empty sample set")]
    Empty,
    /// A sample was NaN or infinite
    #[error("sample {index} is not finite: {value}")]
    NonFinite {
        /// Position of the offending sample
        index: usize,
        /// The offending value
        value: f64,
    },
}
