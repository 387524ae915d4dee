//! Measurement Sections
//!
//! A section is one category of measurement summarized per variation.
//! Timing samples are per-invocation nanoseconds; the ops section summarizes
//! the throughput distribution derived from them, not the latency one.

use crate::StatsError;
use crate::summary::{Statistics, compute_statistics};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: f64 = 1e9;

/// Measurement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Operations per second, `n / per-invocation seconds`
    Ops,
    /// Per-invocation elapsed time in nanoseconds
    Timing,
    /// Net heap bytes retained by a round
    Memory,
    /// Heap high-water mark reached during a round, in bytes
    PeakMemory,
}

impl Section {
    /// All sections in reporting order
    pub const ALL: [Section; 4] = [
        Section::Ops,
        Section::Timing,
        Section::Memory,
        Section::PeakMemory,
    ];

    /// Unit the section's statistics are expressed in
    pub fn unit(self) -> &'static str {
        match self {
            Section::Ops => "ops/s",
            Section::Timing => "ns",
            Section::Memory | Section::PeakMemory => "bytes",
        }
    }

    /// Human-readable title
    pub fn title(self) -> &'static str {
        match self {
            Section::Ops => "operations per second",
            Section::Timing => "per round timings",
            Section::Memory => "memory usage",
            Section::PeakMemory => "peak memory usage",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Throughput for one timing sample.
///
/// A zero elapsed time cannot be turned into a rate and yields 0, which is
/// otherwise impossible and so flags a timer-resolution problem.
pub fn ops_per_second(n: u64, elapsed_ns: f64) -> f64 {
    if elapsed_ns <= 0.0 {
        return 0.0;
    }
    n as f64 / (elapsed_ns / NANOS_PER_SECOND)
}

/// Summarize raw samples for a section.
///
/// `raw` is per-invocation nanoseconds for [`Section::Ops`] and
/// [`Section::Timing`], bytes for the memory sections. `n` only matters for
/// [`Section::Ops`], where every sample is first mapped through
/// [`ops_per_second`].
pub fn compute_section(section: Section, raw: &[f64], n: u64) -> Result<Statistics, StatsError> {
    match section {
        Section::Ops => {
            let throughput: Vec<f64> = raw.iter().map(|&t| ops_per_second(n, t)).collect();
            compute_statistics(&throughput)
        }
        Section::Timing | Section::Memory | Section::PeakMemory => compute_statistics(raw),
    }
}
