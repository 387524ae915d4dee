//! Benchmark Results
//!
//! Per-variation statistics and the per-case [`ResultSet`] handed to
//! reporters.

use crate::error::RunError;
use crate::scheduler::{RawRun, Sample, StopReason};
use crate::variation::{Column, Variation};
use serde::Serialize;
use simplebench_stats::{Section, Statistics, compute_section};

const NANOS_PER_SECOND: f64 = 1e9;

/// Statistics for every section of one variation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStatistics {
    /// Operations per second
    pub ops: Statistics,
    /// Per-invocation nanoseconds
    pub timing: Statistics,
    /// Net bytes retained per round, when memory was tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Statistics>,
    /// Peak bytes per round, when memory was tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory: Option<Statistics>,
}

impl SectionStatistics {
    /// Statistics for `section`, `None` if it was not collected
    pub fn get(&self, section: Section) -> Option<&Statistics> {
        match section {
            Section::Ops => Some(&self.ops),
            Section::Timing => Some(&self.timing),
            Section::Memory => self.memory.as_ref(),
            Section::PeakMemory => self.peak_memory.as_ref(),
        }
    }
}

/// Result of measuring one variation
#[derive(Debug, Clone, Serialize)]
pub struct VariationResult {
    variation: Variation,
    n: u64,
    iterations: u64,
    rounds: u64,
    warmup_iterations: u64,
    total_elapsed_secs: f64,
    wall_elapsed_secs: f64,
    stop_reason: StopReason,
    sections: SectionStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<Vec<Sample>>,
}

impl VariationResult {
    /// Summarize a raw run
    pub fn from_raw(
        variation: Variation,
        n: u64,
        raw: RawRun,
        keep_samples: bool,
    ) -> Result<Self, RunError> {
        let degenerate = |e: simplebench_stats::StatsError| RunError::Degenerate {
            reason: e.to_string(),
        };

        let timings: Vec<f64> = raw.samples.iter().map(Sample::per_invocation_ns).collect();
        let ops = compute_section(Section::Ops, &timings, n).map_err(degenerate)?;
        let timing = compute_section(Section::Timing, &timings, n).map_err(degenerate)?;

        let deltas: Option<Vec<f64>> = raw
            .samples
            .iter()
            .map(|s| s.memory_delta.map(|d| d as f64))
            .collect();
        let peaks: Option<Vec<f64>> = raw
            .samples
            .iter()
            .map(|s| s.peak_memory.map(|p| p as f64))
            .collect();
        let memory = deltas
            .map(|d| compute_section(Section::Memory, &d, n))
            .transpose()
            .map_err(degenerate)?;
        let peak_memory = peaks
            .map(|p| compute_section(Section::PeakMemory, &p, n))
            .transpose()
            .map_err(degenerate)?;

        Ok(Self {
            variation,
            n,
            iterations: raw.measured_rounds(),
            rounds: raw.rounds_per_sample,
            warmup_iterations: raw.warmup_iterations,
            total_elapsed_secs: raw.total_elapsed_ns() as f64 / NANOS_PER_SECOND,
            wall_elapsed_secs: raw.wall_elapsed_ns as f64 / NANOS_PER_SECOND,
            stop_reason: raw.stop_reason,
            sections: SectionStatistics {
                ops,
                timing,
                memory,
                peak_memory,
            },
            samples: keep_samples.then_some(raw.samples),
        })
    }

    /// The measured variation
    pub fn variation(&self) -> &Variation {
        &self.variation
    }

    /// Operations per invocation
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Measured rounds
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Invocations per round
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Warmup invocations
    pub fn warmup_iterations(&self) -> u64 {
        self.warmup_iterations
    }

    /// Seconds spent inside timed blocks
    pub fn total_elapsed_secs(&self) -> f64 {
        self.total_elapsed_secs
    }

    /// Wall seconds of the measurement phase
    pub fn wall_elapsed_secs(&self) -> f64 {
        self.wall_elapsed_secs
    }

    /// Why measurement stopped
    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Per-section statistics
    pub fn sections(&self) -> &SectionStatistics {
        &self.sections
    }

    /// Statistics for one section
    pub fn section(&self, section: Section) -> Option<&Statistics> {
        self.sections.get(section)
    }

    /// Raw samples, when `BenchmarkSpec::keep_samples` is set
    pub fn samples(&self) -> Option<&[Sample]> {
        self.samples.as_deref()
    }
}

/// All variation results of one case, in expansion order
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    group: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    columns: Vec<Column>,
    results: Vec<VariationResult>,
}

impl ResultSet {
    /// Assemble a result set
    pub fn new(
        group: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
        columns: Vec<Column>,
        results: Vec<VariationResult>,
    ) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
            description,
            columns,
            results,
        }
    }

    /// Case group
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Case title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Case description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Report columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Per-variation results
    pub fn results(&self) -> &[VariationResult] {
        &self.results
    }

    /// Number of variations
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no variation was measured
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over per-variation results
    pub fn iter(&self) -> std::slice::Iter<'_, VariationResult> {
        self.results.iter()
    }

    /// Mean of a section's per-variation means, `None` if any variation
    /// lacks the section or the set is empty
    pub fn section_mean(&self, section: Section) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for result in &self.results {
            total += result.section(section)?.mean;
        }
        Some(total / self.results.len() as f64)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a VariationResult;
    type IntoIter = std::slice::Iter<'a, VariationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// A case aborted on one of its variations
#[derive(Debug, thiserror::Error)]
#[error("{group}/{title} failed on variation [{variation}]: {error}")]
pub struct CaseFailure {
    /// Case group
    pub group: String,
    /// Case title
    pub title: String,
    /// The variation that failed
    pub variation: Variation,
    /// Why it failed
    #[source]
    pub error: RunError,
    /// Variations measured before the failure
    pub completed: Vec<VariationResult>,
}
