#![warn(missing_docs)]
//! # SimpleBench
//!
//! Micro-benchmark execution engine for Rust.
//!
//! SimpleBench runs declared benchmark cases and reduces their timings to
//! summary statistics:
//! - **Adaptive Scheduling**: warmup, then measured rounds until both an
//!   iteration count and a minimum time are met, bounded by a maximum time
//! - **Deadline Guards**: `TimeoutGuard` aborts a measurement that runs too long
//!   and reports it distinctly from action failures
//! - **Parameter Sweeps**: every combination of declared parameter values is
//!   measured as its own variation
//! - **Statistics**: mean, median, percentiles and relative standard deviation
//!   per section (ops/s, timing, memory)
//! - **Allocation Tracking**: `TrackingAllocator` measures heap usage per round
//!
//! ## Quick Start
//!
//! ```no_run
//! use simplebench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = Session::discover();
//!     session.register(
//!         Case::builder("sorting", "sort_unstable")
//!             .vary("size", [100_u64, 10_000])
//!             .column("size", "Size")
//!             .action(|ctx| {
//!                 let size = ctx.param("size").and_then(ParamValue::as_u64).unwrap_or(0);
//!                 let mut v: Vec<u64> = (0..size).rev().collect();
//!                 v.sort_unstable();
//!                 std::hint::black_box(v);
//!                 Ok(())
//!             })
//!             .build()?,
//!     )?;
//!
//!     let summary = session.run()?;
//!     for set in summary.results() {
//!         println!("{}: {:?} ops/s", set.title(), set.section_mean(Section::Ops));
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod reporter;
mod session;

pub use config::{CONFIG_FILE_NAME, RunnerConfig, SessionConfig, SimpleBenchConfig};
pub use reporter::Reporter;
pub use session::{Session, SessionSummary, init_logging};

// Re-export core types
pub use simplebench_core::{
    Action, ActionContext, ActionError, AllocationSnapshot, BenchmarkScheduler, BenchmarkSpec,
    BenchmarkSpecBuilder, Binding, Case, CaseBuilder, CaseFailure, CaseRegistry, Clock, Column,
    ConfigError, FailureKind, GuardError, GuardToken, ManualClock, Mark, MonotonicClock,
    ParamValue, Phase, RawRun, ResultSet, RoundHooks, RunError, Sample, SectionStatistics,
    StopReason, TimeoutExceeded, TimeoutGuard, TimeoutState, Timer, TrackingAllocator, Variation,
    VariationExpander, VariationResult, action, current_allocation, reset_peak_allocation,
    tracking_installed,
};

// Re-export stats
pub use simplebench_stats::{
    Percentiles, Section, Statistics, StatsError, compute_percentile, compute_percentiles,
    compute_section, compute_statistics, ops_per_second,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ActionContext, ActionError, BenchmarkSpec, Case, ParamValue, Phase, Reporter, ResultSet,
        Section, Session, TimeoutGuard, VariationExpander,
    };
}

