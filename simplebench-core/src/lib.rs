#![warn(missing_docs)]
//! SimpleBench Core - Execution Engine
//!
//! This crate runs benchmark cases:
//! - `BenchmarkScheduler` for warmup and bounded measurement rounds
//! - `TimeoutGuard` for wall-clock deadlines around a callable
//! - `VariationExpander` for Cartesian parameter sweeps
//! - Pluggable clocks and a global allocator for memory tracking

mod allocator;
mod case;
mod error;
mod measure;
mod registry;
mod results;
mod scheduler;
mod spec;
mod timeout;
mod variation;

pub use allocator::{
    AllocationSnapshot, TrackingAllocator, current_allocation, reset_peak_allocation,
    tracking_installed,
};
pub use case::{Case, CaseBuilder};
pub use error::{ActionError, ConfigError, FailureKind, RunError};
pub use measure::{Clock, ManualClock, MonotonicClock, Timer};
pub use registry::CaseRegistry;
pub use results::{CaseFailure, ResultSet, SectionStatistics, VariationResult};
pub use scheduler::{
    Action, ActionContext, BenchmarkScheduler, Phase, RawRun, RoundHooks, Sample, StopReason,
    action,
};
pub use spec::{
    BenchmarkSpec, BenchmarkSpecBuilder, DEFAULT_ITERATIONS, DEFAULT_MAX_TIME, DEFAULT_MIN_TIME,
    DEFAULT_ROUNDS, DEFAULT_WARMUP_ITERATIONS,
};
pub use timeout::{GuardError, GuardToken, TimeoutExceeded, TimeoutGuard, TimeoutState};
pub use variation::{Binding, Column, Mark, ParamValue, Variation, VariationExpander};
