//! Benchmark Specification
//!
//! Scheduling parameters for one benchmark, validated once at build time.

use crate::error::ConfigError;
use crate::measure::{Clock, MonotonicClock};
use std::sync::Arc;
use std::time::Duration;

/// Default minimum number of measured rounds
pub const DEFAULT_ITERATIONS: u64 = 20;
/// Default number of unmeasured warmup invocations
pub const DEFAULT_WARMUP_ITERATIONS: u64 = 10;
/// Default number of invocations per timed round
pub const DEFAULT_ROUNDS: u64 = 1;
/// Default minimum measurement time
pub const DEFAULT_MIN_TIME: Duration = Duration::from_secs(5);
/// Default maximum measurement time
pub const DEFAULT_MAX_TIME: Duration = Duration::from_secs(20);

/// Validated scheduling parameters
#[derive(Debug, Clone)]
pub struct BenchmarkSpec {
    iterations: u64,
    warmup_iterations: u64,
    rounds: u64,
    min_time: Duration,
    max_time: Option<Duration>,
    timeout: Option<Duration>,
    n: u64,
    track_memory: bool,
    keep_samples: bool,
    clock: Arc<dyn Clock>,
}

impl BenchmarkSpec {
    /// Start from the defaults
    pub fn builder() -> BenchmarkSpecBuilder {
        BenchmarkSpecBuilder::default()
    }

    /// Builder pre-filled with this spec's values
    pub fn to_builder(&self) -> BenchmarkSpecBuilder {
        BenchmarkSpecBuilder {
            iterations: self.iterations,
            warmup_iterations: self.warmup_iterations,
            rounds: self.rounds,
            min_time: self.min_time,
            max_time: self.max_time,
            timeout: self.timeout,
            n: self.n,
            track_memory: self.track_memory,
            keep_samples: self.keep_samples,
            clock: Arc::clone(&self.clock),
        }
    }

    /// Minimum number of measured rounds
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Unmeasured invocations before measurement
    pub fn warmup_iterations(&self) -> u64 {
        self.warmup_iterations
    }

    /// Invocations per timed round
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Minimum wall time spent measuring
    pub fn min_time(&self) -> Duration {
        self.min_time
    }

    /// Wall time after which measurement stops, `None` for unbounded
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time
    }

    /// Deadline for the whole measurement phase
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Default operations per invocation
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Whether memory sections are collected
    pub fn track_memory(&self) -> bool {
        self.track_memory
    }

    /// Whether raw samples are kept on results
    pub fn keep_samples(&self) -> bool {
        self.keep_samples
    }

    /// Clock used for every timing
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl Default for BenchmarkSpec {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            rounds: DEFAULT_ROUNDS,
            min_time: DEFAULT_MIN_TIME,
            max_time: Some(DEFAULT_MAX_TIME),
            timeout: None,
            n: 1,
            track_memory: false,
            keep_samples: false,
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

/// Builder for [`BenchmarkSpec`]
#[derive(Debug, Clone)]
pub struct BenchmarkSpecBuilder {
    iterations: u64,
    warmup_iterations: u64,
    rounds: u64,
    min_time: Duration,
    max_time: Option<Duration>,
    timeout: Option<Duration>,
    n: u64,
    track_memory: bool,
    keep_samples: bool,
    clock: Arc<dyn Clock>,
}

impl Default for BenchmarkSpecBuilder {
    fn default() -> Self {
        BenchmarkSpec::default().to_builder()
    }
}

impl BenchmarkSpecBuilder {
    /// Minimum number of measured rounds (at least 1)
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Unmeasured invocations before measurement (may be 0)
    pub fn warmup_iterations(mut self, warmup: u64) -> Self {
        self.warmup_iterations = warmup;
        self
    }

    /// Invocations per timed round (at least 1)
    pub fn rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    /// Minimum wall time spent measuring
    pub fn min_time(mut self, min_time: Duration) -> Self {
        self.min_time = min_time;
        self
    }

    /// Wall time after which measurement stops
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Remove the wall-time ceiling
    pub fn unbounded(mut self) -> Self {
        self.max_time = None;
        self
    }

    /// Deadline for the whole measurement phase (must be non-zero)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Measure without a deadline
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Default operations per invocation (at least 1)
    pub fn n(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    /// Collect memory sections
    pub fn track_memory(mut self, enabled: bool) -> Self {
        self.track_memory = enabled;
        self
    }

    /// Keep raw samples on results
    pub fn keep_samples(mut self, enabled: bool) -> Self {
        self.keep_samples = enabled;
        self
    }

    /// Replace the clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<BenchmarkSpec, ConfigError> {
        for (field, value) in [
            ("iterations", self.iterations),
            ("rounds", self.rounds),
            ("n", self.n),
        ] {
            if value < 1 {
                return Err(ConfigError::BelowMinimum {
                    field,
                    min: 1,
                    value,
                });
            }
        }
        if let Some(max) = self.max_time {
            if self.min_time > max {
                return Err(ConfigError::InvertedTimeRange {
                    min: self.min_time,
                    max,
                });
            }
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(format!("{timeout:?}")));
            }
        }

        Ok(BenchmarkSpec {
            iterations: self.iterations,
            warmup_iterations: self.warmup_iterations,
            rounds: self.rounds,
            min_time: self.min_time,
            max_time: self.max_time,
            timeout: self.timeout,
            n: self.n,
            track_memory: self.track_memory,
            keep_samples: self.keep_samples,
            clock: self.clock,
        })
    }
}
