//! Benchmark Scheduler
//!
//! Drives one action for one variation: warmup, then timed rounds until the
//! stopping rule is met.
//!
//! Stopping rule, checked before every round against the wall time elapsed
//! since the measurement phase began:
//! - stop once `rounds >= iterations` and `elapsed >= min_time`, or
//! - stop once `elapsed >= max_time`, even if `iterations` was not reached.
//!
//! Each round invokes the action `rounds` times inside one timed block and
//! records a single [`Sample`]. Optional [`RoundHooks`] run before and after
//! every warmup invocation and every measured round, outside the timed block.
//! With a timeout, the whole measurement phase runs under a [`TimeoutGuard`];
//! warmup is never guarded.

use crate::allocator::{MemoryProbe, tracking_installed};
use crate::error::{ActionError, RunError};
use crate::measure::{Timer, duration_ns};
use crate::spec::BenchmarkSpec;
use crate::timeout::{GuardError, GuardToken, TimeoutExceeded, TimeoutGuard};
use crate::variation::{ParamValue, Variation};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Phase an action is invoked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Unmeasured invocations before timing starts
    Warmup,
    /// Timed rounds
    Measure,
}

/// What an action sees on each invocation
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    variation: &'a Variation,
    n: u64,
    phase: Phase,
    round: u64,
}

impl<'a> ActionContext<'a> {
    /// Context for one invocation
    pub fn new(variation: &'a Variation, n: u64, phase: Phase, round: u64) -> Self {
        Self {
            variation,
            n,
            phase,
            round,
        }
    }

    /// Active variation
    pub fn variation(&self) -> &'a Variation {
        self.variation
    }

    /// Value bound to `key` in the active variation
    pub fn param(&self, key: &str) -> Option<&'a ParamValue> {
        self.variation.param(key)
    }

    /// Operations the action performs per invocation
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Zero-based warmup invocation or measured round
    pub fn round(&self) -> u64 {
        self.round
    }
}

/// The code under measurement.
///
/// Implemented for every `Fn(&ActionContext) -> Result<(), ActionError>`
/// closure that is `Send + Sync`.
pub trait Action: Send + Sync {
    /// Run one invocation
    fn call(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError>;
}

impl<F> Action for F
where
    F: Fn(&ActionContext<'_>) -> Result<(), ActionError> + Send + Sync,
{
    #[inline]
    fn call(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        self(ctx)
    }
}

/// Wrap a closure as a shareable [`Action`]
pub fn action<F>(f: F) -> Arc<dyn Action>
where
    F: Fn(&ActionContext<'_>) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Setup and teardown run around each warmup invocation and measured round.
///
/// Hooks see the same [`ActionContext`] as the action. Their time and
/// allocations are excluded from the round's sample; an error from either
/// aborts the run like an action error.
#[derive(Clone, Default)]
pub struct RoundHooks {
    setup: Option<Arc<dyn Action>>,
    teardown: Option<Arc<dyn Action>>,
}

impl fmt::Debug for RoundHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundHooks")
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

impl RoundHooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` before each round
    pub fn setup(mut self, setup: Arc<dyn Action>) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Run `teardown` after each round
    pub fn teardown(mut self, teardown: Arc<dyn Action>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Whether neither hook is set
    pub fn is_empty(&self) -> bool {
        self.setup.is_none() && self.teardown.is_none()
    }

    fn before(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        self.setup.as_ref().map_or(Ok(()), |h| h.call(ctx))
    }

    fn after(&self, ctx: &ActionContext<'_>) -> Result<(), ActionError> {
        self.teardown.as_ref().map_or(Ok(()), |h| h.call(ctx))
    }
}

/// One measured round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// Nanoseconds spent in the round's timed block
    pub block_ns: u64,
    /// Invocations inside the block
    pub rounds: u64,
    /// Net heap bytes retained by the block, when memory is tracked
    pub memory_delta: Option<i64>,
    /// Heap high-water mark above the starting level, when memory is tracked
    pub peak_memory: Option<u64>,
}

impl Sample {
    /// Mean nanoseconds per invocation
    pub fn per_invocation_ns(&self) -> f64 {
        self.block_ns as f64 / self.rounds.max(1) as f64
    }
}

/// Which stopping condition ended measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Both `iterations` and `min_time` were satisfied
    Satisfied,
    /// `max_time` elapsed first
    MaxTime,
}

/// Raw output of one scheduled variation
#[derive(Debug, Clone)]
pub struct RawRun {
    /// One sample per measured round, in order
    pub samples: Vec<Sample>,
    /// Warmup invocations performed
    pub warmup_iterations: u64,
    /// Invocations per measured round
    pub rounds_per_sample: u64,
    /// Wall time of the measurement phase
    pub wall_elapsed_ns: u64,
    /// Why measurement stopped
    pub stop_reason: StopReason,
}

impl RawRun {
    /// Number of measured rounds
    pub fn measured_rounds(&self) -> u64 {
        self.samples.len() as u64
    }

    /// Measured invocations across all rounds
    pub fn invocations(&self) -> u64 {
        self.measured_rounds() * self.rounds_per_sample
    }

    /// Nanoseconds spent inside timed blocks
    pub fn total_elapsed_ns(&self) -> u64 {
        self.samples.iter().map(|s| s.block_ns).sum()
    }
}

/// Why the measurement loop stopped without finishing
enum MeasureError {
    Action(ActionError),
    /// The guard's deadline fired; the result is being discarded
    Abandoned,
}

struct Measurement {
    samples: Vec<Sample>,
    wall_elapsed_ns: u64,
    stop_reason: StopReason,
}

/// Runs actions under a [`BenchmarkSpec`]
#[derive(Debug, Clone)]
pub struct BenchmarkScheduler {
    spec: Arc<BenchmarkSpec>,
}

impl BenchmarkScheduler {
    /// Scheduler for `spec`
    pub fn new(spec: Arc<BenchmarkSpec>) -> Self {
        Self { spec }
    }

    /// The benchmark spec in force
    pub fn spec(&self) -> &BenchmarkSpec {
        &self.spec
    }

    /// Warm up, then measure `action` for `variation` with `n` operations
    /// per invocation.
    ///
    /// Returns [`RunError::Degenerate`] when no round completed.
    pub fn run(
        &self,
        action: &Arc<dyn Action>,
        variation: &Variation,
        n: u64,
    ) -> Result<RawRun, RunError> {
        self.run_with_hooks(action, &RoundHooks::default(), variation, n)
    }

    /// Like [`run`](Self::run), calling `hooks` around every warmup
    /// invocation and measured round
    pub fn run_with_hooks(
        &self,
        action: &Arc<dyn Action>,
        hooks: &RoundHooks,
        variation: &Variation,
        n: u64,
    ) -> Result<RawRun, RunError> {
        debug!(variation = %variation, n, "scheduling variation");

        if self.spec.track_memory() && !tracking_installed() {
            warn!(
                variation = %variation,
                "track_memory is set but TrackingAllocator is not the global allocator; \
                 memory sections will be absent"
            );
        }

        let warmup_iterations = self.spec.warmup_iterations();
        for i in 0..warmup_iterations {
            let ctx = ActionContext::new(variation, n, Phase::Warmup, i);
            hooks.before(&ctx).map_err(RunError::Execution)?;
            std::hint::black_box(action.call(&ctx)).map_err(RunError::Execution)?;
            hooks.after(&ctx).map_err(RunError::Execution)?;
        }
        trace!(warmup_iterations, "warmup complete");

        let measurement = match self.spec.timeout() {
            None => measure(
                &self.spec,
                action.as_ref(),
                hooks,
                variation,
                n,
                &GuardToken::detached(),
                &AtomicU64::new(0),
            )
            .map_err(|e| self.measure_error(e, 0))?,
            Some(timeout) => self.measure_guarded(timeout, action, hooks, variation, n)?,
        };

        if measurement.samples.is_empty() {
            return Err(RunError::Degenerate {
                reason: format!(
                    "max_time of {:?} elapsed before the first round",
                    self.spec.max_time().unwrap_or_default()
                ),
            });
        }

        debug!(
            rounds = measurement.samples.len(),
            stop = ?measurement.stop_reason,
            "measurement complete"
        );

        Ok(RawRun {
            samples: measurement.samples,
            warmup_iterations,
            rounds_per_sample: self.spec.rounds(),
            wall_elapsed_ns: measurement.wall_elapsed_ns,
            stop_reason: measurement.stop_reason,
        })
    }

    fn measure_guarded(
        &self,
        timeout: Duration,
        action: &Arc<dyn Action>,
        hooks: &RoundHooks,
        variation: &Variation,
        n: u64,
    ) -> Result<Measurement, RunError> {
        let mut guard = TimeoutGuard::new(timeout)?;
        let progress = Arc::new(AtomicU64::new(0));

        let spec = Arc::clone(&self.spec);
        let worker_action = Arc::clone(action);
        let worker_hooks = hooks.clone();
        let worker_variation = variation.clone();
        let worker_progress = Arc::clone(&progress);

        let outcome = guard.run_cancellable(move |token| {
            measure(
                &spec,
                worker_action.as_ref(),
                &worker_hooks,
                &worker_variation,
                n,
                token,
                &worker_progress,
            )
        });

        let rounds_completed = progress.load(Ordering::Acquire);
        match outcome {
            Ok(measurement) => Ok(measurement),
            Err(GuardError::TimedOut(source)) => {
                warn!(
                    variation = %variation,
                    rounds_completed,
                    timeout = ?timeout,
                    "measurement timed out"
                );
                Err(RunError::Timeout {
                    source,
                    rounds_completed,
                })
            }
            Err(GuardError::Failed(e)) => Err(self.measure_error(e, rounds_completed)),
            Err(GuardError::Spawn(e)) => Err(RunError::Worker(e)),
            Err(GuardError::WorkerLost) => Err(RunError::Worker(std::io::Error::other(
                "measurement worker exited without a result",
            ))),
        }
    }

    fn measure_error(&self, err: MeasureError, rounds_completed: u64) -> RunError {
        match err {
            MeasureError::Action(e) => RunError::Execution(e),
            MeasureError::Abandoned => RunError::Timeout {
                source: TimeoutExceeded {
                    interval: self.spec.timeout().unwrap_or_default(),
                },
                rounds_completed,
            },
        }
    }
}

/// The measurement loop.
///
/// Wall time is taken from the clock reading that closes each round, so a
/// round costs exactly two clock readings. Hook time still counts toward
/// `min_time` and `max_time`.
fn measure(
    spec: &BenchmarkSpec,
    action: &dyn Action,
    hooks: &RoundHooks,
    variation: &Variation,
    n: u64,
    token: &GuardToken,
    progress: &AtomicU64,
) -> Result<Measurement, MeasureError> {
    let clock = spec.clock();
    let rounds = spec.rounds();
    let iterations = spec.iterations();
    let min_time_ns = duration_ns(spec.min_time());
    let max_time_ns = spec.max_time().map(duration_ns);
    let track_memory = spec.track_memory() && tracking_installed();

    let mut samples = Vec::with_capacity(iterations.min(4096) as usize);
    let phase_start = clock.now_ns();
    let mut last_reading = phase_start;

    let stop_reason = loop {
        let elapsed = last_reading.saturating_sub(phase_start);
        let completed = samples.len() as u64;

        if completed >= iterations && elapsed >= min_time_ns {
            break StopReason::Satisfied;
        }
        if max_time_ns.is_some_and(|max| elapsed >= max) {
            warn!(
                variation = %variation,
                completed,
                iterations,
                "max_time reached before the requested iterations"
            );
            break StopReason::MaxTime;
        }
        if token.is_expired() {
            return Err(MeasureError::Abandoned);
        }

        let ctx = ActionContext::new(variation, n, Phase::Measure, completed);
        hooks.before(&ctx).map_err(MeasureError::Action)?;

        let probe = track_memory.then(MemoryProbe::start);
        let timer = Timer::start(clock);
        for _ in 0..rounds {
            std::hint::black_box(action.call(&ctx)).map_err(MeasureError::Action)?;
        }
        let (block_ns, end) = timer.stop_at();
        let memory = probe.map(MemoryProbe::finish);

        hooks.after(&ctx).map_err(MeasureError::Action)?;

        samples.push(Sample {
            block_ns,
            rounds,
            memory_delta: memory.map(|(delta, _)| delta),
            peak_memory: memory.map(|(_, peak)| peak),
        });
        last_reading = end;
        progress.fetch_add(1, Ordering::Release);
    };

    Ok(Measurement {
        samples,
        wall_elapsed_ns: last_reading.saturating_sub(phase_start),
        stop_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::measure::ManualClock;
    use crate::variation::VariationExpander;
    use std::sync::Mutex;

    const MS: Duration = Duration::from_millis(1);

    fn manual_spec(iterations: u64, min_time: Duration, max_time: Duration) -> Arc<BenchmarkSpec> {
        Arc::new(
            BenchmarkSpec::builder()
                .iterations(iterations)
                .warmup_iterations(0)
                .min_time(min_time)
                .max_time(max_time)
                .clock(Arc::new(ManualClock::new(MS)))
                .build()
                .unwrap(),
        )
    }

    fn noop() -> Arc<dyn Action> {
        action(|_| Ok(()))
    }

    #[test]
    fn test_stops_after_iterations() {
        let scheduler = BenchmarkScheduler::new(manual_spec(5, Duration::ZERO, Duration::from_secs(1)));
        let run = scheduler.run(&noop(), &Variation::empty(), 1).unwrap();

        assert_eq!(run.measured_rounds(), 5);
        assert_eq!(run.stop_reason, StopReason::Satisfied);
        // Every block spans exactly one clock step
        assert!(run.samples.iter().all(|s| s.block_ns == 1_000_000));
        assert_eq!(run.total_elapsed_ns(), 5_000_000);
        assert_eq!(run.wall_elapsed_ns, 10_000_000);
    }

    #[test]
    fn test_min_time_extends_measurement() {
        let scheduler = BenchmarkScheduler::new(manual_spec(1, 20 * MS, Duration::from_secs(1)));
        let run = scheduler.run(&noop(), &Variation::empty(), 1).unwrap();

        // Two readings per round: 2ms of wall time each
        assert_eq!(run.measured_rounds(), 10);
        assert_eq!(run.stop_reason, StopReason::Satisfied);
    }

    #[test]
    fn test_max_time_cuts_measurement_short() {
        let scheduler = BenchmarkScheduler::new(manual_spec(1_000, Duration::ZERO, 10 * MS));
        let run = scheduler.run(&noop(), &Variation::empty(), 1).unwrap();

        assert_eq!(run.measured_rounds(), 5);
        assert_eq!(run.stop_reason, StopReason::MaxTime);
    }

    #[test]
    fn test_stopping_rule_holds_across_configurations() {
        for iterations in [1, 3, 8, 40] {
            for min_ms in [0, 5, 30] {
                for max_ms in [30, 50, 200] {
                    let scheduler = BenchmarkScheduler::new(manual_spec(
                        iterations,
                        Duration::from_millis(min_ms),
                        Duration::from_millis(max_ms),
                    ));
                    let run = scheduler.run(&noop(), &Variation::empty(), 1).unwrap();
                    let elapsed = run.wall_elapsed_ns;

                    assert!(
                        run.measured_rounds() >= iterations || elapsed >= max_ms * 1_000_000,
                        "iterations={iterations} min={min_ms} max={max_ms}: {run:?}"
                    );
                    if run.stop_reason == StopReason::Satisfied {
                        assert!(elapsed >= min_ms * 1_000_000);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rounds_divide_block_time() {
        let spec = manual_spec(3, Duration::ZERO, Duration::from_secs(1))
            .to_builder()
            .rounds(4)
            .warmup_iterations(2)
            .build()
            .unwrap();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let act = action(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });

        let run = BenchmarkScheduler::new(Arc::new(spec))
            .run(&act, &Variation::empty(), 1)
            .unwrap();

        assert_eq!(run.measured_rounds(), 3);
        assert_eq!(run.invocations(), 12);
        assert_eq!(run.warmup_iterations, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 2 + 12);
        assert_eq!(run.samples[0].per_invocation_ns(), 250_000.0);
    }

    #[test]
    fn test_context_reports_phase_round_and_params() {
        let spec = manual_spec(2, Duration::ZERO, Duration::from_secs(1))
            .to_builder()
            .warmup_iterations(1)
            .build()
            .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let act = action(move |ctx| {
            let size = ctx.param("size").and_then(ParamValue::as_u64);
            log.lock().unwrap().push((ctx.phase(), ctx.round(), ctx.n(), size));
            Ok(())
        });
        let variation = VariationExpander::new()
            .vary("size", [64])
            .expand()
            .unwrap()
            .remove(0);

        BenchmarkScheduler::new(Arc::new(spec))
            .run(&act, &variation, 8)
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Phase::Warmup, 0, 8, Some(64)),
                (Phase::Measure, 0, 8, Some(64)),
                (Phase::Measure, 1, 8, Some(64)),
            ]
        );
    }

    #[test]
    fn test_action_error_aborts_run() {
        let scheduler = BenchmarkScheduler::new(manual_spec(10, Duration::ZERO, Duration::from_secs(1)));
        let act = action(|ctx| {
            if ctx.phase() == Phase::Measure && ctx.round() == 3 {
                return Err("file vanished".into());
            }
            Ok(())
        });

        let err = scheduler.run(&act, &Variation::empty(), 1).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Execution);
        assert_eq!(err.to_string(), "file vanished");
    }

    #[test]
    fn test_warmup_error_aborts_before_measurement() {
        let spec = manual_spec(10, Duration::ZERO, Duration::from_secs(1))
            .to_builder()
            .warmup_iterations(3)
            .build()
            .unwrap();
        let act = action(|ctx| match ctx.phase() {
            Phase::Warmup => Err("cold start failed".into()),
            Phase::Measure => panic!("measurement must not start"),
        });

        let err = BenchmarkScheduler::new(Arc::new(spec))
            .run(&act, &Variation::empty(), 1)
            .unwrap_err();
        assert_eq!(err.to_string(), "cold start failed");
    }

    #[test]
    fn test_no_rounds_is_degenerate() {
        let scheduler = BenchmarkScheduler::new(manual_spec(5, Duration::ZERO, Duration::ZERO));
        let err = scheduler.run(&noop(), &Variation::empty(), 1).unwrap_err();

        assert!(err.is_degenerate());
        assert_eq!(err.kind(), FailureKind::Degenerate);
    }

    #[test]
    fn test_timeout_aborts_measurement() {
        let spec = BenchmarkSpec::builder()
            .iterations(1_000)
            .warmup_iterations(0)
            .min_time(Duration::ZERO)
            .max_time(Duration::from_secs(30))
            .timeout(100 * MS)
            .build()
            .unwrap();
        let slow = action(|_| {
            std::thread::sleep(20 * MS);
            Ok(())
        });

        let err = BenchmarkScheduler::new(Arc::new(spec))
            .run(&slow, &Variation::empty(), 1)
            .unwrap_err();

        match err {
            RunError::Timeout {
                source,
                rounds_completed,
            } => {
                assert_eq!(source.interval, 100 * MS);
                assert!(rounds_completed < 1_000);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_not_reached() {
        let spec = BenchmarkSpec::builder()
            .iterations(3)
            .warmup_iterations(1)
            .min_time(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let run = BenchmarkScheduler::new(Arc::new(spec))
            .run(&noop(), &Variation::empty(), 1)
            .unwrap();
        assert_eq!(run.measured_rounds(), 3);
    }

    #[test]
    fn test_guarded_action_error_is_execution() {
        let spec = BenchmarkSpec::builder()
            .iterations(3)
            .warmup_iterations(0)
            .min_time(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let failing = action(|_| Err("bad input".into()));

        let err = BenchmarkScheduler::new(Arc::new(spec))
            .run(&failing, &Variation::empty(), 1)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Execution);
    }

    #[test]
    fn test_memory_untracked_without_allocator() {
        // The unit test binary keeps the system allocator
        assert!(!tracking_installed());
        let spec = manual_spec(2, Duration::ZERO, Duration::from_secs(1))
            .to_builder()
            .track_memory(true)
            .build()
            .unwrap();
        let grow = action(|_| {
            std::hint::black_box(vec![0_u8; 4096]);
            Ok(())
        });

        let run = BenchmarkScheduler::new(Arc::new(spec))
            .run(&grow, &Variation::empty(), 1)
            .unwrap();

        assert_eq!(run.measured_rounds(), 2);
        assert!(run.samples.iter().all(|s| s.memory_delta.is_none() && s.peak_memory.is_none()));
    }

    #[test]
    fn test_huge_max_time_does_not_wrap() {
        // 2^64 ns + 1ms
        let max_time = Duration::new(18_446_744_073, 710_551_616);
        let scheduler = BenchmarkScheduler::new(manual_spec(5, Duration::ZERO, max_time));
        let run = scheduler.run(&noop(), &Variation::empty(), 1).unwrap();

        assert_eq!(run.measured_rounds(), 5);
        assert_eq!(run.stop_reason, StopReason::Satisfied);
    }

    #[test]
    fn test_hooks_wrap_every_round() {
        let spec = manual_spec(2, Duration::ZERO, Duration::from_secs(1))
            .to_builder()
            .warmup_iterations(1)
            .rounds(2)
            .build()
            .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &'static str| {
            let log = Arc::clone(&seen);
            action(move |ctx| {
                log.lock().unwrap().push((name, ctx.phase(), ctx.round()));
                Ok(())
            })
        };
        assert!(RoundHooks::new().is_empty());
        let hooks = RoundHooks::new()
            .setup(record("setup"))
            .teardown(record("teardown"));
        assert!(!hooks.is_empty());

        BenchmarkScheduler::new(Arc::new(spec))
            .run_with_hooks(&record("action"), &hooks, &Variation::empty(), 1)
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("setup", Phase::Warmup, 0),
                ("action", Phase::Warmup, 0),
                ("teardown", Phase::Warmup, 0),
                ("setup", Phase::Measure, 0),
                ("action", Phase::Measure, 0),
                ("action", Phase::Measure, 0),
                ("teardown", Phase::Measure, 0),
                ("setup", Phase::Measure, 1),
                ("action", Phase::Measure, 1),
                ("action", Phase::Measure, 1),
                ("teardown", Phase::Measure, 1),
            ]
        );
    }

    #[test]
    fn test_hook_time_excluded_from_samples() {
        let clock = Arc::new(ManualClock::new(MS));
        let spec = BenchmarkSpec::builder()
            .iterations(3)
            .warmup_iterations(0)
            .min_time(Duration::ZERO)
            .max_time(Duration::from_secs(10))
            .clock(clock.clone())
            .build()
            .unwrap();
        let slow_hook = |clock: Arc<ManualClock>| {
            action(move |_| {
                clock.advance(50 * MS);
                Ok(())
            })
        };
        let hooks = RoundHooks::new()
            .setup(slow_hook(Arc::clone(&clock)))
            .teardown(slow_hook(Arc::clone(&clock)));

        let run = BenchmarkScheduler::new(Arc::new(spec))
            .run_with_hooks(&noop(), &hooks, &Variation::empty(), 1)
            .unwrap();

        assert_eq!(run.measured_rounds(), 3);
        assert!(run.samples.iter().all(|s| s.block_ns == 1_000_000));
        // Wall time still sees the hooks
        assert!(run.wall_elapsed_ns > 100_000_000);
    }

    #[test]
    fn test_hook_error_aborts_run() {
        let scheduler = BenchmarkScheduler::new(manual_spec(10, Duration::ZERO, Duration::from_secs(1)));
        let hooks = RoundHooks::new().setup(action(|ctx| {
            if ctx.phase() == Phase::Measure && ctx.round() == 2 {
                return Err("fixture missing".into());
            }
            Ok(())
        }));

        let err = scheduler
            .run_with_hooks(&noop(), &hooks, &Variation::empty(), 1)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Execution);
        assert_eq!(err.to_string(), "fixture missing");

        let hooks = RoundHooks::new().teardown(action(|_| Err("cleanup failed".into())));
        let err = scheduler
            .run_with_hooks(&noop(), &hooks, &Variation::empty(), 1)
            .unwrap_err();
        assert!(matches!(err, RunError::Execution(_)));
    }

    #[test]
    fn test_guarded_run_calls_hooks() {
        let spec = BenchmarkSpec::builder()
            .iterations(3)
            .warmup_iterations(0)
            .min_time(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let setups = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&setups);
        let hooks = RoundHooks::new().setup(action(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }));

        let run = BenchmarkScheduler::new(Arc::new(spec))
            .run_with_hooks(&noop(), &hooks, &Variation::empty(), 1)
            .unwrap();
        assert_eq!(setups.load(Ordering::Relaxed), run.measured_rounds());
    }
}
