//! Clocks and Timers
//!
//! The scheduler never reads the system clock directly: every timing goes
//! through a [`Clock`] held by the [`BenchmarkSpec`](crate::BenchmarkSpec), so
//! tests can substitute a deterministic [`ManualClock`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic nanosecond clock
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current reading in nanoseconds. Successive readings never decrease.
    fn now_ns(&self) -> u64;
}

/// Whole nanoseconds in `d`, saturating at `u64::MAX`
#[inline]
pub(crate) fn duration_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

// ─── MonotonicClock ──────────────────────────────────────────────────────────

/// Default clock backed by [`std::time::Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is "now"
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        duration_ns(self.origin.elapsed())
    }
}

// ─── ManualClock ─────────────────────────────────────────────────────────────

/// Deterministic clock for tests.
///
/// Every reading advances the clock by a fixed step, so a timed block
/// bracketed by two readings always measures exactly `step`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    /// Clock starting at zero that advances `step` per reading
    pub fn new(step: Duration) -> Self {
        Self {
            now: AtomicU64::new(0),
            step: duration_ns(step),
        }
    }

    /// Jump forward without taking a reading
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_ns(by), Ordering::SeqCst);
    }

    /// Current value without advancing
    pub fn peek_ns(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Times one block against a clock
pub struct Timer<'a> {
    clock: &'a dyn Clock,
    start_ns: u64,
}

impl<'a> Timer<'a> {
    /// Start a new timer
    #[inline(always)]
    pub fn start(clock: &'a dyn Clock) -> Self {
        Self {
            start_ns: clock.now_ns(),
            clock,
        }
    }

    /// Elapsed nanoseconds since start
    #[inline(always)]
    pub fn stop(&self) -> u64 {
        self.stop_at().0
    }

    /// Elapsed nanoseconds plus the clock reading that ended the block
    #[inline(always)]
    pub fn stop_at(&self) -> (u64, u64) {
        let end_ns = self.clock.now_ns();
        (end_ns.saturating_sub(self.start_ns), end_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_elapsed() {
        let clock = MonotonicClock::new();
        let timer = Timer::start(&clock);
        std::thread::sleep(Duration::from_millis(10));
        let nanos = timer.stop();

        // Should be at least 5ms in nanos
        assert!(nanos >= 5_000_000);
    }

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_ns();
        for _ in 0..1000 {
            let now = clock.now_ns();
            assert!(now >= last, "clock should be monotonic");
            last = now;
        }
    }

    #[test]
    fn test_manual_clock_steps() {
        let clock = ManualClock::new(Duration::from_micros(5));
        assert_eq!(clock.now_ns(), 0);
        assert_eq!(clock.now_ns(), 5_000);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.peek_ns(), 1_000_010_000);
    }

    #[test]
    fn test_timer_on_manual_clock() {
        let clock = ManualClock::new(Duration::from_millis(3));
        let timer = Timer::start(&clock);
        assert_eq!(timer.stop(), 3_000_000);
        // second reading: started at 0, now reads 6ms
        assert_eq!(timer.stop_at(), (6_000_000, 6_000_000));
    }

    #[test]
    fn test_duration_ns_saturates() {
        assert_eq!(duration_ns(Duration::from_millis(7)), 7_000_000);
        assert_eq!(duration_ns(Duration::from_nanos(u64::MAX)), u64::MAX);
        // 2^64 ns + 1ms would wrap to 1ms with a plain cast
        assert_eq!(duration_ns(Duration::new(18_446_744_073, 710_551_616)), u64::MAX);
        assert_eq!(duration_ns(Duration::MAX), u64::MAX);
    }
}
