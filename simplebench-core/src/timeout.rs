//! Timeout Guard
//!
//! Runs a callable on a dedicated worker thread and waits for its result up
//! to a wall-clock deadline. When the deadline fires first the caller gets a
//! [`GuardError::TimedOut`] immediately; the worker is abandoned, not killed,
//! and its eventual result is discarded. Workers that want to stop early can
//! poll the [`GuardToken`] handed to them by [`TimeoutGuard::run_cancellable`].
//!
//! Guards nest: a guard running inside another guard's worker behaves as a
//! plain callable to the outer guard, so an inner timeout reaches the outer
//! caller as `GuardError::Failed(GuardError::TimedOut(..))`.

use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of the most recent guarded invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutState {
    /// No invocation has finished yet
    Pending,
    /// The callable returned a value before the deadline
    Executed,
    /// The deadline fired first
    TimedOut,
    /// The callable returned an error or panicked before the deadline
    Failed,
}

/// A guarded invocation ran past its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {interval:?} exceeded")]
pub struct TimeoutExceeded {
    /// The interval that was exceeded
    pub interval: Duration,
}

/// Failure of a guarded invocation
#[derive(Debug)]
pub enum GuardError<E> {
    /// The deadline fired before the callable finished
    TimedOut(TimeoutExceeded),
    /// The callable finished with its own error
    Failed(E),
    /// The worker thread could not be spawned
    Spawn(std::io::Error),
    /// The worker exited without delivering a result
    WorkerLost,
}

impl<E> GuardError<E> {
    /// Whether this is a timeout of this guard, not of a nested one
    pub fn is_timeout(&self) -> bool {
        matches!(self, GuardError::TimedOut(_))
    }

    /// The callable's own error, if any
    pub fn into_failed(self) -> Option<E> {
        match self {
            GuardError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for GuardError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::TimedOut(t) => t.fmt(f),
            GuardError::Failed(e) => e.fmt(f),
            GuardError::Spawn(e) => write!(f, "failed to spawn guarded worker: {e}"),
            GuardError::WorkerLost => f.write_str("guarded worker exited without a result"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for GuardError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::TimedOut(_) | GuardError::WorkerLost => None,
            GuardError::Failed(e) => e.source(),
            GuardError::Spawn(e) => Some(e),
        }
    }
}

/// Cooperative cancellation flag shared with a guarded worker
#[derive(Debug, Clone, Default)]
pub struct GuardToken {
    expired: Arc<AtomicBool>,
}

impl GuardToken {
    /// A token that never expires
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether the guard's deadline has fired and the result will be discarded
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    fn expire(&self) {
        self.expired.store(true, Ordering::Release);
    }
}

/// Wall-clock deadline around a callable
#[derive(Debug)]
pub struct TimeoutGuard {
    interval: Duration,
    state: TimeoutState,
}

impl TimeoutGuard {
    /// Guard with the given deadline; zero is rejected
    pub fn new(interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{interval:?}")));
        }
        Ok(Self {
            interval,
            state: TimeoutState::Pending,
        })
    }

    /// Guard from fractional seconds; zero, negative and non-finite values
    /// are rejected
    pub fn from_secs_f64(secs: f64) -> Result<Self, ConfigError> {
        let interval = Duration::try_from_secs_f64(secs)
            .map_err(|_| ConfigError::InvalidTimeout(secs.to_string()))?;
        if interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(secs.to_string()));
        }
        Self::new(interval)
    }

    /// The deadline
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Outcome of the most recent invocation
    pub fn state(&self) -> TimeoutState {
        self.state
    }

    /// Run `f` under the deadline
    pub fn run<F, T, E>(&mut self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.run_cancellable(move |_| f())
    }

    /// Run `f` under the deadline, handing it a token that expires when the
    /// deadline fires.
    ///
    /// A panic inside `f` is re-raised on the calling thread after the state
    /// is set to [`TimeoutState::Failed`].
    pub fn run_cancellable<F, T, E>(&mut self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce(&GuardToken) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.state = TimeoutState::Pending;

        let token = GuardToken::default();
        let worker_token = token.clone();
        // Capacity 1 so an abandoned worker can still deliver and exit.
        let (tx, rx) = mpsc::sync_channel(1);

        let spawned = thread::Builder::new()
            .name("simplebench-guard".to_string())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&worker_token)));
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            self.state = TimeoutState::Failed;
            return Err(GuardError::Spawn(e));
        }

        match rx.recv_timeout(self.interval) {
            Ok(Ok(Ok(value))) => {
                self.state = TimeoutState::Executed;
                Ok(value)
            }
            Ok(Ok(Err(e))) => {
                self.state = TimeoutState::Failed;
                Err(GuardError::Failed(e))
            }
            Ok(Err(payload)) => {
                self.state = TimeoutState::Failed;
                debug!("guarded worker panicked, re-raising on caller");
                panic::resume_unwind(payload)
            }
            Err(RecvTimeoutError::Timeout) => {
                token.expire();
                self.state = TimeoutState::TimedOut;
                warn!(interval = ?self.interval, "guarded call exceeded its deadline, worker abandoned");
                Err(GuardError::TimedOut(TimeoutExceeded {
                    interval: self.interval,
                }))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.state = TimeoutState::Failed;
                Err(GuardError::WorkerLost)
            }
        }
    }
}
