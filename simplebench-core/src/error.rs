//! Error Taxonomy
//!
//! - [`ConfigError`]: invalid declarations, raised while building specs, cases
//!   and variations and never during scheduling.
//! - [`RunError`]: why one variation's run was aborted.
//!
//! Action errors travel as [`ActionError`] and are displayed transparently, so
//! the message is untouched and the concrete type can still be downcast.

use crate::timeout::TimeoutExceeded;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error type returned by benchmarked actions
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid benchmark declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Timeout interval was zero, negative or not a number
    #[error("timeout interval must be greater than zero, got {0}")]
    InvalidTimeout(String),

    /// `min_time` is larger than `max_time`
    #[error("min_time ({min:?}) must not exceed max_time ({max:?})")]
    InvertedTimeRange {
        /// Requested minimum measurement time
        min: Duration,
        /// Requested maximum measurement time
        max: Duration,
    },

    /// A count field is below its lower bound
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Field name
        field: &'static str,
        /// Smallest accepted value
        min: u64,
        /// Value supplied
        value: u64,
    },

    /// A variation key was declared twice
    #[error("variation `{0}` is declared more than once")]
    DuplicateVariation(String),

    /// A variation key has no candidate values
    #[error("variation `{0}` has no candidate values")]
    EmptyVariation(String),

    /// A variation key or column label is blank
    #[error("{0} must not be blank")]
    Blank(&'static str),

    /// A report column names a key that is not a declared variation
    #[error("column `{0}` does not name a declared variation")]
    UnknownColumn(String),

    /// A report column was declared twice
    #[error("column `{0}` is declared more than once")]
    DuplicateColumn(String),

    /// The designated `n` key is not a declared variation
    #[error("n key `{0}` does not name a declared variation")]
    UnknownNKey(String),

    /// The designated `n` key has a value that is not a positive integer
    #[error("n key `{key}` has value {value}, expected a positive integer")]
    InvalidNValue {
        /// Variation key used for `n`
        key: String,
        /// Offending candidate value
        value: String,
    },

    /// A case was built without an action
    #[error("case `{0}` has no action")]
    MissingAction(String),

    /// A case with the same group and title is already registered
    #[error("case `{group}/{title}` is already registered")]
    DuplicateCase {
        /// Case group
        group: String,
        /// Case title
        title: String,
    },
}

/// Category of a failed run, for drivers that mark cases failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Invalid declaration
    Configuration,
    /// The action returned an error
    Execution,
    /// The measurement deadline fired
    Timeout,
    /// No samples were collected
    Degenerate,
    /// The action panicked
    Panic,
    /// The engine could not run the action at all
    Internal,
}

/// Why a variation's run was aborted
#[derive(Debug, Error)]
pub enum RunError {
    /// Invalid declaration
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The action returned an error during warmup or measurement
    #[error(transparent)]
    Execution(ActionError),

    /// The measurement phase exceeded its timeout
    #[error("measurement exceeded its {:?} timeout after {rounds_completed} rounds", source.interval)]
    Timeout {
        /// Deadline that fired
        #[source]
        source: TimeoutExceeded,
        /// Rounds measured before the deadline fired
        rounds_completed: u64,
    },

    /// Measurement finished without a single sample
    #[error("no samples collected: {reason}")]
    Degenerate {
        /// What cut the run short
        reason: String,
    },

    /// The action panicked
    #[error("action panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text
        message: String,
    },

    /// The guarded worker thread could not be started or vanished
    #[error("measurement worker failed: {0}")]
    Worker(#[source] std::io::Error),
}

impl RunError {
    /// Failure category
    pub fn kind(&self) -> FailureKind {
        match self {
            RunError::Configuration(_) => FailureKind::Configuration,
            RunError::Execution(_) => FailureKind::Execution,
            RunError::Timeout { .. } => FailureKind::Timeout,
            RunError::Degenerate { .. } => FailureKind::Degenerate,
            RunError::Panicked { .. } => FailureKind::Panic,
            RunError::Worker(_) => FailureKind::Internal,
        }
    }

    /// Whether the run ended without collecting any sample
    pub fn is_degenerate(&self) -> bool {
        match self {
            RunError::Degenerate { .. } => true,
            RunError::Timeout {
                rounds_completed, ..
            } => *rounds_completed == 0,
            _ => false,
        }
    }

    /// The action's own error, if that is what aborted the run
    pub fn action_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            RunError::Execution(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Render a panic payload as text
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
