//! Error taxonomy for debate sessions.
//!
//! Per-worker failures are recoverable and absorbed into the progress ledger.
//! Only session-level errors unwind `Coordinator::run`.
//!
//! | Error                      | Scope   | Effect                                 |
//! |----------------------------|---------|----------------------------------------|
//! | `WorkerError::Timeout`     | worker  | no answer this round, counts as stall  |
//! | `WorkerError::MalformedOutput` | worker | no answer this round, counts as stall |
//! | `SessionError::Inconclusive` | session | `error` event, no final answer       |
//! | `SessionError::LedgerInvariantViolation` | session | `error` event, abort     |

use std::time::Duration;

use thiserror::Error;

use crate::debate::state::TransitionError;

/// Failure of a single worker call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The call exceeded its time budget and was cancelled.
    #[error("worker timed out after {0:?}")]
    Timeout(Duration),

    /// The worker answered but no candidate answer could be extracted.
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// The worker reported a failure of its own (transport, backend, ...).
    #[error("worker failed: {0}")]
    Failed(String),

    /// The worker does not implement the requested capability.
    #[error("operation not supported by worker {0}")]
    Unsupported(String),

    /// The session was cancelled while the call was in flight.
    #[error("cancelled")]
    Cancelled,
}

impl WorkerError {
    /// Whether a bounded retry may be attempted for this failure.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::MalformedOutput(_) | Self::Failed(_)
        )
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::MalformedOutput(_) => "malformed_output",
            Self::Failed(_) => "failed",
            Self::Unsupported(_) => "unsupported",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A ledger operation that would break a ledger invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("fact not pending: {0}")]
    UnknownFact(String),

    #[error("task plan must not be empty")]
    EmptyPlan,

    #[error("plan step not found: {0}")]
    UnknownStep(String),

    #[error("plan step already completed: {0}")]
    StepAlreadyCompleted(String),

    #[error("{completed} completed steps exceed plan length {planned}")]
    CompletedOverflow { completed: usize, planned: usize },

    #[error("completed task still names next speaker {0}")]
    SpeakerOnCompletedTask(String),
}

/// Invalid session tuning options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_rounds must be at least 1")]
    ZeroRounds,

    #[error("per_call_timeout must be non-zero")]
    ZeroTimeout,

    #[error("max_retries must be 0 or 1, got {0}")]
    TooManyRetries(u32),

    #[error("event_capacity must be non-zero")]
    ZeroEventCapacity,

    #[error("worker_pool is present but empty")]
    EmptyWorkerPool,

    #[error("unknown worker in pool: {0}")]
    UnknownWorker(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Failure to reduce candidates to a final answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("no candidate answers to aggregate")]
    Inconclusive,
}

/// Session-level failure returned by `Coordinator::run`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No usable candidate answer existed when the session terminated.
    #[error("inconclusive: {0}")]
    Inconclusive(String),

    /// Internal ledger state was corrupted. Fatal.
    #[error("ledger invariant violation: {0}")]
    LedgerInvariantViolation(#[from] LedgerError),

    /// The caller cancelled the session.
    #[error("session cancelled")]
    Cancelled,

    /// No solving worker could be assigned.
    #[error("no solving workers available")]
    NoWorkers,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The coordinator attempted a phase change its state machine forbids.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

impl From<AggregationError> for SessionError {
    fn from(err: AggregationError) -> Self {
        Self::Inconclusive(err.to_string())
    }
}

/// Result alias for session-level operations.
pub type SessionResult<T> = Result<T, SessionError>;
