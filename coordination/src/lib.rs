//! Debate Coordination Library
//!
//! This library provides:
//! - A ledger-driven coordinator that runs capability-tagged expert workers
//!   over one problem and converges on a single answer
//! - Worker dispatch with per-call timeouts, an optional bounded retry, and
//!   session cancellation
//! - Majority/evaluator aggregation of candidate answers
//! - An ordered, replayable event stream for observers
//!
//! # Modules
//!
//! - `ledger`: task ledger (facts + plan) and progress ledger (status)
//! - `worker`: the `Worker` trait, registry, answer extraction, dispatch
//! - `router`: expert assignment policies
//! - `debate`: session state machine, guardrails, aggregator, coordinator
//! - `events`: event types and the broadcast bus with history
//!
//! # Usage
//!
//! ```ignore
//! use debate_coordination::{Coordinator, DebateConfig, Problem, WorkerRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = WorkerRegistry::new().with(geometry).with(algebra).with(evaluator);
//! let coordinator = Coordinator::new(registry, DebateConfig::default())?;
//! let (_, mut events) = coordinator.event_bus().subscribe_with_history();
//! let outcome = coordinator
//!     .run(Problem::new("What is 6 times 12?"), CancellationToken::new())
//!     .await?;
//! println!("{}", outcome.final_answer);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod debate;
pub mod error;
pub mod events;
pub mod ledger;
pub mod router;
pub mod worker;

pub use config::{DebateConfig, SolveProblemRequest};
pub use debate::{
    AgentResponse, Aggregation, Aggregator, AnswerSource, Coordinator, DebateOutcome,
    DebateSession, ExpertAssignment, Problem, SessionPhase, TerminationReason,
};
pub use error::{
    AggregationError, ConfigError, LedgerError, SessionError, SessionResult, WorkerError,
};
pub use events::{DebateEvent, EventBus, EventEnvelope, SharedEventBus};
pub use ledger::{
    HeuristicLedgerBuilder, LedgerBuilder, LedgerDraft, ProgressLedger, ReplanContext, TaskLedger,
};
pub use router::{AssignmentPolicy, KeywordAssignmentPolicy};
pub use worker::{
    extract_answer, normalize_answer, Candidate, EvaluatorVerdict, SharedWorker, SolveRequest,
    Worker, WorkerRegistry, WorkerReply,
};
