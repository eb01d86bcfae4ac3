//! Debate Coordination: ledger-driven multi-expert control loop
//!
//! One [`Coordinator`] run takes a single problem from submission to a
//! final answer. It is the only writer of the session's ledgers.
//!
//! # Session Flow
//!
//! ```text
//! Initializing → Assigning ⇄ Dispatching → Collecting
//!                   │            (per worker, or all at once)
//!                   ▼
//!               Updating ─┬─ Continuing → Assigning (next round)
//!                         ├─ Replanning → Assigning (stall, budget left)
//!                         └─ Terminating → aggregate → debate_end
//!
//! cancellation or fatal error in any phase → Terminating → error event
//! ```

pub mod consensus;
pub mod guardrails;
pub mod orchestrator;
pub mod state;

pub use consensus::{Aggregation, Aggregator, AnswerSource};
pub use guardrails::{RoundDecision, RoundSignals, TerminationPolicy, TerminationReason};
pub use orchestrator::{Coordinator, DebateOutcome, REVIEW_INSTRUCTION};
pub use state::{
    AgentResponse, DebateSession, ExpertAssignment, PhaseTransition, Problem, SessionPhase,
    TransitionError,
};
