//! Coordinator-owned ledgers.
//!
//! The task ledger records facts and the plan; the progress ledger records
//! run-time status. Both are mutated only by the coordinator, one round at
//! a time, so neither needs locking.

pub mod builder;
pub mod progress;
pub mod task;

pub use builder::{HeuristicLedgerBuilder, LedgerBuilder, ReplanContext};
pub use progress::ProgressLedger;
pub use task::{FactKind, LedgerDraft, TaskLedger, FALLBACK_STEP};
