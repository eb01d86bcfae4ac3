//! Worker interface: the only seam between the coordinator and the
//! solving/evaluating logic it drives.
//!
//! Workers are capability-tagged and looked up through an explicit
//! [`WorkerRegistry`]; the coordinator never depends on concrete types.

pub mod answer;
pub mod dispatch;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::debate::state::{AgentResponse, Problem};
use crate::error::{ConfigError, WorkerError};

pub use answer::{extract_answer, normalize_answer};
pub use dispatch::{DispatchOutcome, Dispatcher};

/// Input of a single `solve` call.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub problem: Problem,
    /// Round the call belongs to.
    pub round: u32,
    /// Coordinator-issued directive for this round.
    pub instruction: String,
    /// Peer responses visible to this worker, snapshotted at dispatch time.
    pub shared_context: Arc<[AgentResponse]>,
}

/// Raw result of a `solve` call.
///
/// `answer` may be left empty; the dispatcher then extracts it from
/// `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReply {
    pub content: String,
    pub answer: Option<String>,
    /// Pending ledger facts the worker claims to have resolved.
    pub resolved_facts: Vec<String>,
}

impl WorkerReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_resolved<I, S>(mut self, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolved_facts = facts.into_iter().map(Into::into).collect();
        self
    }
}

/// One worker's candidate answer, as seen by the evaluator and aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub worker_id: String,
    pub answer: String,
}

impl Candidate {
    pub fn new(worker_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            answer: answer.into(),
        }
    }
}

/// Evaluator's judgement over a set of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorVerdict {
    /// Whether the evaluator confirms the candidates agree on a correct answer.
    pub consensus: bool,
    /// Explicit final answer; wins outright during aggregation.
    pub final_answer: Option<String>,
    pub rationale: String,
}

/// A solving or evaluating unit.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &str;

    /// Capability tags used by the assignment policy.
    fn capabilities(&self) -> &[String];

    /// Fallback worker when no capability matches the problem.
    fn is_generalist(&self) -> bool {
        false
    }

    /// Whether this worker takes part in solving rounds.
    fn can_solve(&self) -> bool {
        true
    }

    /// Whether this worker implements `evaluate`.
    fn can_evaluate(&self) -> bool {
        false
    }

    /// Produce a candidate answer for the current round.
    async fn solve(&self, request: &SolveRequest) -> Result<WorkerReply, WorkerError>;

    /// Judge the candidate answers.
    async fn evaluate(
        &self,
        _problem: &Problem,
        _candidates: &[Candidate],
    ) -> Result<EvaluatorVerdict, WorkerError> {
        Err(WorkerError::Unsupported(self.id().to_string()))
    }
}

/// Shared handle to a worker.
pub type SharedWorker = Arc<dyn Worker>;

/// Registration-ordered set of workers keyed by id.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: Vec<SharedWorker>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker. Returns false if the id is already taken.
    pub fn register(&mut self, worker: SharedWorker) -> bool {
        if self.get(worker.id()).is_some() {
            return false;
        }
        self.workers.push(worker);
        true
    }

    /// Builder-style registration; duplicates are ignored.
    pub fn with(mut self, worker: SharedWorker) -> Self {
        self.register(worker);
        self
    }

    pub fn get(&self, id: &str) -> Option<&SharedWorker> {
        self.workers.iter().find(|w| w.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Solving workers in registration order.
    pub fn solvers(&self) -> impl Iterator<Item = &SharedWorker> {
        self.workers.iter().filter(|w| w.can_solve())
    }

    /// First evaluator-capable worker, if any.
    pub fn evaluator(&self) -> Option<&SharedWorker> {
        self.workers.iter().find(|w| w.can_evaluate())
    }

    /// A registry limited to `pool`, keeping registration order.
    pub fn restrict(&self, pool: &[String]) -> Result<Self, ConfigError> {
        if pool.is_empty() {
            return Err(ConfigError::EmptyWorkerPool);
        }
        if let Some(unknown) = pool.iter().find(|id| self.get(id).is_none()) {
            return Err(ConfigError::UnknownWorker(unknown.clone()));
        }
        Ok(Self {
            workers: self
                .workers
                .iter()
                .filter(|w| pool.iter().any(|id| id == w.id()))
                .cloned()
                .collect(),
        })
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal workers for unit tests.

    use super::*;

    pub struct FixedWorker {
        pub id: String,
        pub caps: Vec<String>,
        pub generalist: bool,
        pub evaluator: bool,
        pub reply: Result<WorkerReply, WorkerError>,
    }

    impl FixedWorker {
        pub fn answering(id: &str, answer: &str) -> Self {
            Self {
                id: id.to_string(),
                caps: Vec::new(),
                generalist: false,
                evaluator: false,
                reply: Ok(WorkerReply::text(format!("The answer is {{{{{}}}}}.", answer))),
            }
        }

        pub fn with_caps(mut self, caps: &[&str]) -> Self {
            self.caps = caps.iter().map(|c| c.to_string()).collect();
            self
        }

        pub fn generalist(mut self) -> Self {
            self.generalist = true;
            self
        }

        pub fn evaluator(mut self) -> Self {
            self.evaluator = true;
            self
        }

        pub fn shared(self) -> SharedWorker {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl Worker for FixedWorker {
        fn id(&self) -> &str {
            &self.id
        }

        fn capabilities(&self) -> &[String] {
            &self.caps
        }

        fn is_generalist(&self) -> bool {
            self.generalist
        }

        fn can_solve(&self) -> bool {
            !self.evaluator
        }

        fn can_evaluate(&self) -> bool {
            self.evaluator
        }

        async fn solve(&self, _request: &SolveRequest) -> Result<WorkerReply, WorkerError> {
            self.reply.clone()
        }
    }
}
