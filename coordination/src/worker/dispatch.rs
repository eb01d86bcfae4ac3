//! Bounded worker calls: per-call timeout, optional single retry, and
//! session cancellation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::answer::{extract_answer, normalize_answer};
use super::{Candidate, EvaluatorVerdict, SharedWorker, SolveRequest, WorkerReply};
use crate::debate::state::{AgentResponse, Problem};
use crate::error::WorkerError;

/// Content preview length carried in `MalformedOutput`.
const PREVIEW_CHARS: usize = 80;

/// A recorded response plus the ledger facts it claims to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub response: AgentResponse,
    pub resolved_facts: Vec<String>,
}

/// Result of dispatching one worker for one round.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub worker_id: String,
    pub round: u32,
    /// Number of calls made (1 + retries used).
    pub attempts: u32,
    pub result: Result<Dispatched, WorkerError>,
}

impl DispatchOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.result, Err(WorkerError::Cancelled))
    }
}

/// Issues worker calls under the session's time and retry budget.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    timeout: Duration,
    max_retries: u32,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(timeout: Duration, max_retries: u32, cancel: CancellationToken) -> Self {
        Self {
            timeout,
            max_retries,
            cancel,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call `solve` with retries for retriable failures.
    pub async fn solve(&self, worker: &SharedWorker, request: &SolveRequest) -> DispatchOutcome {
        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            let result = self.attempt_solve(worker, request).await;
            match &result {
                Err(e) if e.is_retriable() && attempts <= self.max_retries => {
                    warn!(
                        worker = worker.id(),
                        round = request.round,
                        attempt = attempts,
                        error = %e,
                        "worker call failed, retrying"
                    );
                }
                _ => break result,
            }
        };

        DispatchOutcome {
            worker_id: worker.id().to_string(),
            round: request.round,
            attempts,
            result,
        }
    }

    /// Call `evaluate` once under the same timeout and cancellation.
    pub async fn evaluate(
        &self,
        worker: &SharedWorker,
        problem: &Problem,
        candidates: &[Candidate],
    ) -> Result<EvaluatorVerdict, WorkerError> {
        let verdict = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(WorkerError::Cancelled),
            res = tokio::time::timeout(self.timeout, worker.evaluate(problem, candidates)) => {
                res.map_err(|_| WorkerError::Timeout(self.timeout))??
            }
        };

        let final_answer = verdict.final_answer.as_deref().and_then(normalize_answer);
        Ok(EvaluatorVerdict {
            final_answer,
            ..verdict
        })
    }

    async fn attempt_solve(
        &self,
        worker: &SharedWorker,
        request: &SolveRequest,
    ) -> Result<Dispatched, WorkerError> {
        debug!(worker = worker.id(), round = request.round, "dispatching");
        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(WorkerError::Cancelled),
            res = tokio::time::timeout(self.timeout, worker.solve(request)) => {
                res.map_err(|_| WorkerError::Timeout(self.timeout))??
            }
        };
        into_dispatched(worker.id(), request.round, reply)
    }
}

fn into_dispatched(
    worker_id: &str,
    round: u32,
    reply: WorkerReply,
) -> Result<Dispatched, WorkerError> {
    let answer = reply
        .answer
        .as_deref()
        .and_then(normalize_answer)
        .or_else(|| extract_answer(&reply.content))
        .ok_or_else(|| {
            WorkerError::MalformedOutput(reply.content.chars().take(PREVIEW_CHARS).collect())
        })?;

    Ok(Dispatched {
        response: AgentResponse::new(worker_id, round, reply.content, answer),
        resolved_facts: reply.resolved_facts,
    })
}
