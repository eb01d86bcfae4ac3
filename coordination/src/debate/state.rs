//! Debate session state: problem, responses, ledgers, and the
//! coordinator's phase machine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerDraft, ProgressLedger, TaskLedger};
use crate::worker::Candidate;

/// Immutable problem statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Problem {
    statement: String,
}

impl Problem {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.trim().to_string(),
        }
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.statement)
    }
}

/// One worker's recorded answer for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub worker_id: String,
    pub round: u32,
    pub content: String,
    /// Normalized candidate answer.
    pub answer: String,
}

impl AgentResponse {
    pub fn new(
        worker_id: impl Into<String>,
        round: u32,
        content: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            round,
            content: content.into(),
            answer: answer.into(),
        }
    }
}

/// Workers selected to solve the problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertAssignment {
    /// Non-empty once the session has left `Initializing`.
    pub assigned_workers: Vec<String>,
    /// Advisory only.
    pub reasoning: String,
}

impl ExpertAssignment {
    pub fn new(assigned_workers: Vec<String>, reasoning: impl Into<String>) -> Self {
        Self {
            assigned_workers,
            reasoning: reasoning.into(),
        }
    }

    pub fn contains(&self, worker_id: &str) -> bool {
        self.assigned_workers.iter().any(|w| w == worker_id)
    }
}

/// Phase of the coordinator control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Building the task ledger and the initial assignment.
    Initializing,
    /// Choosing the next speaker for the current round.
    Assigning,
    /// A `solve` call is in flight.
    Dispatching,
    /// Recording a worker's result.
    Collecting,
    /// Recomputing progress and deciding termination.
    Updating,
    Continuing,
    Replanning,
    Terminating,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        self == Self::Terminating
    }

    /// Valid transitions from this phase. Every non-terminal phase may
    /// jump to `Terminating` on cancellation or a fatal error.
    pub fn valid_transitions(self) -> &'static [SessionPhase] {
        match self {
            Self::Initializing => &[Self::Assigning, Self::Terminating],
            Self::Assigning => &[Self::Dispatching, Self::Updating, Self::Terminating],
            Self::Dispatching => &[Self::Collecting, Self::Terminating],
            Self::Collecting => &[Self::Assigning, Self::Terminating],
            Self::Updating => &[Self::Continuing, Self::Replanning, Self::Terminating],
            Self::Continuing | Self::Replanning => &[Self::Assigning, Self::Terminating],
            Self::Terminating => &[],
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Assigning => write!(f, "assigning"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Collecting => write!(f, "collecting"),
            Self::Updating => write!(f, "updating"),
            Self::Continuing => write!(f, "continuing"),
            Self::Replanning => write!(f, "replanning"),
            Self::Terminating => write!(f, "terminating"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid phase transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {} (allowed: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for TransitionError {}

/// Aggregate root of one debate: owns the problem, both ledgers, the
/// assignment, and the append-only response log.
///
/// Only the coordinator mutates a session; observers get snapshots through
/// the event stream or the returned outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    id: String,
    problem: Problem,
    task_ledger: TaskLedger,
    progress_ledger: ProgressLedger,
    assignment: ExpertAssignment,
    /// Every worker ever assigned, in first-assigned order. Used for
    /// aggregation tie-breaks across re-plans.
    assignment_order: Vec<String>,
    responses: Vec<AgentResponse>,
    final_answer: Option<String>,
    phase: SessionPhase,
    round: u32,
    transitions: Vec<PhaseTransition>,
    created_at: DateTime<Utc>,
}

impl DebateSession {
    pub fn new(problem: Problem) -> Self {
        Self::with_id(&uuid::Uuid::new_v4().to_string(), problem)
    }

    pub fn with_id(id: &str, problem: Problem) -> Self {
        Self {
            id: id.to_string(),
            problem,
            task_ledger: LedgerDraft::default().into_ledger(),
            progress_ledger: ProgressLedger::new(),
            assignment: ExpertAssignment::default(),
            assignment_order: Vec::new(),
            responses: Vec::new(),
            final_answer: None,
            phase: SessionPhase::Initializing,
            round: 0,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn task_ledger(&self) -> &TaskLedger {
        &self.task_ledger
    }

    pub fn progress_ledger(&self) -> &ProgressLedger {
        &self.progress_ledger
    }

    pub fn assignment(&self) -> &ExpertAssignment {
        &self.assignment
    }

    pub fn responses(&self) -> &[AgentResponse] {
        &self.responses
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current round (0-based).
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Move to `to`, recording the transition.
    pub fn transition(&mut self, to: SessionPhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            round: self.round,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    pub(crate) fn task_ledger_mut(&mut self) -> &mut TaskLedger {
        &mut self.task_ledger
    }

    pub(crate) fn progress_ledger_mut(&mut self) -> &mut ProgressLedger {
        &mut self.progress_ledger
    }

    pub(crate) fn set_task_ledger(&mut self, ledger: TaskLedger) {
        self.task_ledger = ledger;
    }

    pub(crate) fn set_assignment(&mut self, assignment: ExpertAssignment) {
        for worker in &assignment.assigned_workers {
            if !self.assignment_order.contains(worker) {
                self.assignment_order.push(worker.clone());
            }
        }
        self.assignment = assignment;
    }

    pub(crate) fn record_response(&mut self, response: AgentResponse) {
        self.responses.push(response);
    }

    pub(crate) fn set_final_answer(&mut self, answer: String) {
        self.final_answer = Some(answer);
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Latest answer per worker, ordered by first assignment.
    pub fn latest_answers(&self) -> Vec<Candidate> {
        self.assignment_order
            .iter()
            .filter_map(|worker| {
                self.responses
                    .iter()
                    .rev()
                    .find(|r| &r.worker_id == worker)
                    .map(|r| Candidate::new(worker.as_str(), r.answer.as_str()))
            })
            .collect()
    }

    /// Whether every currently assigned worker has an answer and all of
    /// those latest answers are equal.
    pub fn assigned_answers_agree(&self) -> bool {
        let latest = self.latest_answers();
        let mut answers = self.assignment.assigned_workers.iter().map(|worker| {
            latest
                .iter()
                .find(|c| &c.worker_id == worker)
                .map(|c| c.answer.as_str())
        });
        match answers.next() {
            Some(Some(first)) => answers.all(|a| a == Some(first)),
            _ => false,
        }
    }

    /// Responses recorded for `round`.
    pub fn responses_in_round(&self, round: u32) -> impl Iterator<Item = &AgentResponse> {
        self.responses.iter().filter(move |r| r.round == round)
    }

    /// Peer responses from earlier rounds visible to `worker_id` in the
    /// current round. Empty in round 0.
    pub fn shared_context_for(&self, worker_id: &str) -> Arc<[AgentResponse]> {
        self.responses
            .iter()
            .filter(|r| r.round < self.round && r.worker_id != worker_id)
            .cloned()
            .collect()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {} | {} responses | stall {} | {}/{} steps | answer={}",
            self.phase,
            self.round,
            self.responses.len(),
            self.progress_ledger.stall_count(),
            self.progress_ledger.completed_steps().len(),
            self.task_ledger.task_plan().len(),
            self.final_answer.as_deref().unwrap_or("-")
        )
    }
}
