//! Debate coordinator: drives the assign → dispatch → collect → update
//! loop for one problem end-to-end.
//!
//! Ties together the ledgers, worker dispatch, the termination guardrails,
//! and the aggregator, and reports every step on the event bus.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::consensus::{Aggregation, Aggregator, AnswerSource};
use super::guardrails::{RoundDecision, RoundSignals, TerminationPolicy, TerminationReason};
use super::state::{DebateSession, Problem, SessionPhase};
use crate::config::{DebateConfig, SolveProblemRequest};
use crate::error::{ConfigError, LedgerError, SessionError, SessionResult, WorkerError};
use crate::events::{DebateEvent, EventBus, SessionEmitter, SharedEventBus};
use crate::ledger::{HeuristicLedgerBuilder, LedgerBuilder, ReplanContext};
use crate::router::{AssignmentPolicy, KeywordAssignmentPolicy};
use crate::worker::dispatch::Dispatched;
use crate::worker::{
    DispatchOutcome, Dispatcher, EvaluatorVerdict, SharedWorker, SolveRequest, WorkerRegistry,
};

/// Instruction issued once every plan step is complete.
pub const REVIEW_INSTRUCTION: &str = "Review peer answers and confirm or revise your final answer";

/// Outcome of a completed debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOutcome {
    /// The session snapshot at completion.
    pub session: DebateSession,
    pub termination: TerminationReason,
    pub final_answer: String,
    /// How the final answer was chosen.
    pub source: AnswerSource,
}

impl DebateOutcome {
    /// Whether the session ended on confirmed consensus.
    pub fn is_consensus(&self) -> bool {
        self.termination == TerminationReason::Consensus
    }

    /// Rounds that dispatched work.
    pub fn rounds_completed(&self) -> u32 {
        self.session.round() + 1
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] answer={} | {} rounds | {} responses | session={}",
            self.termination,
            self.final_answer,
            self.rounds_completed(),
            self.session.responses().len(),
            self.session.id()
        )
    }
}

/// Runs debate sessions over a worker registry.
///
/// Usage:
/// 1. Register workers in a [`WorkerRegistry`]
/// 2. Create with `new()`, optionally swapping the ledger builder,
///    assignment policy, or event bus
/// 3. Subscribe to `event_bus()` if the trace is wanted
/// 4. Call `run()` (or `solve()` for a request with its own tuning)
pub struct Coordinator {
    registry: WorkerRegistry,
    config: DebateConfig,
    builder: Arc<dyn LedgerBuilder>,
    policy: Arc<dyn AssignmentPolicy>,
    bus: SharedEventBus,
}

impl Coordinator {
    pub fn new(registry: WorkerRegistry, config: DebateConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Some(pool) = &config.worker_pool {
            registry.restrict(pool)?;
        }
        let bus = EventBus::with_capacity(config.event_capacity).shared();
        Ok(Self {
            registry,
            config,
            builder: Arc::new(HeuristicLedgerBuilder::new()),
            policy: Arc::new(KeywordAssignmentPolicy::new()),
            bus,
        })
    }

    pub fn with_ledger_builder(mut self, builder: impl LedgerBuilder + 'static) -> Self {
        self.builder = Arc::new(builder);
        self
    }

    pub fn with_assignment_policy(mut self, policy: impl AssignmentPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn event_bus(&self) -> SharedEventBus {
        self.bus.clone()
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Run a session for an inbound request. The request's configuration,
    /// when present, replaces the coordinator's for this session.
    ///
    /// Events still go to the coordinator's bus, so a request's
    /// `event_capacity` has no effect here; size the bus with
    /// [`Coordinator::with_event_bus`] instead.
    pub async fn solve(
        &self,
        request: &SolveProblemRequest,
        cancel: CancellationToken,
    ) -> SessionResult<DebateOutcome> {
        let config = request
            .configuration
            .clone()
            .unwrap_or_else(|| self.config.clone());
        self.run_with_config(Problem::new(&request.question), &config, cancel)
            .await
    }

    /// Run a session with the coordinator's configuration.
    pub async fn run(
        &self,
        problem: Problem,
        cancel: CancellationToken,
    ) -> SessionResult<DebateOutcome> {
        self.run_with_config(problem, &self.config, cancel).await
    }

    async fn run_with_config(
        &self,
        problem: Problem,
        config: &DebateConfig,
        cancel: CancellationToken,
    ) -> SessionResult<DebateOutcome> {
        let session = DebateSession::new(problem);
        let emitter = SessionEmitter::new(self.bus.clone(), session.id());
        info!(session_id = session.id(), "debate started");
        emitter.emit(DebateEvent::DebateStart {
            question: session.problem().statement().to_string(),
        });

        let registry = match self.session_registry(config) {
            Ok(registry) => registry,
            Err(e) => return Err(fail(&emitter, e)),
        };

        let mut run = SessionRun {
            session,
            emitter,
            dispatcher: Dispatcher::new(
                config.per_call_timeout,
                config.max_retries,
                cancel.clone(),
            ),
            registry,
            policy: TerminationPolicy::from_config(config),
            parallel: config.parallel_dispatch,
            cancel,
            builder: self.builder.as_ref(),
            assigner: self.policy.as_ref(),
            verdict: None,
            evaluated_round: None,
        };

        match run.drive().await {
            Ok((termination, aggregation)) => {
                let mut session = run.session;
                session.set_final_answer(aggregation.final_answer.clone());
                info!(
                    session_id = session.id(),
                    termination = %termination,
                    final_answer = %aggregation.final_answer,
                    "debate finished"
                );
                run.emitter.emit(DebateEvent::DebateEnd {
                    final_answer: aggregation.final_answer.clone(),
                });
                Ok(DebateOutcome {
                    session,
                    termination,
                    final_answer: aggregation.final_answer,
                    source: aggregation.source,
                })
            }
            Err(e) => Err(fail(&run.emitter, e)),
        }
    }

    fn session_registry(&self, config: &DebateConfig) -> SessionResult<WorkerRegistry> {
        config.validate()?;
        match &config.worker_pool {
            Some(pool) => Ok(self.registry.restrict(pool)?),
            None => Ok(self.registry.clone()),
        }
    }
}

/// Emit the `error` event for a session-level failure and hand it back.
fn fail(emitter: &SessionEmitter, err: SessionError) -> SessionError {
    match &err {
        SessionError::Cancelled => warn!(session_id = emitter.session_id(), "debate cancelled"),
        _ => error!(session_id = emitter.session_id(), error = %err, "debate failed"),
    }
    emitter.emit(DebateEvent::Error {
        message: err.to_string(),
    });
    err
}

/// Mutable state of one running session. Sole writer of both ledgers.
struct SessionRun<'a> {
    session: DebateSession,
    emitter: SessionEmitter,
    dispatcher: Dispatcher,
    registry: WorkerRegistry,
    policy: TerminationPolicy,
    parallel: bool,
    cancel: CancellationToken,
    builder: &'a dyn LedgerBuilder,
    assigner: &'a dyn AssignmentPolicy,
    /// Latest evaluator verdict and the round it was given in.
    verdict: Option<(u32, EvaluatorVerdict)>,
    /// Last round the evaluator was called in, whatever the result.
    evaluated_round: Option<u32>,
}

impl SessionRun<'_> {
    fn checkpoint(&self) -> SessionResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, event: DebateEvent) {
        self.emitter.emit(event);
    }

    fn emit_task_ledger(&self) {
        self.emit(DebateEvent::TaskLedgerUpdate {
            task_ledger: self.session.task_ledger().clone(),
        });
    }

    fn emit_progress_ledger(&self) {
        self.emit(DebateEvent::ProgressLedgerUpdate {
            progress_ledger: self.session.progress_ledger().clone(),
        });
    }

    fn emit_assignment(&self) {
        let assignment = self.session.assignment();
        info!(
            session_id = self.session.id(),
            assigned = ?assignment.assigned_workers,
            "experts assigned"
        );
        self.emit(DebateEvent::ExpertAssignment {
            assigned_experts: assignment.assigned_workers.clone(),
            reasoning: assignment.reasoning.clone(),
        });
    }

    async fn drive(&mut self) -> SessionResult<(TerminationReason, Aggregation)> {
        self.initialize().await?;
        loop {
            let buffer = self.dispatch_round().await?;
            let decision = self.update(buffer).await?;
            match decision {
                RoundDecision::Terminate(reason) => {
                    let aggregation = self.terminate(reason).await?;
                    return Ok((reason, aggregation));
                }
                RoundDecision::Replan => self.replan().await?,
                RoundDecision::Continue => {
                    self.checkpoint()?;
                    self.session.advance_round();
                    self.session
                        .transition(SessionPhase::Assigning, "next round")?;
                }
            }
        }
    }

    /// Initializing: build the ledger and the initial assignment.
    async fn initialize(&mut self) -> SessionResult<()> {
        self.checkpoint()?;
        let draft = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::Cancelled),
            draft = self.builder.build(self.session.problem(), None) => draft,
        };
        self.session.set_task_ledger(draft.into_ledger());
        self.session.task_ledger().validate()?;
        self.emit_task_ledger();

        let assignment = self
            .assigner
            .assign(self.session.problem(), &self.registry, None)
            .filter(|a| !a.assigned_workers.is_empty())
            .ok_or(SessionError::NoWorkers)?;
        self.session.set_assignment(assignment);
        self.emit_assignment();
        self.emit_progress_ledger();

        self.session
            .transition(SessionPhase::Assigning, "ledger built")?;
        Ok(())
    }

    /// Deterministic instruction from the head of the plan.
    fn instruction(&self) -> String {
        let ledger = self.session.task_ledger();
        match ledger.next_step(self.session.progress_ledger().completed_steps()) {
            Some((idx, step)) => {
                format!("Step {}/{}: {}", idx + 1, ledger.task_plan().len(), step)
            }
            None => REVIEW_INSTRUCTION.to_string(),
        }
    }

    /// Assigned workers with their requests, in assignment order.
    fn round_jobs(&self, instruction: &str) -> Vec<(SharedWorker, SolveRequest)> {
        self.session
            .assignment()
            .assigned_workers
            .iter()
            .filter_map(|id| match self.registry.get(id) {
                Some(worker) => Some(worker.clone()),
                None => {
                    warn!(worker = %id, "assigned worker is not registered");
                    None
                }
            })
            .map(|worker| {
                let request = SolveRequest {
                    problem: self.session.problem().clone(),
                    round: self.session.round(),
                    instruction: instruction.to_string(),
                    shared_context: self.session.shared_context_for(worker.id()),
                };
                (worker, request)
            })
            .collect()
    }

    /// Assigning/Dispatching/Collecting for one round. Returns successful
    /// results in assignment order; nothing is committed to the session.
    async fn dispatch_round(&mut self) -> SessionResult<Vec<Dispatched>> {
        self.checkpoint()?;
        let round = self.session.round();
        let instruction = self.instruction();
        let jobs = self.round_jobs(&instruction);
        debug!(
            session_id = self.session.id(),
            round,
            instruction = %instruction,
            "round started"
        );

        let mut buffer: Vec<(usize, Dispatched)> = Vec::with_capacity(jobs.len());

        if self.parallel {
            if let Some((first, _)) = jobs.first() {
                self.session
                    .progress_ledger_mut()
                    .assign_next(first.id(), &instruction)?;
            }
            self.session
                .transition(SessionPhase::Dispatching, "parallel dispatch")?;
            for (worker, _) in &jobs {
                self.emit(DebateEvent::AgentThinking {
                    agent_id: worker.id().to_string(),
                    round,
                });
            }

            let dispatcher = &self.dispatcher;
            let mut pending: FuturesUnordered<_> = jobs
                .iter()
                .enumerate()
                .map(|(idx, (worker, request))| async move {
                    (idx, dispatcher.solve(worker, request).await)
                })
                .collect();
            while let Some((idx, outcome)) = pending.next().await {
                if let Some(dispatched) = self.collect(outcome)? {
                    buffer.push((idx, dispatched));
                }
            }
            drop(pending);

            self.session
                .transition(SessionPhase::Collecting, "all calls returned")?;
        } else {
            for (idx, (worker, request)) in jobs.iter().enumerate() {
                self.checkpoint()?;
                self.session
                    .progress_ledger_mut()
                    .assign_next(worker.id(), &instruction)?;
                self.session
                    .transition(SessionPhase::Dispatching, worker.id())?;
                self.emit(DebateEvent::AgentThinking {
                    agent_id: worker.id().to_string(),
                    round,
                });
                let outcome = self.dispatcher.solve(worker, request).await;
                self.session
                    .transition(SessionPhase::Collecting, worker.id())?;
                if let Some(dispatched) = self.collect(outcome)? {
                    buffer.push((idx, dispatched));
                }
                if idx + 1 < jobs.len() {
                    self.session
                        .transition(SessionPhase::Assigning, "next speaker")?;
                }
            }
            if jobs.is_empty() {
                // Nothing to dispatch; keep the phase sequence intact.
                self.session
                    .transition(SessionPhase::Dispatching, "no registered workers")?;
                self.session
                    .transition(SessionPhase::Collecting, "no registered workers")?;
            }
        }

        self.session
            .transition(SessionPhase::Assigning, "all assigned workers responded")?;
        self.checkpoint()?;
        self.session
            .transition(SessionPhase::Updating, "round collected")?;

        buffer.sort_by_key(|(idx, _)| *idx);
        Ok(buffer.into_iter().map(|(_, d)| d).collect())
    }

    /// Keep a finished call's result for the round. Worker failures are
    /// absorbed; only cancellation unwinds.
    fn collect(&self, outcome: DispatchOutcome) -> SessionResult<Option<Dispatched>> {
        match outcome.result {
            Ok(dispatched) => Ok(Some(dispatched)),
            Err(WorkerError::Cancelled) => Err(SessionError::Cancelled),
            Err(e) => {
                warn!(
                    session_id = self.session.id(),
                    worker = %outcome.worker_id,
                    round = outcome.round,
                    attempts = outcome.attempts,
                    kind = e.kind(),
                    error = %e,
                    "no answer from worker this round"
                );
                Ok(None)
            }
        }
    }

    /// Updating: commit the round, recompute progress, and decide.
    async fn update(&mut self, buffer: Vec<Dispatched>) -> SessionResult<RoundDecision> {
        self.checkpoint()?;
        let round = self.session.round();
        let answered = !buffer.is_empty();
        let mut progress = false;
        let mut ledger_changed = false;

        for dispatched in buffer {
            for fact in &dispatched.resolved_facts {
                match self.session.task_ledger_mut().resolve(fact) {
                    Ok(kind) => {
                        debug!(fact = %fact, kind = ?kind, "fact resolved");
                        progress = true;
                        ledger_changed = true;
                    }
                    Err(LedgerError::UnknownFact(_)) => {
                        debug!(fact = %fact, "ignoring claim for a fact that is not pending");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let response = dispatched.response;
            self.emit(DebateEvent::AgentResponse {
                agent_id: response.worker_id.clone(),
                round: response.round,
                content: response.content.clone(),
                answer: response.answer.clone(),
            });
            self.session.record_response(response);
        }

        if answered {
            let plan_len = self.session.task_ledger().task_plan().len();
            let head = self
                .session
                .task_ledger()
                .next_step(self.session.progress_ledger().completed_steps())
                .map(|(_, step)| step.to_string());
            if let Some(step) = head {
                self.session
                    .progress_ledger_mut()
                    .complete_step(&step, plan_len)?;
                progress = true;
            }
        }

        let stall_count = self.session.progress_ledger_mut().record_round(progress);
        self.session.progress_ledger_mut().clear_next();
        self.validate_ledgers()?;
        if !progress {
            warn!(session_id = self.session.id(), round, stall_count, "no progress this round");
        }

        let plan_complete = self
            .session
            .task_ledger()
            .is_plan_complete(self.session.progress_ledger().completed_steps());
        let mut answers_confirmed = false;
        if plan_complete && !self.session.latest_answers().is_empty() {
            answers_confirmed = self.session.assigned_answers_agree();
            if let Some(verdict) = self.evaluate().await? {
                answers_confirmed |= verdict.consensus;
            }
        }

        let decision = self.policy.decide(RoundSignals {
            round,
            stall_count,
            plan_complete,
            answers_confirmed,
        });
        debug!(session_id = self.session.id(), round, decision = %decision, "round decided");

        if decision == RoundDecision::Terminate(TerminationReason::Consensus) {
            self.session.progress_ledger_mut().mark_complete();
        }
        if ledger_changed {
            self.emit_task_ledger();
        }
        self.emit_progress_ledger();
        self.emit(DebateEvent::RoundComplete { round });

        let next = match decision {
            RoundDecision::Continue => SessionPhase::Continuing,
            RoundDecision::Replan => SessionPhase::Replanning,
            RoundDecision::Terminate(_) => SessionPhase::Terminating,
        };
        self.session.transition(next, &decision.to_string())?;
        Ok(decision)
    }

    fn validate_ledgers(&self) -> SessionResult<()> {
        let task = self.session.task_ledger();
        task.validate()?;
        self.session
            .progress_ledger()
            .validate(task.task_plan().len())?;
        Ok(())
    }

    /// Ask the evaluator (if any) to judge the latest answers. Evaluator
    /// failures leave the session without a verdict for this round.
    async fn evaluate(&mut self) -> SessionResult<Option<EvaluatorVerdict>> {
        let Some(evaluator) = self.registry.evaluator().cloned() else {
            return Ok(None);
        };
        let candidates = self.session.latest_answers();
        if candidates.is_empty() {
            return Ok(None);
        }

        self.checkpoint()?;
        self.evaluated_round = Some(self.session.round());
        self.emit(DebateEvent::EvaluationStart);
        match self
            .dispatcher
            .evaluate(&evaluator, self.session.problem(), &candidates)
            .await
        {
            Ok(verdict) => {
                debug!(
                    evaluator = evaluator.id(),
                    consensus = verdict.consensus,
                    final_answer = ?verdict.final_answer,
                    "evaluator verdict"
                );
                self.verdict = Some((self.session.round(), verdict.clone()));
                Ok(Some(verdict))
            }
            Err(WorkerError::Cancelled) => Err(SessionError::Cancelled),
            Err(e) => {
                warn!(evaluator = evaluator.id(), error = %e, "evaluation failed");
                Ok(None)
            }
        }
    }

    /// Replanning: rebuild the ledger with session context and reassign.
    async fn replan(&mut self) -> SessionResult<()> {
        self.checkpoint()?;
        let progress = self.session.progress_ledger();
        let context = ReplanContext {
            round: self.session.round(),
            stall_count: progress.stall_count(),
            latest_answers: self
                .session
                .latest_answers()
                .into_iter()
                .map(|c| (c.worker_id, c.answer))
                .collect(),
            completed_steps: progress.completed_steps().to_vec(),
        };
        warn!(
            session_id = self.session.id(),
            round = context.round,
            stall_count = context.stall_count,
            "progress stalled, replanning"
        );

        let draft = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::Cancelled),
            draft = self.builder.build(self.session.problem(), Some(&context)) => draft,
        };
        self.session
            .task_ledger_mut()
            .replan(draft, &context.completed_steps)?;
        self.validate_ledgers()?;

        let assignment = self
            .assigner
            .assign(self.session.problem(), &self.registry, Some(&context))
            .filter(|a| !a.assigned_workers.is_empty())
            .ok_or(SessionError::NoWorkers)?;
        self.session.set_assignment(assignment);
        self.emit_assignment();
        self.emit_task_ledger();

        self.session.advance_round();
        self.session
            .transition(SessionPhase::Assigning, "replanned")?;
        Ok(())
    }

    /// Terminating: final evaluation unless the evaluator was already
    /// called this round, then aggregation.
    async fn terminate(&mut self, reason: TerminationReason) -> SessionResult<Aggregation> {
        let round = self.session.round();
        if self.evaluated_round != Some(round) {
            self.evaluate().await?;
        }

        let verdict = self
            .verdict
            .as_ref()
            .filter(|(r, _)| *r == round)
            .map(|(_, v)| v);
        let candidates = self.session.latest_answers();
        let aggregation = Aggregator::new().aggregate(&candidates, verdict)?;
        info!(
            session_id = self.session.id(),
            reason = %reason,
            candidates = candidates.len(),
            source = ?aggregation.source,
            "aggregated final answer"
        );
        Ok(aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::FixedWorker;

    fn registry() -> WorkerRegistry {
        WorkerRegistry::new()
            .with(FixedWorker::answering("geometry", "72").with_caps(&["geometry"]).shared())
            .with(FixedWorker::answering("algebra", "72").with_caps(&["algebra"]).shared())
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Coordinator::new(registry(), DebateConfig::default().with_max_rounds(0))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::ZeroRounds);

        let err = Coordinator::new(registry(), DebateConfig::default().with_worker_pool(["nope"]))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::UnknownWorker("nope".into()));
    }

    #[tokio::test]
    async fn test_unanimous_single_step_session() {
        let coordinator = Coordinator::new(registry(), DebateConfig::default()).unwrap();
        let outcome = coordinator
            .run(
                Problem::new("What is the area of a 6 by 12 rectangle in square units?"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.final_answer, "72");
        assert_eq!(outcome.session.final_answer(), Some("72"));
        assert_eq!(outcome.session.phase(), SessionPhase::Terminating);
    }

    #[tokio::test]
    async fn test_progress_invariant_holds_on_consensus() {
        let coordinator = Coordinator::new(registry(), DebateConfig::default().with_max_rounds(10))
            .unwrap();
        let outcome = coordinator
            .run(Problem::new("hello"), CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_consensus());
        let progress = outcome.session.progress_ledger();
        assert!(progress.task_complete());
        assert!(progress.next_speaker().is_none());
        assert!(outcome.summary_line().starts_with("[consensus] answer=72"));
    }

    #[tokio::test]
    async fn test_request_configuration_overrides() {
        let coordinator = Coordinator::new(registry(), DebateConfig::default()).unwrap();
        let request = SolveProblemRequest {
            question: "hello".into(),
            configuration: Some(DebateConfig::default().with_worker_pool(["algebra"])),
        };
        let outcome = coordinator
            .solve(&request, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.session.assignment().assigned_workers, vec!["algebra"]);
    }

    #[tokio::test]
    async fn test_request_event_capacity_keeps_coordinator_bus() {
        let coordinator = Coordinator::new(registry(), DebateConfig::default()).unwrap();
        let mut live = coordinator.event_bus().subscribe();
        let mut tuning = DebateConfig::default();
        tuning.event_capacity = 1;
        let request = SolveProblemRequest {
            question: "hello".into(),
            configuration: Some(tuning),
        };
        coordinator
            .solve(&request, CancellationToken::new())
            .await
            .unwrap();

        let history = coordinator.event_bus().history();
        assert!(history.len() > 1);
        for expected in &history {
            assert_eq!(&live.try_recv().unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let coordinator = Coordinator::new(registry(), DebateConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = coordinator
            .run(Problem::new("hello"), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));

        let history = coordinator.event_bus().history();
        let types: Vec<&str> = history.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["debate_start", "error"]);
    }
}
