//! Deterministic workers for the offline demo and for tests.
//!
//! A [`ScriptedWorker`] replays one canned answer per round (the last one
//! repeats), optionally after a simulated delay. Failure modes cover the two
//! per-worker errors the coordinator absorbs: time-outs and malformed output.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use debate_coordination::{
    Candidate, EvaluatorVerdict, Problem, SolveRequest, Worker, WorkerError, WorkerReply,
};

use crate::config::{WorkerRole, WorkerSpec};

/// How a scripted worker misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptMode {
    #[default]
    Answer,
    /// Never returns within any realistic time budget.
    AlwaysTimeout,
    /// Returns text without an `{{answer}}`.
    AlwaysMalformed,
}

pub struct ScriptedWorker {
    id: String,
    capabilities: Vec<String>,
    generalist: bool,
    answers: Vec<String>,
    delay: Duration,
    mode: ScriptMode,
    calls: AtomicU32,
}

impl ScriptedWorker {
    pub fn new<I, S>(id: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            capabilities: Vec::new(),
            generalist: false,
            answers: answers.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
            mode: ScriptMode::Answer,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_capabilities(mut self, caps: &[&str]) -> Self {
        self.capabilities = caps.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn generalist(mut self) -> Self {
        self.generalist = true;
        self
    }

    /// Simulated thinking time before each reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_mode(mut self, mode: ScriptMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of `solve` calls received so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer_for(&self, round: u32) -> Option<&str> {
        let last = self.answers.len().checked_sub(1)?;
        self.answers
            .get((round as usize).min(last))
            .map(String::as_str)
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn is_generalist(&self) -> bool {
        self.generalist
    }

    async fn solve(&self, request: &SolveRequest) -> Result<WorkerReply, WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(worker = %self.id, round = request.round, mode = ?self.mode, "scripted solve");

        match self.mode {
            ScriptMode::AlwaysTimeout => std::future::pending().await,
            ScriptMode::AlwaysMalformed => {
                tokio::time::sleep(self.delay).await;
                Ok(WorkerReply::text("I could not settle on a number this time."))
            }
            ScriptMode::Answer => {
                tokio::time::sleep(self.delay).await;
                let answer = self
                    .answer_for(request.round)
                    .ok_or_else(|| WorkerError::Failed(format!("{} has no script", self.id)))?;
                let content = if request.shared_context.is_empty() {
                    format!("Working from the problem statement, the answer is {{{{{}}}}}.", answer)
                } else {
                    format!(
                        "After reviewing {} peer solution(s), the answer is {{{{{}}}}}.",
                        request.shared_context.len(),
                        answer
                    )
                };
                Ok(WorkerReply::text(content))
            }
        }
    }
}

/// Evaluator that confirms consensus whenever the candidates agree and,
/// optionally, always names a fixed answer.
#[derive(Default)]
pub struct ScriptedEvaluator {
    id: String,
    answer: Option<String>,
}

impl ScriptedEvaluator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            answer: None,
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }
}

#[async_trait]
impl Worker for ScriptedEvaluator {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[String] {
        &[]
    }

    fn can_solve(&self) -> bool {
        false
    }

    fn can_evaluate(&self) -> bool {
        true
    }

    async fn solve(&self, _request: &SolveRequest) -> Result<WorkerReply, WorkerError> {
        Err(WorkerError::Unsupported(self.id.clone()))
    }

    async fn evaluate(
        &self,
        _problem: &Problem,
        candidates: &[Candidate],
    ) -> Result<EvaluatorVerdict, WorkerError> {
        let agree = candidates
            .first()
            .is_some_and(|first| candidates.iter().all(|c| c.answer == first.answer));
        Ok(EvaluatorVerdict {
            consensus: agree,
            final_answer: self.answer.clone(),
            rationale: if agree {
                "all candidates agree".to_string()
            } else {
                format!("{} candidates disagree", candidates.len())
            },
        })
    }
}

/// Canned answer for the demo questions.
pub fn demo_answer(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("6 times 12") || q.contains("6 by 12") {
        "72"
    } else if q.contains("square") || q.contains("正方形") {
        "36"
    } else {
        "42"
    }
}

fn outlier(answer: &str) -> String {
    match answer.parse::<i64>() {
        Ok(n) => (n - 2).to_string(),
        Err(_) => "0".to_string(),
    }
}

/// Build the scripted panel for a roster. Every solver answers
/// [`demo_answer`]; the first one gives an outlier in round 0.
pub fn scripted_roster(
    roster: &[WorkerSpec],
    question: &str,
    delay: Duration,
) -> Vec<debate_coordination::SharedWorker> {
    let answer = demo_answer(question);
    let mut first_solver = true;
    roster
        .iter()
        .map(|spec| -> debate_coordination::SharedWorker {
            match spec.role {
                WorkerRole::Evaluator => std::sync::Arc::new(ScriptedEvaluator::new(&spec.id)),
                role => {
                    let mut script = vec![answer.to_string()];
                    if first_solver && roster.len() > 1 {
                        script.insert(0, outlier(answer));
                    }
                    first_solver = false;
                    let caps: Vec<&str> = spec.capabilities.iter().map(String::as_str).collect();
                    let mut worker = ScriptedWorker::new(&spec.id, script)
                        .with_capabilities(&caps)
                        .with_delay(delay);
                    if role == WorkerRole::Generalist {
                        worker = worker.generalist();
                    }
                    std::sync::Arc::new(worker)
                }
            }
        })
        .collect()
}
