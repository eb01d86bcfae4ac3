//! Task ledger construction from the problem text.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::task::LedgerDraft;
use crate::debate::state::Problem;

/// Session state handed to the builder when re-planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanContext {
    /// Round that just finished.
    pub round: u32,
    /// Stall counter at the time of the re-plan.
    pub stall_count: u32,
    /// Latest answer per worker, in assignment order.
    pub latest_answers: Vec<(String, String)>,
    /// Plan steps already completed.
    pub completed_steps: Vec<String>,
}

/// Builds the initial ledger and rebuilds it on explicit re-plan.
///
/// Implementations must be deterministic for a given problem and context
/// and must not touch anything beyond the returned draft.
#[async_trait]
pub trait LedgerBuilder: Send + Sync {
    async fn build(&self, problem: &Problem, context: Option<&ReplanContext>) -> LedgerDraft;
}

/// Constants a problem may reference without stating their value.
const KNOWN_CONSTANTS: &[(&str, &str)] = &[
    ("π", "value of π"),
    (" pi ", "value of π"),
    ("円周率", "value of π"),
    ("speed of light", "speed of light"),
    ("gravitational acceleration", "gravitational acceleration"),
];

const QUESTION_OPENERS: &[&str] = &[
    "what", "how", "find", "calculate", "compute", "determine", "which",
];

/// Lexical ledger builder; makes no worker calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicLedgerBuilder;

impl HeuristicLedgerBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a draft synchronously.
    ///
    /// The coordinator completes one plan step per answered round, so the
    /// initial plan is capped at three steps: gathering inputs (stated
    /// quantities and constants share one step), derivation, verification.
    pub fn draft(&self, problem: &Problem, context: Option<&ReplanContext>) -> LedgerDraft {
        let sentences = split_sentences(problem.statement());

        let mut draft = LedgerDraft::default();
        let mut questions = Vec::new();
        for sentence in &sentences {
            if is_question(sentence) {
                questions.push(sentence.clone());
            } else if sentence.chars().any(is_digit) {
                draft.given_facts.push(sentence.clone());
            }
        }

        let padded = format!(" {} ", problem.statement().to_lowercase());
        for (needle, fact) in KNOWN_CONSTANTS {
            if padded.contains(needle) && !draft.facts_to_lookup.iter().any(|f| f == fact) {
                draft.facts_to_lookup.push(fact.to_string());
            }
        }
        for question in &questions {
            draft.facts_to_derive.push(format!("answer to: {}", question));
        }

        let lookups = draft.facts_to_lookup.join(", ");
        match (draft.given_facts.is_empty(), lookups.is_empty()) {
            (false, true) => draft
                .task_plan
                .push("Extract the quantities stated in the problem".to_string()),
            (false, false) => draft.task_plan.push(format!(
                "Extract the quantities stated in the problem and look up the {}",
                lookups
            )),
            (true, false) => draft.task_plan.push(format!("Look up the {}", lookups)),
            (true, true) => {}
        }
        if !questions.is_empty() {
            draft
                .task_plan
                .push("Derive the requested quantity".to_string());
            draft
                .task_plan
                .push("Verify the result against the given facts".to_string());
        }

        if let Some(ctx) = context {
            self.amend_for_replan(&mut draft, ctx);
        }
        draft
    }

    fn amend_for_replan(&self, draft: &mut LedgerDraft, ctx: &ReplanContext) {
        let mut support: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (worker, answer) in &ctx.latest_answers {
            support
                .entry(answer.as_str())
                .or_default()
                .push(worker.as_str());
        }

        draft.educated_guesses = support
            .iter()
            .map(|(answer, workers)| {
                format!("candidate {} (supported by {})", answer, workers.join(", "))
            })
            .collect();

        let step = match support.len() {
            0 => format!(
                "Produce a well-formed answer of the form {{{{answer}}}} (replan after round {})",
                ctx.round
            ),
            1 => format!(
                "Independently re-verify the candidate answer (replan after round {})",
                ctx.round
            ),
            _ => format!(
                "Reconcile divergent answers {} (replan after round {})",
                support.keys().copied().collect::<Vec<_>>().join(" vs "),
                ctx.round
            ),
        };
        draft.task_plan.push(step);
    }
}

#[async_trait]
impl LedgerBuilder for HeuristicLedgerBuilder {
    async fn build(&self, problem: &Problem, context: Option<&ReplanContext>) -> LedgerDraft {
        self.draft(problem, context)
    }
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

fn is_question(sentence: &str) -> bool {
    let trimmed = sentence.trim_end();
    if trimmed.ends_with('?') || trimmed.ends_with('？') || trimmed.ends_with('か') {
        return true;
    }
    let lower = trimmed.to_lowercase();
    QUESTION_OPENERS
        .iter()
        .any(|opener| lower.starts_with(opener))
}

/// Split on sentence terminators, keeping the terminator. A period only
/// ends a sentence when followed by whitespace or end of input, so decimal
/// numbers stay intact.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        let ends = match c {
            '。' | '?' | '？' | '!' | '！' => true,
            '.' => chars.get(i + 1).map_or(true, |next| next.is_whitespace()),
            _ => false,
        };
        if ends {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}
