//! Task ledger: what is known, what is missing, and the plan.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Plan step used when nothing better can be derived from the problem.
pub const FALLBACK_STEP: &str = "solve directly";

/// Unvalidated ledger contents produced by a [`super::LedgerBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDraft {
    pub given_facts: Vec<String>,
    pub facts_to_lookup: Vec<String>,
    pub facts_to_derive: Vec<String>,
    pub educated_guesses: Vec<String>,
    pub task_plan: Vec<String>,
}

impl LedgerDraft {
    /// Turn the draft into a ledger, substituting the fallback plan when the
    /// draft has no usable steps.
    pub fn into_ledger(self) -> TaskLedger {
        let mut task_plan = clean(self.task_plan);
        if task_plan.is_empty() {
            task_plan.push(FALLBACK_STEP.to_string());
        }
        TaskLedger {
            given_facts: clean(self.given_facts),
            facts_to_lookup: clean(self.facts_to_lookup),
            facts_to_derive: clean(self.facts_to_derive),
            educated_guesses: clean(self.educated_guesses),
            task_plan,
        }
    }
}

/// Structured record of the problem's facts and plan.
///
/// Fields are only reachable through the update operations below:
/// `given_facts` is append-only, pending facts only shrink through
/// `resolve`, and the plan only changes through `replan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLedger {
    given_facts: Vec<String>,
    facts_to_lookup: Vec<String>,
    facts_to_derive: Vec<String>,
    educated_guesses: Vec<String>,
    task_plan: Vec<String>,
}

/// Which pending list a resolved fact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Lookup,
    Derivation,
}

impl TaskLedger {
    pub fn given_facts(&self) -> &[String] {
        &self.given_facts
    }

    pub fn facts_to_lookup(&self) -> &[String] {
        &self.facts_to_lookup
    }

    pub fn facts_to_derive(&self) -> &[String] {
        &self.facts_to_derive
    }

    pub fn educated_guesses(&self) -> &[String] {
        &self.educated_guesses
    }

    pub fn task_plan(&self) -> &[String] {
        &self.task_plan
    }

    /// Number of facts still to be looked up or derived.
    pub fn pending_facts(&self) -> usize {
        self.facts_to_lookup.len() + self.facts_to_derive.len()
    }

    /// Append a given fact. Duplicates are ignored; returns whether it was new.
    pub fn add_given_fact(&mut self, fact: &str) -> bool {
        let fact = fact.trim();
        if fact.is_empty() || find(&self.given_facts, fact).is_some() {
            return false;
        }
        self.given_facts.push(fact.to_string());
        true
    }

    /// Mark a pending fact as resolved and record it as given.
    ///
    /// Matching is whitespace- and case-insensitive. Lookups are checked
    /// before derivations.
    pub fn resolve(&mut self, fact: &str) -> Result<FactKind, LedgerError> {
        let (kind, removed) = if let Some(idx) = find(&self.facts_to_lookup, fact) {
            (FactKind::Lookup, self.facts_to_lookup.remove(idx))
        } else if let Some(idx) = find(&self.facts_to_derive, fact) {
            (FactKind::Derivation, self.facts_to_derive.remove(idx))
        } else {
            return Err(LedgerError::UnknownFact(fact.to_string()));
        };
        self.add_given_fact(&removed);
        Ok(kind)
    }

    /// Replace the working assumptions.
    pub fn revise_guesses(&mut self, guesses: Vec<String>) {
        self.educated_guesses = clean(guesses);
    }

    /// Merge a freshly built draft into this ledger.
    ///
    /// Given facts are appended, pending facts are replaced by the draft's
    /// (minus anything already given), and the plan becomes the completed
    /// prefix followed by every draft step not yet completed.
    pub fn replan(&mut self, draft: LedgerDraft, completed: &[String]) -> Result<(), LedgerError> {
        for step in completed {
            if find(&self.task_plan, step).is_none() {
                return Err(LedgerError::UnknownStep(step.clone()));
            }
        }

        let draft = draft.into_ledger();
        for fact in &draft.given_facts {
            self.add_given_fact(fact);
        }
        let given = self.given_facts.clone();
        let not_given = |facts: Vec<String>| -> Vec<String> {
            facts
                .into_iter()
                .filter(|f| find(&given, f).is_none())
                .collect()
        };
        self.facts_to_lookup = not_given(draft.facts_to_lookup);
        self.facts_to_derive = not_given(draft.facts_to_derive);
        if !draft.educated_guesses.is_empty() {
            self.educated_guesses = draft.educated_guesses;
        }

        let mut plan: Vec<String> = completed.to_vec();
        for step in draft.task_plan {
            if find(&plan, &step).is_none() {
                plan.push(step);
            }
        }
        if plan.is_empty() {
            return Err(LedgerError::EmptyPlan);
        }
        self.task_plan = plan;
        Ok(())
    }

    /// First plan step not present in `completed`, with its index.
    pub fn next_step<'a>(&'a self, completed: &[String]) -> Option<(usize, &'a str)> {
        self.task_plan
            .iter()
            .enumerate()
            .find(|(_, step)| find(completed, step).is_none())
            .map(|(idx, step)| (idx, step.as_str()))
    }

    /// Whether every plan step has a completion record.
    pub fn is_plan_complete(&self, completed: &[String]) -> bool {
        self.next_step(completed).is_none()
    }

    /// Structural self-check.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.task_plan.is_empty() {
            return Err(LedgerError::EmptyPlan);
        }
        Ok(())
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn find(list: &[String], item: &str) -> Option<usize> {
    let needle = normalize(item);
    list.iter().position(|entry| normalize(entry) == needle)
}

fn clean(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && find(&out, item).is_none() {
            out.push(item.to_string());
        }
    }
    out
}
