//! Expert assignment
//!
//! Picks the solving workers for a problem from their capability tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::debate::state::{ExpertAssignment, Problem};
use crate::ledger::ReplanContext;
use crate::worker::WorkerRegistry;

/// Selects `assigned_workers` for a session.
///
/// Returns `None` only when the registry has no solving worker at all.
pub trait AssignmentPolicy: Send + Sync {
    fn assign(
        &self,
        problem: &Problem,
        registry: &WorkerRegistry,
        replan: Option<&ReplanContext>,
    ) -> Option<ExpertAssignment>;
}

/// Capability tag → trigger keywords.
const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    (
        "geometry",
        &[
            "area", "square", "triangle", "circle", "radius", "angle", "perimeter", "面積",
            "正方形", "三角形", "円",
        ],
    ),
    (
        "algebra",
        &[
            "equation", "solve", "variable", "ratio", "percent", "times", "倍", "方程式",
            "割合",
        ],
    ),
];

/// Keyword-matching assignment policy.
///
/// A solver is assigned when any of its capability tags has a keyword
/// occurring in the problem. With no match the first generalist (or, if
/// none is registered, the first solver) is assigned. On re-plan the
/// generalist joins the matched experts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordAssignmentPolicy {
    catalog: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordAssignmentPolicy {
    fn default() -> Self {
        let catalog = DEFAULT_CATALOG
            .iter()
            .map(|(cap, words)| {
                (
                    cap.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();
        Self { catalog }
    }
}

impl KeywordAssignmentPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or extend the keywords of a capability tag.
    pub fn with_keywords<I, S>(mut self, capability: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog
            .entry(capability.to_string())
            .or_default()
            .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    /// Keywords of `capability` found in `text`.
    fn hits<'a>(&'a self, capability: &str, text: &str) -> Vec<&'a str> {
        self.catalog
            .get(capability)
            .map(|words| {
                words
                    .iter()
                    .filter(|w| text.contains(w.as_str()))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl AssignmentPolicy for KeywordAssignmentPolicy {
    fn assign(
        &self,
        problem: &Problem,
        registry: &WorkerRegistry,
        replan: Option<&ReplanContext>,
    ) -> Option<ExpertAssignment> {
        let text = problem.statement().to_lowercase();
        let mut assigned = Vec::new();
        let mut reasons = Vec::new();

        for worker in registry.solvers() {
            let mut matched: Vec<&str> = Vec::new();
            for cap in worker.capabilities() {
                matched.extend(self.hits(cap, &text));
            }
            if !matched.is_empty() {
                reasons.push(format!("{} matched [{}]", worker.id(), matched.join(", ")));
                assigned.push(worker.id().to_string());
            }
        }

        let fallback = registry
            .solvers()
            .find(|w| w.is_generalist())
            .or_else(|| registry.solvers().next())?;

        if assigned.is_empty() {
            reasons.push(format!(
                "no capability matched; falling back to {}",
                fallback.id()
            ));
            assigned.push(fallback.id().to_string());
        } else if let Some(ctx) = replan {
            if fallback.is_generalist() && !assigned.iter().any(|id| id == fallback.id()) {
                reasons.push(format!(
                    "replan after round {}: adding generalist {}",
                    ctx.round,
                    fallback.id()
                ));
                assigned.push(fallback.id().to_string());
            }
        }

        debug!(assigned = ?assigned, "expert assignment computed");
        Some(ExpertAssignment::new(assigned, reasons.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::FixedWorker;

    fn registry() -> WorkerRegistry {
        WorkerRegistry::new()
            .with(FixedWorker::answering("geometry", "1").with_caps(&["geometry"]).shared())
            .with(FixedWorker::answering("algebra", "1").with_caps(&["algebra"]).shared())
            .with(FixedWorker::answering("generalist", "1").generalist().shared())
            .with(FixedWorker::answering("judge", "1").evaluator().shared())
    }

    #[test]
    fn test_geometry_problem() {
        let problem = Problem::new("A square has an area of 36. What is its perimeter?");
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&problem, &registry(), None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["geometry"]);
        assert!(assignment.reasoning.contains("area"));
    }

    #[test]
    fn test_mixed_problem_keeps_registration_order() {
        let problem = Problem::new("The ratio of the square's side to 3 is 2. Find its area.");
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&problem, &registry(), None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["geometry", "algebra"]);
    }

    #[test]
    fn test_japanese_keywords() {
        let problem = Problem::new("正方形の面積は36です。一辺は何ですか？");
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&problem, &registry(), None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["geometry"]);
    }

    #[test]
    fn test_fallback_to_generalist() {
        let problem = Problem::new("Who wrote Hamlet?");
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&problem, &registry(), None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["generalist"]);
    }

    #[test]
    fn test_fallback_to_first_solver_without_generalist() {
        let registry = WorkerRegistry::new()
            .with(FixedWorker::answering("judge", "1").evaluator().shared())
            .with(FixedWorker::answering("a", "1").shared())
            .with(FixedWorker::answering("b", "1").shared());
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&Problem::new("hello"), &registry, None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["a"]);
    }

    #[test]
    fn test_evaluator_only_registry_has_no_assignment() {
        let registry =
            WorkerRegistry::new().with(FixedWorker::answering("judge", "1").evaluator().shared());
        assert!(KeywordAssignmentPolicy::new()
            .assign(&Problem::new("area"), &registry, None)
            .is_none());
    }

    #[test]
    fn test_replan_adds_generalist() {
        let problem = Problem::new("What is the area of a circle of radius 2?");
        let ctx = ReplanContext {
            round: 1,
            ..Default::default()
        };
        let assignment = KeywordAssignmentPolicy::new()
            .assign(&problem, &registry(), Some(&ctx))
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["geometry", "generalist"]);
    }

    #[test]
    fn test_custom_keywords() {
        let policy = KeywordAssignmentPolicy::new().with_keywords("algebra", ["Polynomial"]);
        let assignment = policy
            .assign(&Problem::new("Factor the polynomial x^2-1"), &registry(), None)
            .unwrap();
        assert_eq!(assignment.assigned_workers, vec!["algebra"]);
    }
}
