//! Answer aggregation: evaluator override, then majority vote.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AggregationError;
use crate::worker::{normalize_answer, Candidate, EvaluatorVerdict};

/// How the final answer was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AnswerSource {
    /// The evaluator named the answer explicitly.
    Evaluator,
    /// Most frequent latest answer.
    Majority { votes: usize, total: usize },
}

/// Result of aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub final_answer: String,
    pub source: AnswerSource,
}

impl Aggregation {
    /// Whether every candidate voted for the winning answer.
    pub fn is_unanimous(&self) -> bool {
        matches!(self.source, AnswerSource::Majority { votes, total } if votes == total)
    }
}

/// Reduces the latest answer per worker to one final answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate `candidates`, which must be ordered by assignment order
    /// with at most one entry per worker.
    ///
    /// An explicit evaluator answer wins outright. Otherwise the most
    /// frequent answer wins and ties go to the answer whose first supporter
    /// was assigned earliest.
    pub fn aggregate(
        &self,
        candidates: &[Candidate],
        verdict: Option<&EvaluatorVerdict>,
    ) -> Result<Aggregation, AggregationError> {
        if let Some(answer) = verdict
            .and_then(|v| v.final_answer.as_deref())
            .and_then(normalize_answer)
        {
            debug!(answer = %answer, "evaluator answer overrides vote");
            return Ok(Aggregation {
                final_answer: answer,
                source: AnswerSource::Evaluator,
            });
        }

        // (answer, votes) in order of first appearance.
        let mut tally: Vec<(String, usize)> = Vec::new();
        for candidate in candidates {
            let Some(answer) = normalize_answer(&candidate.answer) else {
                continue;
            };
            match tally.iter_mut().find(|(a, _)| *a == answer) {
                Some((_, votes)) => *votes += 1,
                None => tally.push((answer, 1)),
            }
        }

        let total: usize = tally.iter().map(|(_, v)| v).sum();
        let winner = tally
            .into_iter()
            .fold(None::<(String, usize)>, |best, (answer, votes)| match best {
                Some((_, best_votes)) if best_votes >= votes => best,
                _ => Some((answer, votes)),
            });

        match winner {
            Some((final_answer, votes)) => Ok(Aggregation {
                final_answer,
                source: AnswerSource::Majority { votes, total },
            }),
            None => Err(AggregationError::Inconclusive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(pairs: &[(&str, &str)]) -> Vec<Candidate> {
        pairs.iter().map(|(w, a)| Candidate::new(*w, *a)).collect()
    }

    fn verdict(answer: Option<&str>) -> EvaluatorVerdict {
        EvaluatorVerdict {
            consensus: true,
            final_answer: answer.map(str::to_string),
            rationale: String::new(),
        }
    }

    #[test]
    fn test_unanimous_answer() {
        let result = Aggregator::new()
            .aggregate(&candidates(&[("x", "72"), ("y", "72")]), None)
            .unwrap();
        assert_eq!(result.final_answer, "72");
        assert!(result.is_unanimous());
    }

    #[test]
    fn test_tie_goes_to_first_assigned() {
        let agg = Aggregator::new();
        let xy = agg
            .aggregate(&candidates(&[("x", "72"), ("y", "70")]), None)
            .unwrap();
        assert_eq!(xy.final_answer, "72");

        let yx = agg
            .aggregate(&candidates(&[("y", "70"), ("x", "72")]), None)
            .unwrap();
        assert_eq!(yx.final_answer, "70");
    }

    #[test]
    fn test_majority_beats_order() {
        let result = Aggregator::new()
            .aggregate(&candidates(&[("a", "70"), ("b", "72"), ("c", "72.0")]), None)
            .unwrap();
        assert_eq!(result.final_answer, "72");
        assert_eq!(result.source, AnswerSource::Majority { votes: 2, total: 3 });
        assert!(!result.is_unanimous());
    }

    #[test]
    fn test_evaluator_answer_wins_outright() {
        let result = Aggregator::new()
            .aggregate(
                &candidates(&[("a", "70"), ("b", "70")]),
                Some(&verdict(Some("72"))),
            )
            .unwrap();
        assert_eq!(result.final_answer, "72");
        assert_eq!(result.source, AnswerSource::Evaluator);
    }

    #[test]
    fn test_verdict_without_answer_falls_back_to_vote() {
        let result = Aggregator::new()
            .aggregate(&candidates(&[("a", "70")]), Some(&verdict(None)))
            .unwrap();
        assert_eq!(result.final_answer, "70");
    }

    #[test]
    fn test_no_candidates_is_inconclusive() {
        let err = Aggregator::new().aggregate(&[], None).unwrap_err();
        assert_eq!(err, AggregationError::Inconclusive);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let input = candidates(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "2"), ("e", "1")]);
        let agg = Aggregator::new();
        let first = agg.aggregate(&input, None).unwrap();
        for _ in 0..10 {
            assert_eq!(agg.aggregate(&input, None).unwrap(), first);
        }
        assert_eq!(first.final_answer, "1");
    }
}
