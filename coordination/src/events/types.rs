//! Event types for debate sessions
//!
//! These events form the observer-facing trace of a session and are kept
//! in the bus history for late-subscriber replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{ProgressLedger, TaskLedger};

/// All debate session events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    /// Session created, ledger building begins
    DebateStart { question: String },

    /// A solve call was issued to a worker
    AgentThinking { agent_id: String, round: u32 },

    /// A worker result was recorded
    AgentResponse {
        agent_id: String,
        round: u32,
        content: String,
        answer: String,
    },

    /// Initial or re-plan assignment computed
    ExpertAssignment {
        assigned_experts: Vec<String>,
        reasoning: String,
    },

    /// Task ledger mutated
    TaskLedgerUpdate { task_ledger: TaskLedger },

    /// Progress ledger recomputed
    ProgressLedgerUpdate { progress_ledger: ProgressLedger },

    /// Evaluator dispatch issued
    EvaluationStart,

    /// A round finished updating
    RoundComplete { round: u32 },

    /// Session terminated with an answer
    DebateEnd { final_answer: String },

    /// Fatal or surfaced failure
    Error { message: String },
}

impl DebateEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DebateEvent::DebateStart { .. } => "debate_start",
            DebateEvent::AgentThinking { .. } => "agent_thinking",
            DebateEvent::AgentResponse { .. } => "agent_response",
            DebateEvent::ExpertAssignment { .. } => "expert_assignment",
            DebateEvent::TaskLedgerUpdate { .. } => "task_ledger_update",
            DebateEvent::ProgressLedgerUpdate { .. } => "progress_ledger_update",
            DebateEvent::EvaluationStart => "evaluation_start",
            DebateEvent::RoundComplete { .. } => "round_complete",
            DebateEvent::DebateEnd { .. } => "debate_end",
            DebateEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the session's stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, DebateEvent::DebateEnd { .. } | DebateEvent::Error { .. })
    }

    /// Worker id, for per-worker events
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            DebateEvent::AgentThinking { agent_id, .. }
            | DebateEvent::AgentResponse { agent_id, .. } => Some(agent_id),
            _ => None,
        }
    }
}

/// An event as delivered to observers.
///
/// `seq` counts from 0 within a debate; `timestamp` is strictly increasing
/// across the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub seq: u64,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DebateEvent,
}

impl EventEnvelope {
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_matches_serde_tag() {
        let events = vec![
            DebateEvent::DebateStart {
                question: "q".into(),
            },
            DebateEvent::AgentThinking {
                agent_id: "a".into(),
                round: 0,
            },
            DebateEvent::EvaluationStart,
            DebateEvent::RoundComplete { round: 1 },
            DebateEvent::DebateEnd {
                final_answer: "72".into(),
            },
            DebateEvent::Error {
                message: "boom".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn test_envelope_flattens_event_fields() {
        let envelope = EventEnvelope {
            seq: 3,
            session_id: "s-1".into(),
            timestamp: Utc::now(),
            event: DebateEvent::AgentResponse {
                agent_id: "algebra".into(),
                round: 0,
                content: "It is {{72}}".into(),
                answer: "72".into(),
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "agent_response");
        assert_eq!(json["agent_id"], "algebra");
        assert_eq!(json["answer"], "72");
        assert_eq!(json["seq"], 3);

        let back: EventEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_ledger_snapshot_event() {
        let event = DebateEvent::ProgressLedgerUpdate {
            progress_ledger: ProgressLedger::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["progress_ledger"]["stall_count"], 0);
        assert_eq!(json["progress_ledger"]["task_complete"], false);
    }

    #[test]
    fn test_terminal_events() {
        assert!(DebateEvent::DebateEnd {
            final_answer: "1".into()
        }
        .is_terminal());
        assert!(!DebateEvent::EvaluationStart.is_terminal());
    }
}
