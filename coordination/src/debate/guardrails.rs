//! Termination and re-plan guardrails, evaluated once per round after the
//! ledgers are updated.

use serde::{Deserialize, Serialize};

use crate::config::DebateConfig;

/// Stall count at which (and at every further multiple of which) a re-plan
/// is attempted.
pub const REPLAN_STALL_INTERVAL: u32 = 2;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Plan complete and the answers were confirmed.
    Consensus,
    /// Stall budget exceeded; best-effort answer.
    StallExhausted,
    /// Round budget used up; best-effort answer.
    MaxRounds,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::StallExhausted => write!(f, "stall_exhausted"),
            Self::MaxRounds => write!(f, "max_rounds"),
        }
    }
}

/// What the coordinator does after updating a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundDecision {
    Continue,
    Replan,
    Terminate(TerminationReason),
}

impl RoundDecision {
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Terminate(_))
    }
}

impl std::fmt::Display for RoundDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Replan => write!(f, "replan"),
            Self::Terminate(reason) => write!(f, "terminate ({})", reason),
        }
    }
}

/// State of the session at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSignals {
    /// Round that just finished (0-based).
    pub round: u32,
    pub stall_count: u32,
    /// Every plan step has a completion record.
    pub plan_complete: bool,
    /// Evaluator confirmed consensus, or all assigned workers agree.
    pub answers_confirmed: bool,
}

/// Round and stall budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationPolicy {
    pub max_rounds: u32,
    pub max_stall: u32,
}

impl TerminationPolicy {
    pub fn new(max_rounds: u32, max_stall: u32) -> Self {
        Self {
            max_rounds,
            max_stall,
        }
    }

    pub fn from_config(config: &DebateConfig) -> Self {
        Self::new(config.max_rounds, config.max_stall)
    }

    /// Decide the next step. Checks run in order: success, stall budget,
    /// round budget, re-plan.
    pub fn decide(&self, signals: RoundSignals) -> RoundDecision {
        if signals.plan_complete && signals.answers_confirmed {
            return RoundDecision::Terminate(TerminationReason::Consensus);
        }
        if signals.stall_count > self.max_stall {
            return RoundDecision::Terminate(TerminationReason::StallExhausted);
        }
        if signals.round + 1 >= self.max_rounds {
            return RoundDecision::Terminate(TerminationReason::MaxRounds);
        }
        if signals.stall_count >= REPLAN_STALL_INTERVAL
            && signals.stall_count % REPLAN_STALL_INTERVAL == 0
        {
            return RoundDecision::Replan;
        }
        RoundDecision::Continue
    }
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::from_config(&DebateConfig::default())
    }
}
