//! Progress ledger: run-time status recomputed every round.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Run-time status of a debate session.
///
/// Invariants enforced here:
/// - `task_complete` implies no `next_speaker`.
/// - `stall_count` grows by one per no-progress round and resets to zero
///   on the first progress round.
/// - `completed_steps` is append-only and never longer than the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    task_complete: bool,
    progress_being_made: bool,
    stall_count: u32,
    next_speaker: Option<String>,
    next_speaker_instruction: Option<String>,
    completed_steps: Vec<String>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_complete(&self) -> bool {
        self.task_complete
    }

    pub fn progress_being_made(&self) -> bool {
        self.progress_being_made
    }

    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    pub fn next_speaker(&self) -> Option<&str> {
        self.next_speaker.as_deref()
    }

    pub fn next_speaker_instruction(&self) -> Option<&str> {
        self.next_speaker_instruction.as_deref()
    }

    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Record the progress verdict of a finished round and update the
    /// stall counter accordingly. Returns the new stall count.
    pub fn record_round(&mut self, progress: bool) -> u32 {
        self.progress_being_made = progress;
        if progress {
            self.stall_count = 0;
        } else {
            self.stall_count = self.stall_count.saturating_add(1);
        }
        self.stall_count
    }

    /// Append a completed plan step.
    pub fn complete_step(&mut self, step: &str, plan_len: usize) -> Result<(), LedgerError> {
        if self.completed_steps.iter().any(|s| s == step) {
            return Err(LedgerError::StepAlreadyCompleted(step.to_string()));
        }
        if self.completed_steps.len() >= plan_len {
            return Err(LedgerError::CompletedOverflow {
                completed: self.completed_steps.len() + 1,
                planned: plan_len,
            });
        }
        self.completed_steps.push(step.to_string());
        Ok(())
    }

    /// Name the worker expected to act next.
    pub fn assign_next(&mut self, speaker: &str, instruction: &str) -> Result<(), LedgerError> {
        if self.task_complete {
            return Err(LedgerError::SpeakerOnCompletedTask(speaker.to_string()));
        }
        self.next_speaker = Some(speaker.to_string());
        self.next_speaker_instruction = Some(instruction.to_string());
        Ok(())
    }

    /// Clear the next speaker without completing the task.
    pub fn clear_next(&mut self) {
        self.next_speaker = None;
        self.next_speaker_instruction = None;
    }

    /// Mark the task complete; clears the next speaker.
    pub fn mark_complete(&mut self) {
        self.task_complete = true;
        self.clear_next();
    }

    /// Check the invariants against the current plan length.
    pub fn validate(&self, plan_len: usize) -> Result<(), LedgerError> {
        if self.task_complete {
            if let Some(speaker) = &self.next_speaker {
                return Err(LedgerError::SpeakerOnCompletedTask(speaker.clone()));
            }
        }
        if self.completed_steps.len() > plan_len {
            return Err(LedgerError::CompletedOverflow {
                completed: self.completed_steps.len(),
                planned: plan_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stall_counter_increments_and_resets() {
        let mut ledger = ProgressLedger::new();
        assert_eq!(ledger.record_round(false), 1);
        assert_eq!(ledger.record_round(false), 2);
        assert!(!ledger.progress_being_made());
        assert_eq!(ledger.record_round(true), 0);
        assert!(ledger.progress_being_made());
        assert_eq!(ledger.record_round(false), 1);
    }

    #[test]
    fn test_complete_clears_next_speaker() {
        let mut ledger = ProgressLedger::new();
        ledger.assign_next("algebra", "Step 1/1: solve").unwrap();
        assert_eq!(ledger.next_speaker(), Some("algebra"));
        ledger.mark_complete();
        assert!(ledger.task_complete());
        assert_eq!(ledger.next_speaker(), None);
        assert_eq!(ledger.next_speaker_instruction(), None);
        assert!(ledger.validate(1).is_ok());
    }

    #[test]
    fn test_assign_after_complete_is_rejected() {
        let mut ledger = ProgressLedger::new();
        ledger.mark_complete();
        let err = ledger.assign_next("geometry", "again").unwrap_err();
        assert!(matches!(err, LedgerError::SpeakerOnCompletedTask(_)));
    }

    #[test]
    fn test_completed_steps_bounded_by_plan() {
        let mut ledger = ProgressLedger::new();
        ledger.complete_step("a", 2).unwrap();
        ledger.complete_step("b", 2).unwrap();
        let err = ledger.complete_step("c", 2).unwrap_err();
        assert!(matches!(err, LedgerError::CompletedOverflow { .. }));
        assert_eq!(ledger.completed_steps().len(), 2);
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let mut ledger = ProgressLedger::new();
        ledger.complete_step("a", 3).unwrap();
        assert_eq!(
            ledger.complete_step("a", 3).unwrap_err(),
            LedgerError::StepAlreadyCompleted("a".into())
        );
    }

    #[test]
    fn test_validate_detects_corruption() {
        let corrupted: ProgressLedger = serde_json::from_str(
            r#"{"task_complete":true,"progress_being_made":true,"stall_count":0,
                "next_speaker":"geometry","next_speaker_instruction":null,
                "completed_steps":["a","b"]}"#,
        )
        .unwrap();
        assert!(matches!(
            corrupted.validate(2),
            Err(LedgerError::SpeakerOnCompletedTask(_))
        ));

        let overflow: ProgressLedger = serde_json::from_str(
            r#"{"task_complete":false,"progress_being_made":true,"stall_count":0,
                "next_speaker":null,"next_speaker_instruction":null,
                "completed_steps":["a","b"]}"#,
        )
        .unwrap();
        assert!(matches!(
            overflow.validate(1),
            Err(LedgerError::CompletedOverflow { .. })
        ));
    }
}
