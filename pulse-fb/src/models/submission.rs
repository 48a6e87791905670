//! Submission pipeline state machine
//!
//! A submission progresses Received → Validated → Enriched → Persisted,
//! or short-circuits to Rejected (validation failure) or PersistFailed
//! (storage failure after enrichment).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionState {
    /// Raw input accepted by the shell, nothing checked yet
    Received,
    /// Input passed validation; enrichment may begin
    Validated,
    /// All three derivations resolved (derived text or fallback)
    Enriched,
    /// Record appended to the store; submission succeeded
    Persisted,
    /// Validation failed; nothing was derived or written
    Rejected,
    /// Append failed after enrichment; submission failed
    PersistFailed,
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub submission_id: Uuid,
    pub old_state: SubmissionState,
    pub new_state: SubmissionState,
    pub transitioned_at: DateTime<Utc>,
}

/// Per-submission tracking (in-memory, lives for one pipeline pass)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique submission identifier (also used in lifecycle events)
    pub submission_id: Uuid,

    /// Current pipeline state
    pub state: SubmissionState,

    /// When the submission entered the pipeline
    pub received_at: DateTime<Utc>,

    /// When a terminal state was reached
    pub completed_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Create a new submission in the Received state
    pub fn new() -> Self {
        Self {
            submission_id: Uuid::now_v7(),
            state: SubmissionState::Received,
            received_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: SubmissionState) -> StateTransition {
        let transition = StateTransition {
            submission_id: self.submission_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        // Terminal states stamp the completion time
        match new_state {
            SubmissionState::Persisted
            | SubmissionState::Rejected
            | SubmissionState::PersistFailed => {
                self.completed_at = Some(Utc::now());
            }
            _ => {}
        }

        transition
    }

    /// Check whether the submission reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Persisted
                | SubmissionState::Rejected
                | SubmissionState::PersistFailed
        )
    }
}

impl Default for Submission {
    fn default() -> Self {
        Self::new()
    }
}
