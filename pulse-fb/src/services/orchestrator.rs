//! Submission orchestrator
//!
//! Coordinates one submission through the pipeline states:
//! RECEIVED → VALIDATED → ENRICHED → PERSISTED, short-circuiting to
//! REJECTED on validation failure and PERSISTFAILED on storage failure.
//! Provider failures never short-circuit: each failed derivation folds to
//! its documented fallback with a warning.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db;
use crate::models::{
    DerivedFields, FeedbackRecord, NewFeedback, Submission, SubmissionState, ValidationError,
};
use crate::services::enrichment::{self, EnrichmentClient, EnrichmentError};
use pulse_common::config::FeedbackLimits;
use pulse_common::events::{DerivationKind, EventBus, PulseEvent};

/// Submission pipeline failure
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Input failed validation; nothing was derived or written
    #[error("{0}")]
    Rejected(#[from] ValidationError),

    /// Append failed after enrichment; the submission did not go through
    #[error("Storage failure: {0}")]
    Storage(#[from] pulse_common::Error),
}

/// One derivation that fell back, and why
#[derive(Debug, Clone, Serialize)]
pub struct DerivationWarning {
    pub derivation: DerivationKind,
    pub message: String,
}

/// Outcome of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    /// The persisted record
    pub record: FeedbackRecord,
    /// One entry per derivation that used its fallback (0..=3)
    pub warnings: Vec<DerivationWarning>,
}

/// Submission pipeline orchestrator
pub struct SubmissionOrchestrator {
    db: SqlitePool,
    event_bus: EventBus,
    enricher: EnrichmentClient,
    limits: FeedbackLimits,
}

impl SubmissionOrchestrator {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        enricher: EnrichmentClient,
        limits: FeedbackLimits,
    ) -> Self {
        Self {
            db,
            event_bus,
            enricher,
            limits,
        }
    }

    /// Run one submission through the pipeline
    ///
    /// Exactly one record is appended per successful call; a failed call
    /// appends nothing.
    pub async fn submit(&self, input: NewFeedback) -> Result<SubmissionReceipt, SubmissionError> {
        let mut submission = Submission::new();
        self.event_bus.emit_lossy(PulseEvent::SubmissionReceived {
            submission_id: submission.submission_id,
            timestamp: submission.received_at,
        });

        // Validation runs once, before any provider or storage I/O
        let validated = match input.validate(&self.limits) {
            Ok(validated) => validated,
            Err(e) => {
                submission.transition_to(SubmissionState::Rejected);
                tracing::info!(
                    submission_id = %submission.submission_id,
                    "Submission rejected: {}",
                    e
                );
                self.event_bus.emit_lossy(PulseEvent::SubmissionRejected {
                    submission_id: submission.submission_id,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(SubmissionError::Rejected(e));
            }
        };
        submission.transition_to(SubmissionState::Validated);

        // Fan out the three derivations; they are independent, so one
        // failure never blocks the others
        let (response, summary, actions) = tokio::join!(
            self.enricher.derive_response(validated.rating, &validated.review),
            self.enricher.derive_summary(&validated.review),
            self.enricher.derive_actions(validated.rating, &validated.review),
        );

        let mut warnings = Vec::new();
        let derived = DerivedFields {
            ai_response: self.resolve_derivation(
                &submission,
                DerivationKind::Response,
                response,
                &mut warnings,
            ),
            ai_summary: self.resolve_derivation(
                &submission,
                DerivationKind::Summary,
                summary,
                &mut warnings,
            ),
            ai_actions: self.resolve_derivation(
                &submission,
                DerivationKind::Actions,
                actions,
                &mut warnings,
            ),
        };
        submission.transition_to(SubmissionState::Enriched);

        let record = FeedbackRecord::assemble(validated, derived);

        if let Err(e) = db::feedback::append_feedback(&self.db, &record).await {
            submission.transition_to(SubmissionState::PersistFailed);
            tracing::error!(
                submission_id = %submission.submission_id,
                "Failed to persist feedback: {}",
                e
            );
            self.event_bus.emit_lossy(PulseEvent::SubmissionPersistFailed {
                submission_id: submission.submission_id,
                reason: e.to_string(),
                timestamp: Utc::now(),
            });
            return Err(SubmissionError::Storage(e));
        }

        submission.transition_to(SubmissionState::Persisted);
        tracing::info!(
            submission_id = %submission.submission_id,
            record_id = %record.id,
            rating = record.rating,
            fallbacks = warnings.len(),
            "Feedback persisted"
        );
        self.event_bus.emit_lossy(PulseEvent::SubmissionPersisted {
            submission_id: submission.submission_id,
            record_id: record.id,
            rating: record.rating,
            fallback_count: warnings.len(),
            timestamp: Utc::now(),
        });

        Ok(SubmissionReceipt { record, warnings })
    }

    /// Fold one derivation outcome: derived text on success, documented
    /// fallback plus a warning on failure
    fn resolve_derivation(
        &self,
        submission: &Submission,
        kind: DerivationKind,
        outcome: Result<String, EnrichmentError>,
        warnings: &mut Vec<DerivationWarning>,
    ) -> String {
        match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    submission_id = %submission.submission_id,
                    derivation = %kind,
                    "Derivation failed, using fallback: {}",
                    e
                );
                self.event_bus.emit_lossy(PulseEvent::DerivationFallback {
                    submission_id: submission.submission_id,
                    derivation: kind,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                warnings.push(DerivationWarning {
                    derivation: kind,
                    message: e.to_string(),
                });
                enrichment::fallback_text(kind).to_string()
            }
        }
    }
}
