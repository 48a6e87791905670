//! Feedback record types and validation
//!
//! `NewFeedback` is raw caller input. `validate` turns it into a
//! `ValidatedFeedback` witness (the only failure path in this module), and
//! `FeedbackRecord::assemble` combines that witness with the three
//! derivation outputs into the immutable persisted record.

use chrono::{DateTime, Utc};
use pulse_common::config::FeedbackLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation failures for incoming feedback
///
/// Messages are corrective and safe to return to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Rating outside 1..=5. Out-of-range values are rejected, never
    /// clamped.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),

    /// Review empty or whitespace-only
    #[error("review must not be empty")]
    EmptyReview,

    /// Review over the configured length cap
    #[error("review is {len} characters, maximum is {max}")]
    ReviewTooLong { len: usize, max: usize },
}

/// Raw feedback input as submitted by the caller
///
/// `name`, `email`, and `category` are optional extension fields; the
/// core pipeline never depends on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    /// Star rating, expected 1..=5 (validated, not trusted)
    pub rating: i64,
    /// Free-text review
    pub review: String,
    /// Optional submitter name
    #[serde(default)]
    pub name: Option<String>,
    /// Optional submitter email
    #[serde(default)]
    pub email: Option<String>,
    /// Optional feedback category (e.g. "Product", "Service")
    #[serde(default)]
    pub category: Option<String>,
}

impl NewFeedback {
    /// Validate raw input, before any provider or storage I/O
    ///
    /// The review is trimmed; optional fields are trimmed with empty
    /// strings collapsed to `None`.
    pub fn validate(self, limits: &FeedbackLimits) -> Result<ValidatedFeedback, ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }

        let review = self.review.trim().to_string();
        if review.is_empty() {
            return Err(ValidationError::EmptyReview);
        }

        let len = review.chars().count();
        if len > limits.max_review_chars {
            return Err(ValidationError::ReviewTooLong {
                len,
                max: limits.max_review_chars,
            });
        }

        Ok(ValidatedFeedback {
            rating: self.rating as u8,
            review,
            name: normalize_optional(self.name),
            email: normalize_optional(self.email),
            category: normalize_optional(self.category),
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Feedback that passed validation; rating is known to be 1..=5
#[derive(Debug, Clone)]
pub struct ValidatedFeedback {
    pub rating: u8,
    pub review: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
}

/// The three derivation outputs
///
/// Always present: a failed derivation carries its documented fallback
/// text, never null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    pub ai_response: String,
    pub ai_summary: String,
    pub ai_actions: String,
}

/// Immutable persisted feedback record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// UUID v7: globally unique and timestamp-derived, so ascending id
    /// order approximates arrival order
    pub id: Uuid,
    /// When the record was assembled (UTC)
    pub created_at: DateTime<Utc>,
    /// Star rating, 1..=5
    pub rating: u8,
    /// Trimmed review text
    pub review: String,
    /// Empathetic acknowledgement (derived or fallback)
    pub ai_response: String,
    /// One-sentence summary (derived or fallback)
    pub ai_summary: String,
    /// Suggested follow-up actions (derived or fallback)
    pub ai_actions: String,
    /// Optional submitter name
    pub name: Option<String>,
    /// Optional submitter email
    pub email: Option<String>,
    /// Optional feedback category
    pub category: Option<String>,
}

impl FeedbackRecord {
    /// Assemble the immutable record from validated input and derivations
    ///
    /// Assigns a fresh id and `created_at`; copies everything else
    /// verbatim. No failure modes beyond the validation already performed
    /// upstream.
    pub fn assemble(input: ValidatedFeedback, derived: DerivedFields) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            rating: input.rating,
            review: input.review,
            ai_response: derived.ai_response,
            ai_summary: derived.ai_summary,
            ai_actions: derived.ai_actions,
            name: input.name,
            email: input.email,
            category: input.category,
        }
    }
}
