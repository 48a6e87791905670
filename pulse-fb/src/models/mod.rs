//! Data models for pulse-fb (feedback intake & analytics)
//!
//! - Feedback record, validation, and assembly
//! - Submission pipeline state machine

pub mod feedback;
pub mod submission;

pub use feedback::{DerivedFields, FeedbackRecord, NewFeedback, ValidatedFeedback, ValidationError};
pub use submission::{StateTransition, Submission, SubmissionState};
