//! Event types for the Pulse event system
//!
//! Provides the submission lifecycle events and the EventBus used to
//! broadcast them to SSE clients and other in-process listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Which of the three per-submission derivations an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DerivationKind {
    /// Empathetic acknowledgement shown back to the customer
    Response,
    /// One-sentence review summary
    Summary,
    /// Suggested follow-up actions
    Actions,
}

impl DerivationKind {
    /// Stable lowercase name for logs and warning payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivationKind::Response => "response",
            DerivationKind::Summary => "summary",
            DerivationKind::Actions => "actions",
        }
    }
}

impl std::fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pulse event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// One submission produces a Received event, zero or more DerivationFallback
/// events, and exactly one terminal event (Persisted, Rejected, or
/// PersistFailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PulseEvent {
    /// A submission entered the pipeline
    SubmissionReceived {
        /// Pipeline-assigned submission UUID
        submission_id: Uuid,
        /// When the submission arrived
        timestamp: DateTime<Utc>,
    },

    /// A submission failed validation and was rejected before any I/O
    SubmissionRejected {
        /// Pipeline-assigned submission UUID
        submission_id: Uuid,
        /// Corrective message (same text the caller receives)
        reason: String,
        /// When the rejection happened
        timestamp: DateTime<Utc>,
    },

    /// A derivation failed and its documented fallback text was substituted
    ///
    /// Non-fatal: the submission continues toward persistence.
    DerivationFallback {
        /// Pipeline-assigned submission UUID
        submission_id: Uuid,
        /// Which derivation fell back
        derivation: DerivationKind,
        /// Provider error description
        reason: String,
        /// When the fallback was taken
        timestamp: DateTime<Utc>,
    },

    /// A record was appended to the store; the submission succeeded
    SubmissionPersisted {
        /// Pipeline-assigned submission UUID
        submission_id: Uuid,
        /// Id of the persisted feedback record
        record_id: Uuid,
        /// Star rating of the persisted record
        rating: u8,
        /// Number of derivations that fell back (0..=3)
        fallback_count: usize,
        /// When the append completed
        timestamp: DateTime<Utc>,
    },

    /// The append failed after enrichment; the submission failed
    SubmissionPersistFailed {
        /// Pipeline-assigned submission UUID
        submission_id: Uuid,
        /// Storage error description
        reason: String,
        /// When the failure happened
        timestamp: DateTime<Utc>,
    },
}

impl PulseEvent {
    /// Event type name as a stable string (used as the SSE event name)
    pub fn event_type(&self) -> &'static str {
        match self {
            PulseEvent::SubmissionReceived { .. } => "SubmissionReceived",
            PulseEvent::SubmissionRejected { .. } => "SubmissionRejected",
            PulseEvent::DerivationFallback { .. } => "DerivationFallback",
            PulseEvent::SubmissionPersisted { .. } => "SubmissionPersisted",
            PulseEvent::SubmissionPersistFailed { .. } => "SubmissionPersistFailed",
        }
    }
}

/// Event bus for broadcasting Pulse events
///
/// Wraps a tokio broadcast channel. Cloning shares the underlying channel,
/// so one bus created at startup serves every handler and the SSE stream.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PulseEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Capacity bounds how many events a slow subscriber may lag before
    /// it starts missing events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscribers are
    /// listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PulseEvent,
    ) -> Result<usize, broadcast::error::SendError<PulseEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// The submission pipeline uses this: events are observability, never
    /// control flow, and zero subscribers is a normal state.
    pub fn emit_lossy(&self, event: PulseEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!("No subscribers for event: {}", e.0.event_type());
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
