//! Server-Sent Events endpoint
//!
//! Streams every pipeline event to connected dashboards. Slow clients
//! that lag behind the broadcast buffer skip ahead rather than stalling
//! the pipeline.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::AppState;

/// Heartbeat interval to keep idle connections open
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// GET /api/events
///
/// Each event goes out as an SSE message whose event name is the
/// variant tag and whose data is the JSON payload.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_bus.subscribe();
    debug!("SSE client connected");

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("Connected").data("{}"));

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    yield Ok(Event::default().event("Heartbeat").data("{}"));
                }
                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    yield Ok(Event::default()
                                        .event(event.event_type())
                                        .data(json));
                                }
                                Err(e) => {
                                    warn!("Failed to serialize event for SSE: {}", e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("SSE client lagged, skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => {
                            debug!("Event bus closed, ending SSE stream");
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
