//! pulse-fb library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pulse_common::config::FeedbackLimits;
use pulse_common::events::EventBus;

use crate::services::{EnrichmentClient, SubmissionOrchestrator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Submission pipeline
    pub orchestrator: Arc<SubmissionOrchestrator>,
    /// Provider client for cross-record insights
    pub enricher: EnrichmentClient,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last persistence error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        enricher: EnrichmentClient,
        limits: FeedbackLimits,
    ) -> Self {
        let orchestrator = Arc::new(SubmissionOrchestrator::new(
            db.clone(),
            event_bus.clone(),
            enricher.clone(),
            limits,
        ));

        Self {
            db,
            event_bus,
            orchestrator,
            enricher,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::feedback_routes())
        .merge(api::dashboard_routes())
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
