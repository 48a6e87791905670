//! HTTP API handlers for pulse-fb
//!
//! REST endpoints plus SSE for live dashboard updates.

pub mod dashboard;
pub mod feedback;
pub mod health;
pub mod sse;
pub mod ui;

pub use dashboard::dashboard_routes;
pub use feedback::feedback_routes;
pub use health::health_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
