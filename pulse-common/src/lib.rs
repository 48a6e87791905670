//! # Pulse Common Library
//!
//! Shared code for the Pulse feedback service:
//! - Error types (`Error`, `Result`)
//! - Event types (`PulseEvent` enum) and the `EventBus`
//! - Configuration loading and resolution

pub mod config;
pub mod error;
pub mod events;

pub use config::{FeedbackLimits, TomlConfig};
pub use error::{Error, Result};
pub use events::{EventBus, PulseEvent};
