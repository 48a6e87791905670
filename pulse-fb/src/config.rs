//! Configuration resolution for pulse-fb
//!
//! Composes the shared tier helpers into one `ServiceConfig` at startup.
//! Provider API key priority: environment → TOML config file. A missing
//! key is a startup failure: the pipeline's fallbacks cover provider
//! outages, not an unconfigured service.

use pulse_common::config::{self, FeedbackLimits, TomlConfig};
use pulse_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable carrying the provider API key
pub const ENV_PROVIDER_API_KEY: &str = "PULSE_PROVIDER_API_KEY";

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default completion model
pub const DEFAULT_PROVIDER_MODEL: &str = "mixtral-8x7b-32768";

/// Default per-request timeout in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Resolved provider settings, injected into the enrichment client
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Bounds every generation call
    pub timeout: Duration,
}

/// Fully resolved service configuration
///
/// Built once in `main` and passed into constructors; nothing reads
/// configuration sources after startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub provider: ProviderConfig,
    pub limits: FeedbackLimits,
}

impl ServiceConfig {
    /// Resolve all configuration from CLI overrides, environment
    /// variables, and the TOML config file
    pub fn resolve(
        config_path: Option<&Path>,
        port: Option<u16>,
        database_path: Option<&Path>,
    ) -> Result<Self> {
        let path = config::resolve_config_path(config_path);
        let file = TomlConfig::load(&path)?;

        let provider = ProviderConfig {
            base_url: file
                .provider
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            api_key: resolve_provider_api_key(&file)?,
            model: file
                .provider
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER_MODEL.to_string()),
            timeout: Duration::from_secs(
                file.provider
                    .timeout_secs
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            ),
        };

        Ok(Self {
            port: config::resolve_port(port, &file),
            database_path: config::resolve_database_path(database_path, &file),
            provider,
            limits: config::resolve_limits(&file),
        })
    }
}

/// Resolve the provider API key from 2-tier configuration
///
/// **Priority:** ENV → TOML
pub fn resolve_provider_api_key(file: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    let env_key = std::env::var(ENV_PROVIDER_API_KEY).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    let toml_key = file.provider.api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Provider API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Provider API key loaded from environment variable");
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Provider API key loaded from TOML config");
            return Ok(key.trim().to_string());
        }
    }

    Err(Error::Config(format!(
        "Provider API key not configured. Set {} or add api_key under [provider] in the config file.",
        ENV_PROVIDER_API_KEY
    )))
}

/// Validate API key (non-empty, non-whitespace)
fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
