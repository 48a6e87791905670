//! Configuration loading and resolution
//!
//! Resolution happens once at startup, in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The winning source is logged, and the result is a typed configuration
//! value handed to constructors. No code reads configuration after startup.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default HTTP port for the feedback service
pub const DEFAULT_PORT: u16 = 5730;

/// Default cap on review length, in characters
pub const DEFAULT_MAX_REVIEW_CHARS: usize = 10_000;

/// Environment variable naming the config file
pub const ENV_CONFIG: &str = "PULSE_CONFIG";
/// Environment variable overriding the HTTP port
pub const ENV_PORT: &str = "PULSE_FB_PORT";
/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "PULSE_DATABASE";

/// Raw TOML config file contents
///
/// Every field is optional: the file itself may be absent, and each value
/// falls through to the next resolution tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: TomlServer,
    #[serde(default)]
    pub provider: TomlProvider,
    #[serde(default)]
    pub limits: TomlLimits,
}

/// `[server]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServer {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

/// `[provider]` section of the config file (LLM enrichment endpoint)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlProvider {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[limits]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlLimits {
    pub max_review_chars: Option<usize>,
}

impl TomlConfig {
    /// Load the config file, tolerating a missing file
    ///
    /// A missing file yields defaults (every tier falls through); an
    /// unreadable or malformed file is a hard error so a typo cannot
    /// silently revert the service to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!("Loaded config file: {}", path.display());
        Ok(config)
    }
}

/// Validation limits applied to incoming feedback
#[derive(Debug, Clone, Copy)]
pub struct FeedbackLimits {
    /// Maximum review length in characters (longer reviews are rejected)
    pub max_review_chars: usize,
}

impl Default for FeedbackLimits {
    fn default() -> Self {
        Self {
            max_review_chars: DEFAULT_MAX_REVIEW_CHARS,
        }
    }
}

/// Resolve the config file path: CLI argument, `PULSE_CONFIG`, then the
/// OS config directory default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        info!("Using config file from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        info!("Using config file from {}: {}", ENV_CONFIG, path);
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|d| d.join("pulse").join("pulse.toml"))
        .unwrap_or_else(|| PathBuf::from("./pulse.toml"))
}

/// Resolve the HTTP port: CLI argument, `PULSE_FB_PORT`, config file,
/// then [`DEFAULT_PORT`]
pub fn resolve_port(cli_arg: Option<u16>, file: &TomlConfig) -> u16 {
    if let Some(port) = cli_arg {
        info!("Using port {} from command line", port);
        return port;
    }

    if let Ok(value) = std::env::var(ENV_PORT) {
        match value.parse::<u16>() {
            Ok(port) => {
                info!("Using port {} from {}", port, ENV_PORT);
                return port;
            }
            Err(_) => {
                warn!("Ignoring unparsable {} value: {:?}", ENV_PORT, value);
            }
        }
    }

    if let Some(port) = file.server.port {
        info!("Using port {} from config file", port);
        return port;
    }

    debug!("Using default port {}", DEFAULT_PORT);
    DEFAULT_PORT
}

/// Resolve the SQLite database path: CLI argument, `PULSE_DATABASE`,
/// config file, then the OS data directory default
pub fn resolve_database_path(cli_arg: Option<&Path>, file: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        info!("Using database path from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_DATABASE) {
        info!("Using database path from {}: {}", ENV_DATABASE, path);
        return PathBuf::from(path);
    }

    if let Some(path) = &file.server.database_path {
        info!("Using database path from config file: {}", path.display());
        return path.clone();
    }

    let path = default_database_path();
    debug!("Using default database path: {}", path.display());
    path
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pulse").join("feedback.db"))
        .unwrap_or_else(|| PathBuf::from("./pulse_data/feedback.db"))
}

/// Resolve validation limits from the config file
pub fn resolve_limits(file: &TomlConfig) -> FeedbackLimits {
    let max_review_chars = file
        .limits
        .max_review_chars
        .unwrap_or(DEFAULT_MAX_REVIEW_CHARS);
    FeedbackLimits { max_review_chars }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn file_with_port(port: u16) -> TomlConfig {
        TomlConfig {
            server: TomlServer {
                port: Some(port),
                database_path: None,
            },
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_port_cli_beats_env_and_file() {
        std::env::set_var(ENV_PORT, "6001");
        assert_eq!(resolve_port(Some(7001), &file_with_port(8001)), 7001);
        std::env::remove_var(ENV_PORT);
    }

    #[test]
    #[serial]
    fn test_port_env_beats_file() {
        std::env::set_var(ENV_PORT, "6002");
        assert_eq!(resolve_port(None, &file_with_port(8002)), 6002);
        std::env::remove_var(ENV_PORT);
    }

    #[test]
    #[serial]
    fn test_port_file_beats_default() {
        std::env::remove_var(ENV_PORT);
        assert_eq!(resolve_port(None, &file_with_port(8003)), 8003);
    }

    #[test]
    #[serial]
    fn test_port_default_when_nothing_configured() {
        std::env::remove_var(ENV_PORT);
        assert_eq!(resolve_port(None, &TomlConfig::default()), DEFAULT_PORT);
    }

    #[test]
    #[serial]
    fn test_port_unparsable_env_falls_through() {
        std::env::set_var(ENV_PORT, "not-a-port");
        assert_eq!(resolve_port(None, &file_with_port(8004)), 8004);
        std::env::remove_var(ENV_PORT);
    }

    #[test]
    #[serial]
    fn test_database_path_tiers() {
        std::env::set_var(ENV_DATABASE, "/tmp/env.db");
        let file = TomlConfig {
            server: TomlServer {
                port: None,
                database_path: Some(PathBuf::from("/tmp/file.db")),
            },
            ..Default::default()
        };

        let cli = PathBuf::from("/tmp/cli.db");
        assert_eq!(
            resolve_database_path(Some(&cli), &file),
            PathBuf::from("/tmp/cli.db")
        );
        assert_eq!(
            resolve_database_path(None, &file),
            PathBuf::from("/tmp/env.db")
        );

        std::env::remove_var(ENV_DATABASE);
        assert_eq!(
            resolve_database_path(None, &file),
            PathBuf::from("/tmp/file.db")
        );
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = TomlConfig::load(Path::new("/nonexistent/pulse.toml")).unwrap();
        assert!(config.server.port.is_none());
        assert!(config.provider.api_key.is_none());
        assert!(config.limits.max_review_chars.is_none());
    }

    #[test]
    fn test_load_parses_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 6100
database_path = "/var/lib/pulse/feedback.db"

[provider]
api_key = "gsk_test"
model = "mixtral-8x7b-32768"
timeout_secs = 10

[limits]
max_review_chars = 500
"#
        )
        .unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, Some(6100));
        assert_eq!(
            config.server.database_path,
            Some(PathBuf::from("/var/lib/pulse/feedback.db"))
        );
        assert_eq!(config.provider.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.provider.timeout_secs, Some(10));
        assert_eq!(config.limits.max_review_chars, Some(500));
        assert_eq!(resolve_limits(&config).max_review_chars, 500);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = oops").unwrap();

        let result = TomlConfig::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_limits() {
        let limits = resolve_limits(&TomlConfig::default());
        assert_eq!(limits.max_review_chars, DEFAULT_MAX_REVIEW_CHARS);
    }
}
