//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which executor a connection sends queries to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Network when url and token are set, recording otherwise
    #[default]
    Auto,
    /// Always the HTTP executor
    Network,
    /// Record queries in memory, never touch the network
    Recording,
}

impl ExecutorKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "network" | "http" => Some(Self::Network),
            "recording" | "fake" => Some(Self::Recording),
            _ => None,
        }
    }
}

/// Store connection parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Store endpoint (e.g., "http://localhost:8086")
    pub url: Option<String>,

    /// API token
    pub token: Option<String>,

    /// Organization name
    pub org: Option<String>,

    /// Bucket applied to queries that name none
    pub bucket: Option<String>,

    #[serde(default)]
    pub executor: ExecutorKind,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl ConnectionConfig {
    /// True when both url and token are present and non-empty
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.url) && set(&self.token)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            org: None,
            bucket: None,
            executor: ExecutorKind::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("fluxql").join("config.toml")),
            Some(PathBuf::from("/etc/fluxql/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `FLUXQL_*` overrides from any key → value source
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Connection overrides
        if let Some(url) = lookup("FLUXQL_URL") {
            self.connection.url = Some(url);
        }
        if let Some(token) = lookup("FLUXQL_TOKEN") {
            self.connection.token = Some(token);
        }
        if let Some(org) = lookup("FLUXQL_ORG") {
            self.connection.org = Some(org);
        }
        if let Some(bucket) = lookup("FLUXQL_BUCKET") {
            self.connection.bucket = Some(bucket);
        }
        if let Some(executor) = lookup("FLUXQL_EXECUTOR") {
            match ExecutorKind::from_str(&executor) {
                Some(kind) => self.connection.executor = kind,
                None => tracing::warn!("Ignoring unknown FLUXQL_EXECUTOR value {:?}", executor),
            }
        }

        // Logging overrides
        if let Some(level) = lookup("FLUXQL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("FLUXQL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# fluxql Configuration
#
# Environment variables override these settings:
# - FLUXQL_URL
# - FLUXQL_TOKEN
# - FLUXQL_ORG
# - FLUXQL_BUCKET
# - FLUXQL_EXECUTOR
# - FLUXQL_LOG_LEVEL
# - FLUXQL_LOG_FORMAT

[connection]
# Store endpoint
url = "http://localhost:8086"

# API token
token = ""

# Organization name
org = ""

# Bucket used when a query names none
bucket = "default"

# Executor: auto (network when url and token are set), network, recording
executor = "auto"

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/fluxql/fluxql.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.executor, ExecutorKind::Auto);
        assert_eq!(config.connection.request_timeout_secs, 30);
        assert!(!config.connection.has_credentials());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.connection.url.as_deref(), Some("http://localhost:8086"));
        assert_eq!(config.connection.bucket.as_deref(), Some("default"));
        assert!(!config.connection.has_credentials());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[connection]
url = "http://influx:8086"
token = "secret"
org = "acme"
bucket = "example-bucket"
executor = "recording"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.connection.executor, ExecutorKind::Recording);
        assert_eq!(config.connection.org.as_deref(), Some("acme"));
        assert!(config.connection.has_credentials());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/nonexistent/fluxql.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection\nurl = ").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FLUXQL_URL", "http://other:8086"),
            ("FLUXQL_TOKEN", "t0ken"),
            ("FLUXQL_EXECUTOR", "network"),
            ("FLUXQL_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.connection.url.as_deref(), Some("http://other:8086"));
        assert_eq!(config.connection.executor, ExecutorKind::Network);
        assert_eq!(config.logging.format, "json");
        assert!(config.connection.bucket.is_none());
    }

    #[test]
    fn test_unknown_executor_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "FLUXQL_EXECUTOR").then(|| "bogus".to_string()));
        assert_eq!(config.connection.executor, ExecutorKind::Auto);
    }

    #[test]
    fn test_executor_kind_from_str() {
        assert_eq!(ExecutorKind::from_str("Recording"), Some(ExecutorKind::Recording));
        assert_eq!(ExecutorKind::from_str("fake"), Some(ExecutorKind::Recording));
        assert_eq!(ExecutorKind::from_str("http"), Some(ExecutorKind::Network));
        assert_eq!(ExecutorKind::from_str("nope"), None);
    }
}
