//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `modhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use modhub_app::rule_engine::EngineOptions;
use modhub_domain::rule::{StaticCustomPredicate, ValidationPolicy};

const MAX_SCAN_INTERVAL_SECS: u64 = 3600;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rule engine polling.
    pub engine: EngineConfig,
    /// Rule validation and custom conditions.
    pub rules: RulesConfig,
    /// Seed data and event log sizing.
    pub storage: StorageConfig,
    /// `SQLite` database location.
    pub database: DatabaseConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between two evaluation passes.
    pub scan_interval_secs: u64,
    /// Snapshots older than this are skipped; `0` accepts any age.
    pub max_snapshot_age_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub priority_min: i32,
    pub priority_max: i32,
    /// Clamp out-of-range priorities on save instead of only warning.
    pub clamp_priority: bool,
    /// Outcome of each `custom` condition, keyed by its description.
    pub custom_conditions: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file with the initial mods, rules and settings.
    pub seed_file: Option<PathBuf>,
    /// Number of events kept in the event log.
    pub event_log_capacity: usize,
}

/// Database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL.
    pub url: String,
}

impl Config {
    /// Load configuration from `modhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("modhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MODHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("MODHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("MODHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("MODHUB_SCAN_INTERVAL")
            && let Ok(secs) = val.parse()
        {
            self.engine.scan_interval_secs = secs;
        }
        if let Ok(val) = std::env::var("MODHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("MODHUB_SEED_FILE") {
            self.storage.seed_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("MODHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !(1..=MAX_SCAN_INTERVAL_SECS).contains(&self.engine.scan_interval_secs) {
            return Err(ConfigError::Validation(format!(
                "scan interval must be between 1 and {MAX_SCAN_INTERVAL_SECS} seconds"
            )));
        }
        if self.rules.priority_min > self.rules.priority_max {
            return Err(ConfigError::Validation(format!(
                "priority range {}..={} is inverted",
                self.rules.priority_min, self.rules.priority_max
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        if self.storage.event_log_capacity == 0 {
            return Err(ConfigError::Validation(
                "event log capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        let max_age = self.engine.max_snapshot_age_secs;
        EngineOptions {
            scan_interval: Duration::from_secs(self.engine.scan_interval_secs),
            max_snapshot_age: (max_age > 0).then(|| Duration::from_secs(max_age)),
        }
    }

    #[must_use]
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            min_priority: self.rules.priority_min,
            max_priority: self.rules.priority_max,
            clamp_priority: self.rules.clamp_priority,
            custom_predicate_available: !self.rules.custom_conditions.is_empty(),
        }
    }

    /// Predicate answering `custom` conditions from the configured table.
    #[must_use]
    pub fn custom_predicate(&self) -> StaticCustomPredicate {
        StaticCustomPredicate(self.rules.custom_conditions.clone())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "modhubd=info,modhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 5,
            max_snapshot_age_secs: 30,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        let policy = ValidationPolicy::default();
        Self {
            priority_min: policy.min_priority,
            priority_max: policy.max_priority,
            clamp_priority: policy.clamp_priority,
            custom_conditions: BTreeMap::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            event_log_capacity: 1000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:modhub.db?mode=rwc".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
