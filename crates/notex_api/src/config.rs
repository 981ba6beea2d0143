//! Environment-driven runtime configuration.
//!
//! Recognized variables:
//! - `NOTEX_DB_PATH`: SQLite file; defaults to `<temp>/notex.sqlite3`.
//! - `NOTEX_LOG_LEVEL`: `trace|debug|info|warn|error`; defaults to the
//!   build-mode level.
//! - `NOTEX_LOG_DIR`: absolute directory; enables rolling file logs.
//! - `NOTEX_TOKEN_TTL_HOURS`: bearer token lifetime; defaults to 168.
//! - `NOTEX_BCRYPT_COST`: password hashing cost (4..=31); defaults to 12.
//!
//! Blank values are treated as unset.

use notex_core::{init_logging, AuthConfig, LogLevel, LogSettings, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DB_FILE_NAME: &str = "notex.sqlite3";
const DEFAULT_TOKEN_TTL_HOURS: u32 = 7 * 24;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

pub const ENV_DB_PATH: &str = "NOTEX_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "NOTEX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NOTEX_LOG_DIR";
pub const ENV_TOKEN_TTL_HOURS: &str = "NOTEX_TOKEN_TTL_HOURS";
pub const ENV_BCRYPT_COST: &str = "NOTEX_BCRYPT_COST";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
    pub token_ttl_hours: u32,
    pub bcrypt_cost: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DB_FILE_NAME),
            log_level: LogLevel::for_build(),
            log_dir: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            bcrypt_cost: AuthConfig::default().bcrypt_cost,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let invalid = |key: &'static str, value: String| ConfigError::InvalidValue { key, value };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                LogLevel::parse(&level).ok_or_else(|| invalid(ENV_LOG_LEVEL, level))?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(invalid(ENV_LOG_DIR, dir.display().to_string()));
            }
            config.log_dir = Some(dir);
        }
        if let Some(hours) = read(ENV_TOKEN_TTL_HOURS) {
            config.token_ttl_hours = match hours.parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => return Err(invalid(ENV_TOKEN_TTL_HOURS, hours)),
            };
        }
        if let Some(cost) = read(ENV_BCRYPT_COST) {
            config.bcrypt_cost = match cost.parse::<u32>() {
                Ok(value) if BCRYPT_COST_RANGE.contains(&value) => value,
                _ => return Err(invalid(ENV_BCRYPT_COST, cost)),
            };
        }
        Ok(config)
    }

    /// Credential settings derived from this configuration.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token_ttl_ms: i64::from(self.token_ttl_hours) * 60 * 60 * 1000,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    /// File logging settings; `None` when no log directory is configured.
    pub fn log_settings(&self) -> Option<LogSettings> {
        self.log_dir.as_ref().map(|dir| LogSettings {
            level: self.log_level,
            dir: dir.clone(),
        })
    }

    /// Starts file logging when configured. Returns whether logging is on.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match self.log_settings() {
            Some(settings) => init_logging(&settings).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, ConfigError, ENV_BCRYPT_COST, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use notex_core::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn rejected_key(result: Result<ApiConfig, ConfigError>) -> &'static str {
        match result {
            Err(ConfigError::InvalidValue { key, .. }) => key,
            Ok(config) => panic!("expected rejection, got {config:?}"),
        }
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = from_pairs(&[("NOTEX_DB_PATH", "   ")]).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.bcrypt_cost, 12);
        assert!(config.db_path.ends_with("notex.sqlite3"));
        assert!(config.log_settings().is_none());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = from_pairs(&[
            ("NOTEX_DB_PATH", " /tmp/notes.db "),
            ("NOTEX_LOG_LEVEL", "WARN"),
            ("NOTEX_LOG_DIR", "/tmp/notex-logs"),
            ("NOTEX_TOKEN_TTL_HOURS", "2"),
            ("NOTEX_BCRYPT_COST", "5"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/notes.db"));
        assert_eq!(config.log_level, LogLevel::Warn);

        let settings = config.log_settings().unwrap();
        assert_eq!(settings.dir, PathBuf::from("/tmp/notex-logs"));
        assert_eq!(settings.level, LogLevel::Warn);

        let auth = config.auth_config();
        assert_eq!(auth.token_ttl_ms, 2 * 60 * 60 * 1000);
        assert_eq!(auth.bcrypt_cost, 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(rejected_key(from_pairs(&[("NOTEX_LOG_LEVEL", "loud")])), ENV_LOG_LEVEL);
        assert_eq!(
            rejected_key(from_pairs(&[("NOTEX_LOG_DIR", "relative/logs")])),
            ENV_LOG_DIR
        );
        assert_eq!(
            rejected_key(from_pairs(&[("NOTEX_BCRYPT_COST", "3")])),
            ENV_BCRYPT_COST
        );
        assert!(from_pairs(&[("NOTEX_TOKEN_TTL_HOURS", "0")]).is_err());
    }

    #[test]
    fn logging_stays_off_without_directory() {
        assert!(!ApiConfig::default().init_logging().unwrap());
    }
}
