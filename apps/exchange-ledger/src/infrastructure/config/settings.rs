//! Ledger Configuration Settings
//!
//! Configuration types for the ledger, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::use_cases::StepRetryPolicy;

/// Default directory for table files.
const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the share marker inside the data directory.
const SHARE_MARKER_FILE: &str = "last_shared_month.txt";

/// Table storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// One JSON-lines file per table and period.
    #[default]
    File,
    /// Process memory only.
    Memory,
}

impl StoreMode {
    /// Parse a store mode name.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" => Some(Self::File),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Complete ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Table storage backend.
    pub store: StoreMode,
    /// Directory holding table files.
    pub data_dir: PathBuf,
    /// File holding the last shared month.
    pub share_marker_path: PathBuf,
    /// Interval between background position rollups; `None` disables them.
    pub rollup_interval: Option<Duration>,
    /// Retry policy for post-commit workflow steps.
    pub retry: StepRetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        Self {
            store: StoreMode::default(),
            share_marker_path: data_dir.join(SHARE_MARKER_FILE),
            data_dir,
            rollup_interval: Some(Duration::from_secs(600)),
            retry: StepRetryPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store = match lookup("LEDGER_STORE") {
            Some(raw) => StoreMode::from_str_case_insensitive(raw.trim())
                .ok_or_else(|| ConfigError::invalid("LEDGER_STORE", &raw))?,
            None => defaults.store,
        };

        let data_dir = match lookup("LEDGER_DATA_DIR") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("LEDGER_DATA_DIR".to_string()));
            }
            Some(raw) => PathBuf::from(raw.trim()),
            None => defaults.data_dir,
        };

        let share_marker_path = lookup("LEDGER_SHARE_MARKER_PATH")
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| data_dir.join(SHARE_MARKER_FILE), PathBuf::from);

        let rollup_secs: u64 = parse_var(&lookup, "LEDGER_ROLLUP_INTERVAL_SECS", 600)?;
        let rollup_interval = (rollup_secs > 0).then(|| Duration::from_secs(rollup_secs));

        let max_retries: u32 = parse_var(
            &lookup,
            "LEDGER_STEP_RETRY_ATTEMPTS",
            defaults.retry.max_retries,
        )?;
        let backoff_ms: u64 = parse_var(&lookup, "LEDGER_STEP_RETRY_BACKOFF_MS", 50)?;
        let retry = StepRetryPolicy::new(
            max_retries,
            Duration::from_millis(backoff_ms),
            defaults.retry.max_backoff,
        );

        Ok(Self {
            store,
            data_dir,
            share_marker_path,
            rollup_interval,
            retry,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable does not parse.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(key, &raw)),
        None => Ok(default),
    }
}
