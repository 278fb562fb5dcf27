//! Application configuration.
//!
//! [`AppConfig::from_env`] supplies defaults and the log filter. The
//! provider, backend and storage settings come from the command line,
//! which also reads their `QUOTECONNECT_*` variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::persistence::default_storage_path;

/// Default bound on each provider call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Variable holding the log filter.
pub const LOG_VAR: &str = "QUOTECONNECT_LOG";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A setting had a value that could not be parsed.
    #[error("invalid value '{value}' for {setting}: {reason}")]
    InvalidValue {
        /// Setting name.
        setting: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },

    /// The remote provider needs a setting that is not configured.
    #[error("the remote provider requires {0}")]
    Missing(&'static str),
}

/// Which identity provider adapter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Built-in demo directory.
    #[default]
    Local,
    /// Hosted auth + profiles backend.
    Remote,
}

impl ProviderKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::InvalidValue {
                setting: "provider",
                value: s.to_string(),
                reason: "expected 'local' or 'remote'",
            }),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity provider adapter.
    pub provider: ProviderKind,
    /// Base URL of the hosted backend (remote provider only).
    pub backend_url: Option<String>,
    /// Anonymous project key sent with every backend request.
    pub anon_key: Option<String>,
    /// Key-value storage file.
    pub storage_path: PathBuf,
    /// Bound on each provider call in seconds; `0` disables it.
    pub timeout_secs: u64,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Local,
            backend_url: None,
            anon_key: None,
            storage_path: default_storage_path(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults with the log filter taken from `QUOTECONNECT_LOG`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with the log filter taken from `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_VAR).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        config
    }

    /// Checks that the selected provider has what it needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the remote provider lacks its
    /// backend URL or anonymous key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == ProviderKind::Remote {
            if self.backend_url.is_none() {
                return Err(ConfigError::Missing("QUOTECONNECT_BACKEND_URL"));
            }
            if self.anon_key.is_none() {
                return Err(ConfigError::Missing("QUOTECONNECT_ANON_KEY"));
            }
        }
        Ok(())
    }

    /// Provider call bound, `None` when disabled.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
