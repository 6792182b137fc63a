//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! overrides. CLI flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use whatif_core::{CompletionSettings, ForecastEngine};

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5001";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Forecast settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Year projections start from; current UTC year when absent
    pub present_year: Option<i32>,
}

impl ForecastSettings {
    /// Engine for these settings
    #[must_use]
    pub fn engine(&self) -> ForecastEngine {
        self.present_year
            .map_or_else(ForecastEngine::current, ForecastEngine::new)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub log_json: bool,
    /// JSON file backing the store; in-memory when absent
    pub store_path: Option<PathBuf>,
    pub completion: CompletionSettings,
    pub forecast: ForecastSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5001)),
            log_json: false,
            store_path: None,
            completion: CompletionSettings::default(),
            forecast: ForecastSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Parse a TOML file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = var("WHATIF_BIND") {
            self.bind = parse_env("WHATIF_BIND", value)?;
        }
        if let Some(value) = var("WHATIF_LOG_JSON") {
            self.log_json = parse_bool("WHATIF_LOG_JSON", value)?;
        }
        if let Some(value) = var("WHATIF_STORE_PATH") {
            self.store_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("WHATIF_COMPLETION_ENDPOINT") {
            self.completion.endpoint = value;
        }
        if let Some(value) = var("WHATIF_COMPLETION_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.completion.api_key = Some(value);
        }
        if let Some(value) = var("WHATIF_COMPLETION_MODEL") {
            self.completion.model = value;
        }
        if let Some(value) = var("WHATIF_COMPLETION_TIMEOUT_SECS") {
            self.completion.timeout_secs = parse_env("WHATIF_COMPLETION_TIMEOUT_SECS", value)?;
        }

        Ok(self)
    }

    /// With listen address
    #[inline]
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// With store file
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { name, value }),
    }
}
