use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_CURATION_HOUR: u32 = 7;
pub const DEFAULT_CURATION_MINUTE: u32 = 0;
pub const DEFAULT_FETCH_MAX: u32 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("{name}={value} is invalid: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Could not read .env file: {0}")]
    EnvFile(String),
}

/// Process configuration, read from the environment.
///
/// A `.env` file in the working directory (or a parent) fills in variables
/// the process environment does not set.
///
/// API keys are optional here so that read-only commands (history, feedback,
/// preferences) work without them; the commands that need a key ask for it
/// with [`CuratorConfig::gnews_api_key`] / [`CuratorConfig::anthropic_api_key`].
#[derive(Clone, PartialEq, Eq)]
pub struct CuratorConfig {
    gnews_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    /// Model identifier sent with every inference request.
    pub model: String,
    /// Overrides the platform data directory when set.
    pub db_path: Option<PathBuf>,
    pub curation_hour: u32,
    pub curation_minute: u32,
    /// Per-query article cap for searches.
    pub fetch_max: u32,
}

impl std::fmt::Debug for CuratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CuratorConfig")
            .field("gnews_api_key", &self.gnews_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("db_path", &self.db_path)
            .field("curation_hour", &self.curation_hour)
            .field("curation_minute", &self.curation_minute)
            .field("fetch_max", &self.fetch_max)
            .finish()
    }
}

impl CuratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match dotenvy::dotenv_iter() {
            Ok(iter) => read_env_file(iter)?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(ConfigError::EnvFile(e.to_string())),
        };
        Self::layered(|name| std::env::var(name).ok(), &file)
    }

    /// Like [`CuratorConfig::from_env`], with an explicit `.env` path and lookup.
    pub fn from_env_file<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        let file = read_env_file(iter)?;
        Self::layered(lookup, &file)
    }

    fn layered<F>(lookup: F, file: &HashMap<String, String>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !file.is_empty() {
            tracing::debug!("Read {} variables from .env", file.len());
        }
        Self::from_lookup(|name| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.get(name).cloned())
        })
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gnews_api_key: get("GNEWS_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            model: get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            db_path: get("NEWS_CURATOR_DB").map(PathBuf::from),
            curation_hour: parse_bounded("CURATION_HOUR", get("CURATION_HOUR"), DEFAULT_CURATION_HOUR, 23)?,
            curation_minute: parse_bounded(
                "CURATION_MINUTE",
                get("CURATION_MINUTE"),
                DEFAULT_CURATION_MINUTE,
                59,
            )?,
            fetch_max: parse_bounded("CURATOR_FETCH_MAX", get("CURATOR_FETCH_MAX"), DEFAULT_FETCH_MAX, 100)?,
        })
    }

    pub fn gnews_api_key(&self) -> Result<&str, ConfigError> {
        self.gnews_api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar("GNEWS_API_KEY"))
    }

    pub fn anthropic_api_key(&self) -> Result<&str, ConfigError> {
        self.anthropic_api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar("ANTHROPIC_API_KEY"))
    }
}

fn read_env_file<R: std::io::Read>(
    iter: dotenvy::Iter<R>,
) -> Result<HashMap<String, String>, ConfigError> {
    iter.map(|item| item.map_err(|e| ConfigError::EnvFile(e.to_string())))
        .collect()
}

fn parse_bounded(
    name: &'static str,
    raw: Option<String>,
    default: u32,
    max: u32,
) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let invalid = |reason: String| ConfigError::InvalidVar {
        name,
        value: raw.clone(),
        reason,
    };

    let value = u32::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if value > max {
        return Err(invalid(format!("must be at most {}", max)));
    }
    Ok(value)
}
