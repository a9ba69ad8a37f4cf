//! Startup configuration.
//!
//! Values are resolved as: explicit override (command line) > environment >
//! default. The binary loads `.env` before calling [`Config::from_env`].

use std::time::Duration;

use crate::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};
use crate::tools::search::DEFAULT_SEARCH_URL;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "TRAVEL_DESK_MODEL";
pub const ENV_FIRST_NAME: &str = "TRAVEL_DESK_FIRST_NAME";
pub const ENV_MAX_TURNS: &str = "TRAVEL_DESK_MAX_TURNS";
pub const ENV_SEARCH_URL: &str = "TRAVEL_DESK_SEARCH_URL";

pub const FLAG_MAX_TURNS: &str = "--max-turns";

pub const DEFAULT_FIRST_NAME: &str = "James";
pub const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Model for agents without their own model (router, guardrails).
    pub model: String,
    pub first_name: String,
    pub max_turns: usize,
    pub search_url: String,
    pub http_timeout: Duration,
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub first_name: Option<String>,
    pub max_turns: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY).ok_or(ConfigError::MissingApiKey(ENV_API_KEY))?;

        let max_turns = match get(ENV_MAX_TURNS) {
            Some(value) => parse_positive(ENV_MAX_TURNS, &value)?,
            None => DEFAULT_MAX_TURNS,
        };

        Ok(Self {
            api_key,
            base_url: get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            first_name: get(ENV_FIRST_NAME).unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
            max_turns,
            search_url: get(ENV_SEARCH_URL).unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            http_timeout: Duration::from_secs(60),
        })
    }

    /// Layer command-line values over this config. They are validated like
    /// their environment counterparts.
    pub fn apply(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(first_name) = overrides.first_name {
            self.first_name = first_name;
        }
        if let Some(max_turns) = overrides.max_turns {
            if max_turns == 0 {
                return Err(ConfigError::InvalidNumber {
                    key: FLAG_MAX_TURNS,
                    value: max_turns.to_string(),
                });
            }
            self.max_turns = max_turns;
        }
        Ok(self)
    }

    pub fn openai(&self) -> OpenAiConfig {
        OpenAiConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_default_model(self.model.clone())
            .with_timeout(self.http_timeout)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}
