//! Process configuration from environment variables

use crate::intervention::{MatchPolicy, DEFAULT_SENTINEL};
use crate::llm::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SUBSTANCE: &str = "Psilocybin mushrooms";
pub const DEFAULT_DOSE: &str = "3.5 grams";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings read once at startup
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub substance: String,
    pub dose: String,
    pub system_prompt_file: Option<PathBuf>,
    pub sentinel: String,
    pub sentinel_policy: MatchPolicy,
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let sentinel_policy = match var("TRIPSITTER_SENTINEL_POLICY") {
            Some(raw) => raw.parse::<MatchPolicy>().map_err(|reason| ConfigError::Invalid {
                var: "TRIPSITTER_SENTINEL_POLICY",
                reason,
            })?,
            None => MatchPolicy::default(),
        };

        let timeout_secs = match var("TRIPSITTER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "TRIPSITTER_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("TRIPSITTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            substance: var("TRIPSITTER_SUBSTANCE").unwrap_or_else(|| DEFAULT_SUBSTANCE.to_string()),
            dose: var("TRIPSITTER_DOSE").unwrap_or_else(|| DEFAULT_DOSE.to_string()),
            system_prompt_file: var("TRIPSITTER_SYSTEM_PROMPT_FILE").map(PathBuf::from),
            sentinel: var("TRIPSITTER_SENTINEL")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
            sentinel_policy,
            webhook_url: var("TRIPSITTER_WEBHOOK_URL"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
