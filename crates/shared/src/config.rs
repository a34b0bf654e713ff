use thiserror::Error;

use crate::config_env::{optional_trimmed_env, parse_list_env};
use crate::llm::safety::DEFAULT_BLOCKED_PATTERNS;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub blocked_patterns: Vec<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: optional_trimmed_env("GATEWAY_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            blocked_patterns: parse_list_env("GATEWAY_BLOCKED_PATTERNS", DEFAULT_BLOCKED_PATTERNS),
        })
    }
}
