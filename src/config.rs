use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_UPSTREAM_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("AI_GATEWAY_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings of the remediation gateway server.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub api_key: String,
    pub upstream_url: String,
    pub model: String,
    pub addr: SocketAddr,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("AI_GATEWAY_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let addr_raw = lookup("QUIZ_HELPER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "QUIZ_HELPER_ADDR",
            value: addr_raw.clone(),
        })?;

        let timeout = match lookup("AI_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "AI_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            upstream_url: lookup("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            addr,
            timeout,
        })
    }
}
