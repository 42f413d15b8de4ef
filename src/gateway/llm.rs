use std::time::Duration;

use log::{error, info};
use serde_json::json;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::gateway::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::quiz::ai_helper::RemediationRequest;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("AI_GATEWAY_API_KEY is not configured")]
    MissingApiKey,
    #[error("rate limited by the AI gateway")]
    RateLimited,
    #[error("AI gateway requires payment")]
    PaymentRequired,
    #[error("AI gateway error: {0}")]
    Status(u16),
    #[error("AI gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected AI gateway response: {0}")]
    Malformed(String),
}

#[derive(Debug, serde::Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, serde::Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat-completion client of the upstream model.
pub struct LlmClient {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
    model: String,
}

impl LlmClient {
    pub fn new(
        api_key: Option<String>,
        url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            url: url.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        Self::new(
            Some(config.api_key.clone()),
            &config.upstream_url,
            &config.model,
            config.timeout,
        )
    }

    /// Returns the raw message content the model produced.
    pub async fn remediation_content(
        &self,
        request: &RemediationRequest,
    ) -> Result<String, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(request)},
            ],
            "temperature": 0.7,
            "response_format": {"type": "json_object"},
        });

        info!("Calling the AI gateway with model {}", self.model);
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("AI gateway error: {} {}", status, text);
            return Err(match status.as_u16() {
                429 => UpstreamError::RateLimited,
                402 => UpstreamError::PaymentRequired,
                code => UpstreamError::Status(code),
            });
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| UpstreamError::Malformed("no choices".to_string()))
    }
}
