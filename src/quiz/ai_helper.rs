use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;

use crate::quiz::{Answer, Question};

pub const HELPER_PATH: &str = "/quiz-ai-helper";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Context of a missed question, as sent to the remediation gateway.
/// Missing fields deserialize as empty, the way browsers drop `undefined`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemediationRequest {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    pub attempt_count: u32,
}

impl RemediationRequest {
    /// Builds the request for a wrong `selected` answer to `question`.
    pub fn for_answer(question: &Question, selected: &str, attempt_count: u32) -> Self {
        let text_of = |answer: Option<&Answer>| answer.map(|a| a.text.clone()).unwrap_or_default();
        Self {
            question: question.question.clone(),
            user_answer: text_of(question.option(selected)),
            correct_answer: text_of(question.correct_option()),
            explanation: question.explanation.clone(),
            attempt_count,
        }
    }
}

/// Replacement question as generated by the gateway. It has no id and no
/// explanation of its own; both come from the question it replaces.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<Answer>,
}

impl GeneratedQuestion {
    pub fn into_retry_of(self, original: &Question) -> Question {
        Question {
            id: format!("{}_retry", original.id),
            question: self.question,
            options: self.options,
            explanation: original.explanation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemediationReply {
    Explained {
        explanation: String,
        new_question: Option<GeneratedQuestion>,
    },
    /// The gateway could not reach the model (rate limit, unpaid balance) and
    /// sent back a fallback explanation together with a user-facing notice.
    Degraded { notice: String, explanation: String },
}

#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("remediation gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remediation gateway answered with status {0}")]
    Status(u16),
    #[error("malformed remediation response: {0}")]
    Malformed(String),
    #[error("remediation timed out after {0:?}")]
    TimedOut(Duration),
}

#[async_trait]
pub trait Remediator: Send + Sync {
    async fn remediate(
        &self,
        request: &RemediationRequest,
    ) -> Result<RemediationReply, RemediationError>;
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelperResponse {
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    new_question: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client of the `/quiz-ai-helper` endpoint.
pub struct RemediationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RemediationClient {
    pub fn new(base_url: &str) -> Result<Self, RemediationError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RemediationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), HELPER_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Remediator for RemediationClient {
    async fn remediate(
        &self,
        request: &RemediationRequest,
    ) -> Result<RemediationReply, RemediationError> {
        debug!("Requesting remediation for question: {:?}", request.question);

        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Remediation gateway answered with status {}", status);
            return Err(RemediationError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: HelperResponse = serde_json::from_str(&body)
            .map_err(|e| RemediationError::Malformed(e.to_string()))?;

        if let Some(notice) = parsed.error {
            return Ok(RemediationReply::Degraded {
                notice,
                explanation: parsed
                    .explanation
                    .unwrap_or_else(|| request.explanation.clone()),
            });
        }

        // A broken replacement question must not cost us the explanation.
        let new_question = parsed.new_question.and_then(|value| {
            serde_json::from_value::<GeneratedQuestion>(value)
                .map_err(|e| warn!("Ignoring unparseable replacement question: {}", e))
                .ok()
        });

        match parsed.explanation {
            Some(explanation) => Ok(RemediationReply::Explained {
                explanation,
                new_question,
            }),
            None => Err(RemediationError::Malformed(
                "response has no explanation".to_string(),
            )),
        }
    }
}
