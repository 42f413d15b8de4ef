use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info, warn};
use serde_json::{json, Value};

use crate::gateway::llm::UpstreamError;
use crate::gateway::AppState;
use crate::quiz::ai_helper::RemediationRequest;

pub const RATE_LIMIT_NOTICE: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_NOTICE: &str = "AI credits are exhausted. Please top up the balance to use AI help.";
pub const GENERIC_RETRY: &str = "Something went wrong while processing the request. Please try again.";

pub async fn quiz_ai_helper(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RemediationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Error in quiz-ai-helper: invalid request body: {}", e);
            return internal_error(&format!("invalid request body: {}", e));
        }
    };

    match state.llm.remediation_content(&request).await {
        Ok(content) => {
            info!("AI response: {}", content);
            (StatusCode::OK, Json(relay(content))).into_response()
        }
        Err(UpstreamError::RateLimited) => degraded(RATE_LIMIT_NOTICE, &request.explanation),
        Err(UpstreamError::PaymentRequired) => degraded(PAYMENT_NOTICE, &request.explanation),
        Err(e) => {
            error!("Error in quiz-ai-helper: {}", e);
            internal_error(&e.to_string())
        }
    }
}

/// Model output is passed through as-is when it is JSON, otherwise the raw
/// text becomes the explanation.
fn relay(content: String) -> Value {
    match serde_json::from_str::<Value>(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Failed to parse AI response as JSON: {}", e);
            json!({ "explanation": content, "newQuestion": null })
        }
    }
}

fn degraded(notice: &str, explanation: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "error": notice, "explanation": explanation })),
    )
        .into_response()
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message, "explanation": GENERIC_RETRY })),
    )
        .into_response()
}
