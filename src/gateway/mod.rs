//! Server side of the remediation flow: a single CORS-open endpoint that
//! turns a missed question into an explanation and a fresh practice question
//! by asking an upstream chat-completion model.

pub mod handler;
pub mod llm;
pub mod prompt;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    routing::post,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::quiz::ai_helper::HELPER_PATH;
use llm::LlmClient;

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<LlmClient>,
}

impl AppState {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm: Arc::new(llm) }
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(HELPER_PATH, post(handler::quiz_ai_helper))
        .layer(cors())
        .with_state(state)
}
