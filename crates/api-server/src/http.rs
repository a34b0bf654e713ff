use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::llm::LlmGateway;
use shared::llm::safety::SafetyPolicy;
use shared::models::OkResponse;

mod chat;
mod errors;
mod generate;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn LlmGateway>,
    pub safety: Arc<SafetyPolicy>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/generate/chat", post(chat::chat))
        .route("/v1/generate/color-prompt", post(generate::color_prompt))
        .route("/v1/generate/fun-fact", post(generate::fun_fact))
        .route("/v1/generate/game-hints", post(generate::game_hints))
        .route("/v1/generate/query-filter", post(generate::query_filter))
        .route("/v1/generate/quiz", post(generate::quiz))
        .route("/v1/generate/story", post(generate::story))
        .with_state(app_state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(OkResponse { ok: true }))
}
