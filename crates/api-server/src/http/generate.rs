use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::{GeneratedValue, GenerationContext, dispatcher};
use shared::models::{
    FunFactRequest, FunFactResponse, GameHintsRequest, QueryFilterRequest, QuizRequest,
    StoryRequest,
};

use super::AppState;
use super::errors::{bad_request_response, internal_error_response};

const QUIZ_COUNT_MIN: u32 = 1;
const QUIZ_COUNT_MAX: u32 = 10;

pub(super) async fn color_prompt(State(state): State<AppState>) -> Response {
    structured_response(state, GenerationContext::ColorPrompt).await
}

pub(super) async fn fun_fact(
    State(state): State<AppState>,
    Json(req): Json<FunFactRequest>,
) -> Response {
    let name = req.name.trim();
    if name.is_empty() {
        return bad_request_response("invalid_name", "Name must not be empty");
    }

    let context = GenerationContext::FunFact {
        name: name.to_string(),
        types: normalized_types(req.types),
    };
    let outcome = dispatcher::generate(state.gateway.as_ref(), &context).await;
    match outcome.value {
        GeneratedValue::Text(fact) => {
            (StatusCode::OK, Json(FunFactResponse { fact })).into_response()
        }
        GeneratedValue::Structured(_) => internal_error_response(),
    }
}

pub(super) async fn game_hints(
    State(state): State<AppState>,
    Json(req): Json<GameHintsRequest>,
) -> Response {
    let name = req.name.trim();
    if name.is_empty() {
        return bad_request_response("invalid_name", "Name must not be empty");
    }

    structured_response(
        state,
        GenerationContext::GameHints {
            name: name.to_string(),
            types: normalized_types(req.types),
            id: req.id,
        },
    )
    .await
}

pub(super) async fn query_filter(
    State(state): State<AppState>,
    Json(req): Json<QueryFilterRequest>,
) -> Response {
    let query = req.query.trim();
    if query.is_empty() {
        return bad_request_response("invalid_query", "Query must not be empty");
    }

    structured_response(
        state,
        GenerationContext::QueryFilter {
            query: query.to_string(),
        },
    )
    .await
}

pub(super) async fn quiz(State(state): State<AppState>, Json(req): Json<QuizRequest>) -> Response {
    if !(QUIZ_COUNT_MIN..=QUIZ_COUNT_MAX).contains(&req.count) {
        return bad_request_response(
            "invalid_count",
            "Question count must be between 1 and 10",
        );
    }

    structured_response(
        state,
        GenerationContext::Quiz {
            count: req.count as usize,
        },
    )
    .await
}

pub(super) async fn story(
    State(state): State<AppState>,
    Json(req): Json<StoryRequest>,
) -> Response {
    let context = match req {
        StoryRequest::Start {
            hero_name,
            creature_type,
            setting,
        } => {
            let hero_name = hero_name.trim();
            if hero_name.is_empty() {
                return bad_request_response("invalid_hero_name", "Hero name must not be empty");
            }
            GenerationContext::StoryStart {
                hero_name: hero_name.to_string(),
                creature_type: creature_type.trim().to_string(),
                setting: setting.trim().to_string(),
            }
        }
        StoryRequest::Continue {
            hero_name,
            previous_text,
            chosen_option,
        } => {
            let hero_name = hero_name.trim();
            if hero_name.is_empty() {
                return bad_request_response("invalid_hero_name", "Hero name must not be empty");
            }
            let previous_text = previous_text.trim();
            if previous_text.is_empty() {
                return bad_request_response(
                    "invalid_previous_text",
                    "Story continuation requires the story so far",
                );
            }
            GenerationContext::StoryContinue {
                hero_name: hero_name.to_string(),
                previous_text: previous_text.to_string(),
                chosen_option: chosen_option.trim().to_string(),
            }
        }
    };

    structured_response(state, context).await
}

async fn structured_response(state: AppState, context: GenerationContext) -> Response {
    let outcome = dispatcher::generate(state.gateway.as_ref(), &context).await;
    match outcome.value {
        value @ GeneratedValue::Structured(_) => (StatusCode::OK, Json(value)).into_response(),
        GeneratedValue::Text(_) => internal_error_response(),
    }
}

fn normalized_types(types: Vec<String>) -> Vec<String> {
    types
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
