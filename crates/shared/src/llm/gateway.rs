use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use serde_json::Value;
use thiserror::Error;

use super::contracts::GenerationIntent;
use super::prompts::PromptTemplate;
use crate::models::ChatTurn;

pub type LlmGenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<LlmGatewayResponse, LlmGatewayError>> + Send + 'a>>;

/// Incremental assistant-text deltas for one chat turn. The stream ends
/// when the provider finishes the turn; dropping it tears the request down.
pub type ChatTokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmGatewayError>> + Send>>;

pub type LlmChatFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatTokenStream, LlmGatewayError>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct LlmGatewayRequest {
    pub intent: GenerationIntent,
    pub system_prompt: String,
    pub user_prompt: String,
    pub output_schema: Option<Value>,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl LlmGatewayRequest {
    pub fn from_template(template: &PromptTemplate, user_prompt: String) -> Self {
        Self {
            intent: template.intent,
            system_prompt: template.system_prompt.to_string(),
            user_prompt,
            output_schema: template.output_schema.clone(),
            max_output_tokens: template.max_output_tokens,
            temperature: template.temperature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmChatRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatTurn>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub enum LlmOutput {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct LlmGatewayResponse {
    pub model: String,
    pub output: LlmOutput,
}

#[derive(Debug, Error)]
pub enum LlmGatewayError {
    #[error("llm provider request timed out")]
    Timeout,
    #[error("llm provider request failed: {0}")]
    ProviderFailure(String),
    #[error("llm provider returned an invalid payload: {0}")]
    InvalidProviderPayload(String),
}

pub trait LlmGateway: Send + Sync {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGenerateFuture<'a>;
    fn stream_chat<'a>(&'a self, request: LlmChatRequest) -> LlmChatFuture<'a>;
}
