#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use shared::llm::gateway::{
    ChatTokenStream, LlmChatFuture, LlmChatRequest, LlmGateway, LlmGatewayError,
    LlmGatewayRequest, LlmGatewayResponse, LlmGenerateFuture, LlmOutput,
};
use shared::llm::safety::SafetyPolicy;
use tower::ServiceExt;

type ChunkResult = Result<String, LlmGatewayError>;

/// Fake model gateway with scripted replies. Out of script, every call
/// fails, which exercises the fallback path.
pub struct ScriptedGateway {
    generate_replies: Mutex<VecDeque<Result<LlmGatewayResponse, LlmGatewayError>>>,
    chat_reply: Mutex<Option<Result<Vec<ChunkResult>, LlmGatewayError>>>,
    pub seen_generate_requests: Mutex<Vec<LlmGatewayRequest>>,
    pub seen_chat_requests: Mutex<Vec<LlmChatRequest>>,
}

impl ScriptedGateway {
    pub fn unscripted() -> Arc<Self> {
        Arc::new(Self {
            generate_replies: Mutex::new(VecDeque::new()),
            chat_reply: Mutex::new(None),
            seen_generate_requests: Mutex::new(Vec::new()),
            seen_chat_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_json_reply(payload: Value) -> Arc<Self> {
        let gateway = Self::unscripted();
        gateway.push_json_reply(payload);
        gateway
    }

    pub fn with_text_reply(text: &str) -> Arc<Self> {
        let gateway = Self::unscripted();
        gateway
            .generate_replies
            .lock()
            .expect("generate script lock")
            .push_back(Ok(LlmGatewayResponse {
                model: "scripted-model".to_string(),
                output: LlmOutput::Text(text.to_string()),
            }));
        gateway
    }

    pub fn with_chat_chunks(chunks: Vec<&str>) -> Arc<Self> {
        let gateway = Self::unscripted();
        *gateway.chat_reply.lock().expect("chat script lock") = Some(Ok(chunks
            .into_iter()
            .map(|chunk| Ok(chunk.to_string()))
            .collect()));
        gateway
    }

    pub fn push_json_reply(&self, payload: Value) {
        self.generate_replies
            .lock()
            .expect("generate script lock")
            .push_back(Ok(LlmGatewayResponse {
                model: "scripted-model".to_string(),
                output: LlmOutput::Json(payload),
            }));
    }
}

impl LlmGateway for ScriptedGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGenerateFuture<'a> {
        self.seen_generate_requests
            .lock()
            .expect("request log lock")
            .push(request);
        let reply = self
            .generate_replies
            .lock()
            .expect("generate script lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmGatewayError::ProviderFailure(
                    "scripted_outage".to_string(),
                ))
            });
        Box::pin(async move { reply })
    }

    fn stream_chat<'a>(&'a self, request: LlmChatRequest) -> LlmChatFuture<'a> {
        self.seen_chat_requests
            .lock()
            .expect("request log lock")
            .push(request);
        let reply = self
            .chat_reply
            .lock()
            .expect("chat script lock")
            .take()
            .unwrap_or_else(|| {
                Err(LlmGatewayError::ProviderFailure(
                    "scripted_outage".to_string(),
                ))
            });
        Box::pin(async move {
            reply.map(|chunks| Box::pin(futures::stream::iter(chunks)) as ChatTokenStream)
        })
    }
}

pub fn build_test_router(gateway: Arc<ScriptedGateway>) -> Router {
    api_server::http::build_router(api_server::http::AppState {
        gateway,
        safety: Arc::new(SafetyPolicy::default()),
    })
}

pub struct JsonReply {
    pub status: StatusCode,
    pub body: Value,
}

pub async fn post_json(app: &Router, path: &str, body: Value) -> JsonReply {
    let response = send(app, json_request(path, body)).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should collect");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    JsonReply { status, body }
}

/// Drives a streaming endpoint to completion and returns the raw SSE body.
pub async fn post_for_sse(app: &Router, path: &str, body: Value) -> (StatusCode, String) {
    let response = send(app, json_request(path, body)).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("sse body should collect");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

pub fn error_code(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(|error| error.get("code"))
        .and_then(Value::as_str)
}

fn json_request(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}
