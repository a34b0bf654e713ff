use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use shared::llm::stream::{ChatStreamEvent, StreamRelay};
use shared::models::{ChatRequest, ChatRole};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use super::errors::bad_request_response;

/// Terminal marker for a completed turn. A cancelled stream ends without it.
const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum StreamChunk {
    Start {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
}

pub(super) async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let Some(last) = req.messages.last() else {
        return bad_request_response("invalid_messages", "At least one message is required");
    };
    if last.role != ChatRole::User {
        return bad_request_response(
            "invalid_messages",
            "The latest message must be from the user",
        );
    }
    if last.text.trim().is_empty() {
        return bad_request_response("invalid_messages", "The latest message must not be empty");
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let relay_cancel = cancel.clone();
    let gateway = state.gateway.clone();
    let safety = state.safety.clone();
    let messages = req.messages;

    tokio::spawn(async move {
        let relay = StreamRelay::new(gateway.as_ref(), safety.as_ref());
        let phase = relay.run(messages, relay_cancel, tx).await;
        debug!(?phase, "chat turn finished");
    });

    let message_id = Uuid::new_v4().to_string();
    // Client abort drops the response stream, which cancels the relay.
    let guard = cancel.drop_guard();

    let start_chunk = StreamChunk::Start {
        message_id: message_id.clone(),
    };
    let events = UnboundedReceiverStream::new(rx).map(move |event| {
        let _guard = &guard;
        match event {
            ChatStreamEvent::Delta(delta) => SseEvent::default().json_data(StreamChunk::TextDelta {
                id: message_id.clone(),
                delta,
            }),
            ChatStreamEvent::Done => Ok(SseEvent::default().data(STREAM_DONE)),
        }
    });
    let chunks = stream::once(async move { SseEvent::default().json_data(start_chunk) }).chain(events);

    Sse::new(chunks)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(1))
                .text("keep-alive"),
        )
        .into_response()
}
