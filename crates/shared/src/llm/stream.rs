use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fallback::DEGRADED_CHAT_REPLY;
use super::gateway::{LlmChatRequest, LlmGateway};
use super::prompts::{CHAT_MAX_OUTPUT_TOKENS, CHAT_SYSTEM_PROMPT};
use super::safety::{SAFE_REDIRECT_PROMPT, SafetyPolicy, SafetyVerdict};
use crate::models::{ChatRole, ChatTurn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    Delta(String),
    Done,
}

/// Lifecycle of one chat turn. `Idle` is the pre-`run` state; `run` returns
/// the terminal phase. A cancelled turn never reaches `Done` and emits
/// nothing after cancellation is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Idle,
    Dispatching,
    Streaming,
    Done,
    Cancelled,
}

/// Relays one chat turn from the model to the caller as incremental
/// deltas. Each relay serves exactly one turn; the HTTP layer builds a
/// fresh one per request, so turns can never interleave.
pub struct StreamRelay<'a> {
    gateway: &'a dyn LlmGateway,
    policy: &'a SafetyPolicy,
}

impl<'a> StreamRelay<'a> {
    pub fn new(gateway: &'a dyn LlmGateway, policy: &'a SafetyPolicy) -> Self {
        Self { gateway, policy }
    }

    pub async fn run(
        &self,
        messages: Vec<ChatTurn>,
        cancel: CancellationToken,
        tx: UnboundedSender<ChatStreamEvent>,
    ) -> RelayPhase {
        if cancel.is_cancelled() {
            return RelayPhase::Cancelled;
        }

        let mut phase = RelayPhase::Dispatching;
        debug!(?phase, "chat turn dispatching");

        let (request, verdict) = assemble_chat_request(self.policy, messages);
        if verdict.blocked {
            info!(
                reason = verdict.reason.as_deref().unwrap_or("unspecified"),
                "chat input blocked by safety policy; substituting redirect prompt"
            );
        }

        let mut stream = match self.gateway.stream_chat(request).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "chat dispatch failed; delivering degraded turn");
                return deliver_degraded_turn(&cancel, &tx);
            }
        };

        phase = RelayPhase::Streaming;
        debug!(?phase, "chat turn streaming");

        let mut delivered_any = false;
        loop {
            tokio::select! {
                // Cancellation wins over a ready chunk, so nothing is
                // emitted once the token fires.
                biased;
                _ = cancel.cancelled() => {
                    debug!("chat turn cancelled");
                    return RelayPhase::Cancelled;
                }
                next = stream.next() => match next {
                    Some(Ok(delta)) => {
                        if delta.is_empty() {
                            continue;
                        }
                        if tx.send(ChatStreamEvent::Delta(delta)).is_err() {
                            return RelayPhase::Cancelled;
                        }
                        delivered_any = true;
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "chat stream failed mid-turn");
                        if delivered_any {
                            // Partial text already reached the child; close
                            // the turn rather than restarting it.
                            let _ = tx.send(ChatStreamEvent::Done);
                            return RelayPhase::Done;
                        }
                        return deliver_degraded_turn(&cancel, &tx);
                    }
                    None => {
                        let _ = tx.send(ChatStreamEvent::Done);
                        return RelayPhase::Done;
                    }
                }
            }
        }
    }
}

/// Safety check plus prompt assembly. A blocked verdict swaps the latest
/// user message for the redirect prompt; earlier turns are kept so the
/// reply stays on-topic for the conversation.
pub fn assemble_chat_request(
    policy: &SafetyPolicy,
    mut messages: Vec<ChatTurn>,
) -> (LlmChatRequest, SafetyVerdict) {
    let verdict = messages
        .iter()
        .rev()
        .find(|turn| turn.role == ChatRole::User)
        .map(|turn| policy.check(&turn.text))
        .unwrap_or(SafetyVerdict {
            blocked: false,
            reason: None,
        });

    if verdict.blocked
        && let Some(turn) = messages
            .iter_mut()
            .rev()
            .find(|turn| turn.role == ChatRole::User)
    {
        turn.text = SAFE_REDIRECT_PROMPT.to_string();
    }

    (
        LlmChatRequest {
            system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
            messages,
            max_output_tokens: CHAT_MAX_OUTPUT_TOKENS,
        },
        verdict,
    )
}

fn deliver_degraded_turn(
    cancel: &CancellationToken,
    tx: &UnboundedSender<ChatStreamEvent>,
) -> RelayPhase {
    if cancel.is_cancelled() {
        return RelayPhase::Cancelled;
    }
    if tx
        .send(ChatStreamEvent::Delta(DEGRADED_CHAT_REPLY.to_string()))
        .is_err()
    {
        return RelayPhase::Cancelled;
    }
    let _ = tx.send(ChatStreamEvent::Done);
    RelayPhase::Done
}
