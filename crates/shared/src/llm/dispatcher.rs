use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::context::GenerationContext;
use super::contracts::StructuredOutput;
use super::fallback;
use super::gateway::{LlmGateway, LlmGatewayError, LlmGatewayRequest, LlmOutput};
use super::prompts::{OutputMode, template_for_intent, user_prompt};
use super::validation::{
    OutputValidationError, dedup_ids, ensure_question_count, validate_output_value,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedValue {
    Structured(StructuredOutput),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub value: GeneratedValue,
    pub source: OutputSource,
}

#[derive(Debug, Error)]
enum GenerationFailure {
    #[error(transparent)]
    Gateway(#[from] LlmGatewayError),
    #[error(transparent)]
    Validation(#[from] OutputValidationError),
    #[error("model returned empty text")]
    EmptyText,
    #[error("model returned {got} output where {expected} was requested")]
    WrongOutputKind {
        expected: &'static str,
        got: &'static str,
    },
}

/// Runs one generation request end to end. Never fails: any gateway or
/// validation error is replaced by the intent's deterministic fallback, so
/// the returned value always conforms to the intent's contract.
pub async fn generate(gateway: &dyn LlmGateway, context: &GenerationContext) -> GenerationOutcome {
    let intent = context.intent();
    match attempt_model_output(gateway, context).await {
        Ok(value) => GenerationOutcome {
            value,
            source: OutputSource::Model,
        },
        Err(err) => {
            warn!(intent = intent.as_str(), error = %err, "generation failed");
            info!(intent = intent.as_str(), "substituting deterministic fallback");
            GenerationOutcome {
                value: fallback::synthesize(context),
                source: OutputSource::Fallback,
            }
        }
    }
}

async fn attempt_model_output(
    gateway: &dyn LlmGateway,
    context: &GenerationContext,
) -> Result<GeneratedValue, GenerationFailure> {
    let template = template_for_intent(context.intent());
    let mode = template.mode;
    let request = LlmGatewayRequest::from_template(&template, user_prompt(context));
    let response = gateway.generate(request).await?;

    match (mode, response.output) {
        (OutputMode::FreeText, LlmOutput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(GenerationFailure::EmptyText);
            }
            Ok(GeneratedValue::Text(trimmed.to_string()))
        }
        (OutputMode::Structured, LlmOutput::Json(payload)) => {
            let mut output = validate_output_value(context.intent(), &payload)?;
            apply_request_constraints(context, &mut output)?;
            Ok(GeneratedValue::Structured(output))
        }
        (OutputMode::FreeText, LlmOutput::Json(_)) => Err(GenerationFailure::WrongOutputKind {
            expected: "text",
            got: "json",
        }),
        (OutputMode::Structured, LlmOutput::Text(_)) => Err(GenerationFailure::WrongOutputKind {
            expected: "json",
            got: "text",
        }),
    }
}

fn apply_request_constraints(
    context: &GenerationContext,
    output: &mut StructuredOutput,
) -> Result<(), GenerationFailure> {
    match context {
        GenerationContext::Quiz { count } => {
            ensure_question_count(output, *count)?;
        }
        GenerationContext::QueryFilter { .. } => {
            if let StructuredOutput::QueryFilter(filter) = output {
                dedup_ids(&mut filter.ids);
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::{GeneratedValue, OutputSource, generate};
    use crate::llm::context::GenerationContext;
    use crate::llm::contracts::StructuredOutput;
    use crate::llm::gateway::{
        LlmChatFuture, LlmChatRequest, LlmGateway, LlmGatewayError, LlmGatewayRequest,
        LlmGatewayResponse, LlmGenerateFuture, LlmOutput,
    };

    struct ScriptedGateway {
        result: Mutex<Option<Result<LlmGatewayResponse, LlmGatewayError>>>,
        seen_requests: Mutex<Vec<LlmGatewayRequest>>,
    }

    impl ScriptedGateway {
        fn returning(result: Result<LlmGatewayResponse, LlmGatewayError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                seen_requests: Mutex::new(Vec::new()),
            }
        }

        fn json_response(payload: serde_json::Value) -> Self {
            Self::returning(Ok(LlmGatewayResponse {
                model: "scripted-model".to_string(),
                output: LlmOutput::Json(payload),
            }))
        }

        fn failing() -> Self {
            Self::returning(Err(LlmGatewayError::ProviderFailure(
                "scripted_outage".to_string(),
            )))
        }
    }

    impl LlmGateway for ScriptedGateway {
        fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGenerateFuture<'a> {
            self.seen_requests
                .lock()
                .expect("request log lock")
                .push(request);
            let result = self
                .result
                .lock()
                .expect("scripted result lock")
                .take()
                .expect("scripted gateway called more than once");
            Box::pin(async move { result })
        }

        fn stream_chat<'a>(&'a self, _request: LlmChatRequest) -> LlmChatFuture<'a> {
            Box::pin(async {
                Err(LlmGatewayError::ProviderFailure(
                    "stream_chat not scripted".to_string(),
                ))
            })
        }
    }

    fn hints_context() -> GenerationContext {
        GenerationContext::GameHints {
            name: "Sparky".to_string(),
            types: vec!["electric".to_string()],
            id: 25,
        }
    }

    #[tokio::test]
    async fn valid_model_output_passes_through() {
        let gateway = ScriptedGateway::json_response(json!({
            "hints": ["It loves to nap.", "It crackles with energy.", "It has yellow fur!"]
        }));

        let outcome = generate(&gateway, &hints_context()).await;

        assert_eq!(outcome.source, OutputSource::Model);
        let GeneratedValue::Structured(StructuredOutput::GameHints(hints)) = outcome.value else {
            panic!("expected structured hints");
        };
        assert_eq!(hints.hints.len(), 3);
    }

    #[tokio::test]
    async fn schema_violation_falls_back_to_conformant_content() {
        let gateway = ScriptedGateway::json_response(json!({
            "hints": ["only", "two hints"]
        }));

        let outcome = generate(&gateway, &hints_context()).await;

        assert_eq!(outcome.source, OutputSource::Fallback);
        let GeneratedValue::Structured(StructuredOutput::GameHints(hints)) = outcome.value else {
            panic!("expected structured hints");
        };
        assert_eq!(hints.hints.len(), 3);
    }

    #[tokio::test]
    async fn provider_outage_yields_canned_fun_fact() {
        let gateway = ScriptedGateway::failing();
        let context = GenerationContext::FunFact {
            name: "Charlie".to_string(),
            types: vec!["fire".to_string(), "flying".to_string()],
        };

        let outcome = generate(&gateway, &context).await;

        assert_eq!(outcome.source, OutputSource::Fallback);
        assert_eq!(
            outcome.value,
            GeneratedValue::Text(
                "Charlie is a wonderful fire and flying type friend who loves making new friends!"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn out_of_range_correct_index_is_failure_not_clamped() {
        let gateway = ScriptedGateway::json_response(json!({
            "questions": [{
                "question": "Which type is strong against fire?",
                "options": ["Water", "Grass", "Electric", "Normal"],
                "correctIndex": 7
            }]
        }));

        let outcome = generate(&gateway, &GenerationContext::Quiz { count: 1 }).await;

        assert_eq!(outcome.source, OutputSource::Fallback);
        let GeneratedValue::Structured(StructuredOutput::Quiz(quiz)) = outcome.value else {
            panic!("expected quiz output");
        };
        assert_eq!(quiz.questions.len(), 1);
        assert!(quiz.questions[0].correct_index < 4);
    }

    #[tokio::test]
    async fn quiz_count_mismatch_falls_back_with_requested_count() {
        let gateway = ScriptedGateway::json_response(json!({
            "questions": [{
                "question": "Where do water creatures live?",
                "options": ["Ocean", "Volcano", "Sky", "Desert"],
                "correctIndex": 0
            }]
        }));

        let outcome = generate(&gateway, &GenerationContext::Quiz { count: 3 }).await;

        assert_eq!(outcome.source, OutputSource::Fallback);
        let GeneratedValue::Structured(StructuredOutput::Quiz(quiz)) = outcome.value else {
            panic!("expected quiz output");
        };
        assert_eq!(quiz.questions.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_filter_ids_are_deduplicated_before_return() {
        let gateway = ScriptedGateway::json_response(json!({
            "types": ["electric"],
            "traits": ["cute"],
            "ids": [25, 39, 25, 133, 39]
        }));

        let outcome = generate(
            &gateway,
            &GenerationContext::QueryFilter {
                query: "cute and small".to_string(),
            },
        )
        .await;

        assert_eq!(outcome.source, OutputSource::Model);
        let GeneratedValue::Structured(StructuredOutput::QueryFilter(filter)) = outcome.value
        else {
            panic!("expected query filter output");
        };
        assert_eq!(filter.ids, vec![25, 39, 133]);
    }

    #[tokio::test]
    async fn structured_request_carries_schema_and_prompt_fields() {
        let gateway = ScriptedGateway::json_response(json!({
            "hints": ["one", "two", "three"]
        }));

        generate(&gateway, &hints_context()).await;

        let seen = gateway.seen_requests.lock().expect("request log lock");
        assert_eq!(seen.len(), 1);
        assert!(seen[0].output_schema.is_some());
        assert!(seen[0].user_prompt.contains("Sparky"));
        assert!(seen[0].user_prompt.contains("#25"));
    }
}
