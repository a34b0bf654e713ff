use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use super::contracts::{
    ContractError, GenerationIntent, StructuredOutput, output_schema, parse_structured,
};

#[derive(Debug, Error)]
pub enum OutputValidationError {
    #[error("model output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("schema for {intent} failed to compile: {message}")]
    SchemaCompile {
        intent: &'static str,
        message: String,
    },
    #[error("model output failed schema validation for {intent}: {errors:?}")]
    SchemaViolation {
        intent: &'static str,
        errors: Vec<String>,
    },
    #[error("quiz returned {actual} questions, expected {expected}")]
    QuestionCount { expected: usize, actual: usize },
    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub fn validate_output_value(
    intent: GenerationIntent,
    payload: &Value,
) -> Result<StructuredOutput, OutputValidationError> {
    let validator = validator_for_intent(intent)?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(OutputValidationError::SchemaViolation {
            intent: intent.as_str(),
            errors,
        });
    }

    parse_structured(intent, payload.clone()).map_err(OutputValidationError::from)
}

/// Request-dependent constraint: the quiz contract fixes option count and
/// answer range, but the question count is chosen per request.
pub fn ensure_question_count(
    output: &StructuredOutput,
    expected: usize,
) -> Result<(), OutputValidationError> {
    if let StructuredOutput::Quiz(quiz) = output {
        let actual = quiz.questions.len();
        if actual != expected {
            return Err(OutputValidationError::QuestionCount { expected, actual });
        }
    }
    Ok(())
}

/// Order-preserving id de-duplication for query-filter results. Duplicate
/// ids from the model are dropped, not treated as failures.
pub fn dedup_ids(ids: &mut Vec<u32>) {
    let mut seen = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        if seen.contains(id) {
            false
        } else {
            seen.push(*id);
            true
        }
    });
}

static COLOR_PROMPT_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| compile_validator(GenerationIntent::ColorPrompt));

static GAME_HINTS_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| compile_validator(GenerationIntent::GameHints));

static QUERY_FILTER_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| compile_validator(GenerationIntent::QueryFilter));

static QUIZ_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| compile_validator(GenerationIntent::Quiz));

static STORY_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| compile_validator(GenerationIntent::StoryStart));

fn compile_validator(intent: GenerationIntent) -> Result<JSONSchema, String> {
    let schema = output_schema(intent)
        .ok_or_else(|| format!("intent {} has no structured schema", intent.as_str()))?;
    JSONSchema::compile(&schema).map_err(|err| err.to_string())
}

fn validator_for_intent(
    intent: GenerationIntent,
) -> Result<&'static JSONSchema, OutputValidationError> {
    let validator_result = match intent {
        GenerationIntent::ColorPrompt => &*COLOR_PROMPT_VALIDATOR,
        GenerationIntent::GameHints => &*GAME_HINTS_VALIDATOR,
        GenerationIntent::QueryFilter => &*QUERY_FILTER_VALIDATOR,
        GenerationIntent::Quiz => &*QUIZ_VALIDATOR,
        GenerationIntent::StoryStart | GenerationIntent::StoryContinue => &*STORY_VALIDATOR,
        GenerationIntent::Chat | GenerationIntent::FunFact => {
            return Err(OutputValidationError::Contract(ContractError::FreeTextIntent(
                intent.as_str(),
            )));
        }
    };

    validator_result
        .as_ref()
        .map_err(|message| OutputValidationError::SchemaCompile {
            intent: intent.as_str(),
            message: message.clone(),
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        GenerationIntent, OutputValidationError, dedup_ids, ensure_question_count,
        validate_output_value,
    };
    use crate::llm::contracts::StructuredOutput;

    #[test]
    fn accepts_valid_color_prompt_payload() {
        let payload = json!({
            "prompt": "Draw a grass creature napping in the sun!",
            "colors": ["#4ECDC4", "#FFE66D", "#95E1D3", "#FF6B35"]
        });

        let parsed = validate_output_value(GenerationIntent::ColorPrompt, &payload)
            .expect("valid color prompt should pass");
        let StructuredOutput::ColorPrompt(output) = parsed else {
            panic!("expected color prompt output");
        };
        assert_eq!(output.colors.len(), 4);
    }

    #[test]
    fn rejects_color_prompt_with_wrong_color_count() {
        let payload = json!({
            "prompt": "Draw something fun!",
            "colors": ["#4ECDC4", "#FFE66D"]
        });

        let err = validate_output_value(GenerationIntent::ColorPrompt, &payload)
            .expect_err("two colors must fail validation");
        assert!(matches!(err, OutputValidationError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_quiz_with_out_of_range_correct_index() {
        let payload = json!({
            "questions": [{
                "question": "Which type is strong against fire?",
                "options": ["Water", "Grass", "Electric", "Normal"],
                "correctIndex": 4
            }]
        });

        let err = validate_output_value(GenerationIntent::Quiz, &payload)
            .expect_err("correctIndex past the last option must fail, never clamp");
        assert!(matches!(err, OutputValidationError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_query_filter_ids_outside_collection_range() {
        let payload = json!({
            "types": ["fire"],
            "traits": ["fast"],
            "ids": [6, 152]
        });

        let err = validate_output_value(GenerationIntent::QueryFilter, &payload)
            .expect_err("id 152 is outside the collection");
        assert!(matches!(err, OutputValidationError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_story_with_two_choices() {
        let payload = json!({
            "text": "The forest shimmered.",
            "choices": ["Go left", "Go right"]
        });

        let err = validate_output_value(GenerationIntent::StoryContinue, &payload)
            .expect_err("story must offer exactly three choices");
        assert!(matches!(err, OutputValidationError::SchemaViolation { .. }));
    }

    #[test]
    fn question_count_mismatch_is_a_failure() {
        let parsed = validate_output_value(
            GenerationIntent::Quiz,
            &json!({
                "questions": [{
                    "question": "Where do water creatures live?",
                    "options": ["Ocean", "Volcano", "Sky", "Desert"],
                    "correctIndex": 0
                }]
            }),
        )
        .expect("single valid question should pass the schema");

        assert!(ensure_question_count(&parsed, 1).is_ok());
        let err = ensure_question_count(&parsed, 5).expect_err("count mismatch must fail");
        assert!(matches!(
            err,
            OutputValidationError::QuestionCount {
                expected: 5,
                actual: 1
            }
        ));
    }

    #[test]
    fn dedup_ids_preserves_first_occurrence_order() {
        let mut ids = vec![25, 39, 25, 133, 39, 6];
        dedup_ids(&mut ids);
        assert_eq!(ids, vec![25, 39, 133, 6]);
    }
}
