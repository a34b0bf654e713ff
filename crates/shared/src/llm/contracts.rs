use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CREATURE_ID_MIN: u32 = 1;
pub const CREATURE_ID_MAX: u32 = 151;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationIntent {
    Chat,
    ColorPrompt,
    FunFact,
    GameHints,
    QueryFilter,
    Quiz,
    StoryStart,
    StoryContinue,
}

impl GenerationIntent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ColorPrompt => "color-prompt",
            Self::FunFact => "fun-fact",
            Self::GameHints => "game-hints",
            Self::QueryFilter => "query-filter",
            Self::Quiz => "quiz",
            Self::StoryStart => "story-start",
            Self::StoryContinue => "story-continue",
        }
    }

    /// Chat and fun-fact are free-text intents; everything else must emit a
    /// payload conforming to its output contract.
    pub const fn is_structured(self) -> bool {
        !matches!(self, Self::Chat | Self::FunFact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ColorPromptOutput {
    pub prompt: String,
    #[schemars(length(min = 4, max = 4))]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GameHintsOutput {
    #[schemars(length(min = 3, max = 3))]
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryFilterOutput {
    pub types: Vec<String>,
    pub traits: Vec<String>,
    #[schemars(inner(range(min = 1, max = 151)))]
    pub ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuizOutput {
    #[schemars(length(min = 1))]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuizQuestion {
    pub question: String,
    #[schemars(length(min = 4, max = 4))]
    pub options: Vec<String>,
    #[schemars(range(min = 0, max = 3))]
    pub correct_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StoryOutput {
    pub text: String,
    #[schemars(length(min = 3, max = 3))]
    pub choices: Vec<String>,
}

/// A validated structured payload, ready to serialize as the endpoint's
/// response body (untagged, so the wire shape is the contract itself).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredOutput {
    ColorPrompt(ColorPromptOutput),
    GameHints(GameHintsOutput),
    QueryFilter(QueryFilterOutput),
    Quiz(QuizOutput),
    Story(StoryOutput),
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("output contract payload is invalid: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("intent {0} has no structured output contract")]
    FreeTextIntent(&'static str),
}

pub fn output_schema(intent: GenerationIntent) -> Option<Value> {
    let schema = match intent {
        GenerationIntent::Chat | GenerationIntent::FunFact => return None,
        GenerationIntent::ColorPrompt => serde_json::to_value(schema_for!(ColorPromptOutput)),
        GenerationIntent::GameHints => serde_json::to_value(schema_for!(GameHintsOutput)),
        GenerationIntent::QueryFilter => serde_json::to_value(schema_for!(QueryFilterOutput)),
        GenerationIntent::Quiz => serde_json::to_value(schema_for!(QuizOutput)),
        GenerationIntent::StoryStart | GenerationIntent::StoryContinue => {
            serde_json::to_value(schema_for!(StoryOutput))
        }
    };
    Some(schema.expect("output schema should be serializable"))
}

pub fn parse_structured(
    intent: GenerationIntent,
    payload: Value,
) -> Result<StructuredOutput, ContractError> {
    match intent {
        GenerationIntent::Chat | GenerationIntent::FunFact => {
            Err(ContractError::FreeTextIntent(intent.as_str()))
        }
        GenerationIntent::ColorPrompt => {
            Ok(StructuredOutput::ColorPrompt(serde_json::from_value(payload)?))
        }
        GenerationIntent::GameHints => {
            Ok(StructuredOutput::GameHints(serde_json::from_value(payload)?))
        }
        GenerationIntent::QueryFilter => {
            Ok(StructuredOutput::QueryFilter(serde_json::from_value(payload)?))
        }
        GenerationIntent::Quiz => Ok(StructuredOutput::Quiz(serde_json::from_value(payload)?)),
        GenerationIntent::StoryStart | GenerationIntent::StoryContinue => {
            Ok(StructuredOutput::Story(serde_json::from_value(payload)?))
        }
    }
}
