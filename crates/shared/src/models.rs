use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunFactRequest {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunFactResponse {
    pub fact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameHintsRequest {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    pub id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFilterRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(default = "default_quiz_count")]
    pub count: u32,
}

fn default_quiz_count() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum StoryRequest {
    Start {
        hero_name: String,
        creature_type: String,
        setting: String,
    },
    Continue {
        hero_name: String,
        previous_text: String,
        chosen_option: String,
    },
}
