pub mod context;
pub mod contracts;
pub mod dispatcher;
pub mod fallback;
pub mod gateway;
pub mod openrouter;
pub mod prompts;
pub mod safety;
pub mod stream;
pub mod validation;

pub use context::GenerationContext;
pub use contracts::{
    ColorPromptOutput, ContractError, GameHintsOutput, GenerationIntent, QueryFilterOutput,
    QuizOutput, QuizQuestion, StoryOutput, StructuredOutput, output_schema,
};
pub use dispatcher::{GeneratedValue, GenerationOutcome, OutputSource, generate};
pub use fallback::DEGRADED_CHAT_REPLY;
pub use gateway::{
    ChatTokenStream, LlmChatRequest, LlmGateway, LlmGatewayError, LlmGatewayRequest,
    LlmGatewayResponse, LlmOutput,
};
pub use openrouter::{OpenRouterGateway, OpenRouterGatewayConfig, OpenRouterModelRoute};
pub use prompts::{PromptTemplate, template_for_intent, user_prompt};
pub use safety::{SAFE_REDIRECT_PROMPT, SafetyPolicy, SafetyVerdict};
pub use stream::{ChatStreamEvent, RelayPhase, StreamRelay, assemble_chat_request};
pub use validation::{OutputValidationError, validate_output_value};
