use serde_json::Value;

use super::context::{GenerationContext, slash_joined};
use super::contracts::{GenerationIntent, output_schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Structured,
    FreeText,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub intent: GenerationIntent,
    pub system_prompt: &'static str,
    pub mode: OutputMode,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub output_schema: Option<Value>,
}

/// Persona prompt for the streamed chat guide. Shared by the regular chat
/// flow and the safety-redirected flow.
pub const CHAT_SYSTEM_PROMPT: &str = "\
You are Professor Pine! A cheerful, kid-friendly guide to the world of pocket creatures.

Your personality:
- Encouraging and supportive - celebrate curiosity!
- Fun and slightly silly - use wordplay and gentle humor
- Patient teacher - break down complex ideas simply
- Loves emojis but uses them sparingly (1-3 per message)

Your rules:
- Use simple language (grade 2-4 reading level)
- Keep responses under 100 words
- Never reproduce copyrighted content or storylines
- Avoid specific battle mechanics or stats
- Focus on imagination, creativity, and exploration
- Address the child directly (\"you\", \"your\")
- If asked about scary topics, redirect to positive ones
- Give hints rather than direct answers to encourage thinking
- Never share personal information or ask for any

Topics you love discussing:
- Types of creatures and their habitats
- Friendly facts about creature personalities
- Creative stories and adventures
- Nature and the environment
- Friendship and teamwork";

const COLOR_PROMPT_SYSTEM: &str = "\
Generate creative drawing prompts for kids about pocket creatures.

Rules:
- Simple, encouraging language
- Focus on imagination and creativity
- Include creature types, scenes, or activities
- Suggest 4 complementary hex colors
- Make prompts fun and achievable

Examples:
- \"Draw a water creature having a pool party!\"
- \"Create a fire creature roasting marshmallows!\"
- \"Design your own electric creature playing with friends!\"";

const FUN_FACT_SYSTEM: &str = "\
You are Professor Pine, a cheerful guide for kids learning about creatures. \
Generate a single fun, imaginative fact about the creature.

Rules:
- Use simple language (grade 2-4 reading level)
- Be playful and encouraging
- Keep it to 1-2 sentences
- Focus on imagination, not copyrighted details
- Include emojis sparingly
- Make facts about habitat, personality, or abilities
- Never mention specific game mechanics or stats";

const GAME_HINTS_SYSTEM: &str = "\
Generate 3 fun hints for kids to guess a creature. Rules:
- First hint: Very vague (personality or habitat)
- Second hint: More specific (type or abilities)
- Third hint: Almost gives it away (appearance)
- Use simple words (grade 2-4)
- Be playful and fun
- Don't say the name!";

const QUERY_FILTER_SYSTEM: &str = "\
You are a helpful creature search assistant for kids. Convert natural \
language queries into structured search criteria.

Rules:
- Only suggest creatures from the original collection (ids 1-151)
- Focus on kid-friendly, positive descriptions
- Match traits to actual creature characteristics
- Return 5-10 creature ids that best match the query
- Consider type, size, appearance, and personality";

const QUIZ_SYSTEM: &str = "\
Generate fun quiz questions about pocket creatures for kids.

Rules:
- Use simple language (grade 2-4 reading level)
- Focus on types, habitats, and fun facts
- Make questions encouraging and positive
- Avoid battle mechanics or complex stats
- Include variety: types, behaviors, appearances
- Each question has exactly 4 options
- Make wrong answers plausible but clearly different";

const STORY_START_SYSTEM: &str = "\
You are a storyteller for kids. Create magical, safe, encouraging adventures.

Rules:
- Use simple language (grade 2-4)
- Keep paragraphs short (2-4 sentences)
- Focus on friendship, bravery, and kindness
- No scary or violent content
- Include the creature type naturally
- Give 3 interesting choices
- Make the hero feel special
- No copyrighted characters";

const STORY_CONTINUE_SYSTEM: &str = "\
Continue the kid-friendly adventure story. Keep it magical and encouraging.

Rules:
- Build on what happened before
- Use simple language (grade 2-4)
- 2-4 sentences per response
- Focus on friendship and bravery
- No scary content
- Give 3 new choices
- Keep it exciting but safe";

const CREATIVE_TEMPERATURE: f32 = 0.8;
const EXTRACTION_TEMPERATURE: f32 = 0.2;

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 3_000;
const FUN_FACT_MAX_OUTPUT_TOKENS: u32 = 150;
const STORY_MAX_OUTPUT_TOKENS: u32 = 400;
pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 3_000;

pub fn template_for_intent(intent: GenerationIntent) -> PromptTemplate {
    let (system_prompt, mode, max_output_tokens, temperature) = match intent {
        GenerationIntent::Chat => (
            CHAT_SYSTEM_PROMPT,
            OutputMode::FreeText,
            CHAT_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::ColorPrompt => (
            COLOR_PROMPT_SYSTEM,
            OutputMode::Structured,
            DEFAULT_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::FunFact => (
            FUN_FACT_SYSTEM,
            OutputMode::FreeText,
            FUN_FACT_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::GameHints => (
            GAME_HINTS_SYSTEM,
            OutputMode::Structured,
            DEFAULT_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::QueryFilter => (
            QUERY_FILTER_SYSTEM,
            OutputMode::Structured,
            DEFAULT_MAX_OUTPUT_TOKENS,
            EXTRACTION_TEMPERATURE,
        ),
        GenerationIntent::Quiz => (
            QUIZ_SYSTEM,
            OutputMode::Structured,
            DEFAULT_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::StoryStart => (
            STORY_START_SYSTEM,
            OutputMode::Structured,
            STORY_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
        GenerationIntent::StoryContinue => (
            STORY_CONTINUE_SYSTEM,
            OutputMode::Structured,
            STORY_MAX_OUTPUT_TOKENS,
            CREATIVE_TEMPERATURE,
        ),
    };

    PromptTemplate {
        intent,
        system_prompt,
        mode,
        max_output_tokens,
        temperature,
        output_schema: output_schema(intent),
    }
}

pub fn user_prompt(context: &GenerationContext) -> String {
    match context {
        GenerationContext::ColorPrompt => "Give me a fun drawing idea!".to_string(),
        GenerationContext::FunFact { name, types } => format!(
            "Tell me a fun fact about {name}, a {} type creature!",
            slash_joined(types)
        ),
        GenerationContext::GameHints { name, types, id } => {
            format!("Create hints for: {name} ({} type, #{id})", slash_joined(types))
        }
        GenerationContext::QueryFilter { query } => query.clone(),
        GenerationContext::Quiz { count } => format!("Generate exactly {count} fun questions!"),
        GenerationContext::StoryStart {
            hero_name,
            creature_type,
            setting,
        } => format!(
            "Start a story where {hero_name} meets a {creature_type} creature in a {setting}. \
             Make it magical and fun!"
        ),
        GenerationContext::StoryContinue {
            hero_name,
            previous_text,
            chosen_option,
        } => format!(
            "Story so far:\n{previous_text}\n\n{hero_name} chose: \"{chosen_option}\"\n\n\
             Continue the adventure!"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationContext, GenerationIntent, OutputMode, template_for_intent, user_prompt};

    #[test]
    fn structured_templates_carry_their_schema() {
        for intent in [
            GenerationIntent::ColorPrompt,
            GenerationIntent::GameHints,
            GenerationIntent::QueryFilter,
            GenerationIntent::Quiz,
            GenerationIntent::StoryStart,
            GenerationIntent::StoryContinue,
        ] {
            let template = template_for_intent(intent);
            assert_eq!(template.mode, OutputMode::Structured);
            assert!(template.output_schema.is_some(), "{intent:?} needs a schema");
        }
    }

    #[test]
    fn free_text_templates_have_no_schema() {
        for intent in [GenerationIntent::Chat, GenerationIntent::FunFact] {
            let template = template_for_intent(intent);
            assert_eq!(template.mode, OutputMode::FreeText);
            assert!(template.output_schema.is_none());
        }
    }

    #[test]
    fn continuation_prompt_references_prior_story() {
        let prompt = user_prompt(&GenerationContext::StoryContinue {
            hero_name: "Maya".to_string(),
            previous_text: "Maya found a glowing cave.".to_string(),
            chosen_option: "Step inside".to_string(),
        });

        assert!(prompt.contains("Maya found a glowing cave."));
        assert!(prompt.contains("\"Step inside\""));
    }
}
