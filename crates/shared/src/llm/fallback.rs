use rand::Rng;

use super::context::{GenerationContext, slash_joined};
use super::contracts::{
    CREATURE_ID_MAX, CREATURE_ID_MIN, ColorPromptOutput, GameHintsOutput, QueryFilterOutput,
    QuizOutput, QuizQuestion, StoryOutput, StructuredOutput,
};
use super::dispatcher::GeneratedValue;

const QUERY_FILTER_FALLBACK_ID_COUNT: usize = 6;

/// Streamed verbatim when even the safety-redirected chat call fails.
pub const DEGRADED_CHAT_REPLY: &str = "\
Oh my, my telescope fogged up for a moment! \u{1F52D} Ask me again in a little bit. \
While we wait, here is something fun: creature friends love making new pals, just like you!";

/// Deterministic, contract-conforming substitute content for every one-shot
/// intent. Pure except the query-filter id draw, where randomness is part
/// of the contract.
pub fn synthesize(context: &GenerationContext) -> GeneratedValue {
    match context {
        GenerationContext::ColorPrompt => {
            GeneratedValue::Structured(StructuredOutput::ColorPrompt(ColorPromptOutput {
                prompt: "Draw a friendly creature exploring a magical forest!".to_string(),
                colors: vec![
                    "#4ECDC4".to_string(),
                    "#FFE66D".to_string(),
                    "#95E1D3".to_string(),
                    "#FF6B35".to_string(),
                ],
            }))
        }
        GenerationContext::FunFact { name, types } => {
            let type_phrase = if types.is_empty() {
                "friendly".to_string()
            } else {
                types.join(" and ")
            };
            GeneratedValue::Text(format!(
                "{name} is a wonderful {type_phrase} type friend who loves making new friends!"
            ))
        }
        GenerationContext::GameHints { name, types, id } => {
            GeneratedValue::Structured(StructuredOutput::GameHints(GameHintsOutput {
                hints: vec![
                    format!("This creature is a {} type!", slash_joined(types)),
                    format!("It's number {id} in the collection!"),
                    format!("Its name starts with \"{}\"!", first_letter_upper(name)),
                ],
            }))
        }
        GenerationContext::QueryFilter { .. } => {
            GeneratedValue::Structured(StructuredOutput::QueryFilter(QueryFilterOutput {
                types: Vec::new(),
                traits: Vec::new(),
                ids: random_unique_ids(QUERY_FILTER_FALLBACK_ID_COUNT),
            }))
        }
        GenerationContext::Quiz { count } => {
            let bank = quiz_question_bank();
            GeneratedValue::Structured(StructuredOutput::Quiz(QuizOutput {
                questions: (0..*count).map(|i| bank[i % bank.len()].clone()).collect(),
            }))
        }
        GenerationContext::StoryStart { hero_name, .. }
        | GenerationContext::StoryContinue { hero_name, .. } => {
            GeneratedValue::Structured(StructuredOutput::Story(StoryOutput {
                text: format!(
                    "{hero_name} looked around with wonder. Something magical was about to happen..."
                ),
                choices: vec![
                    "Look for clues".to_string(),
                    "Call out hello".to_string(),
                    "Follow the sparkles".to_string(),
                ],
            }))
        }
    }
}

/// Draws without replacement until `count` distinct ids are collected.
fn random_unique_ids(count: usize) -> Vec<u32> {
    let mut rng = rand::thread_rng();
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let candidate = rng.gen_range(CREATURE_ID_MIN..=CREATURE_ID_MAX);
        if !ids.contains(&candidate) {
            ids.push(candidate);
        }
    }
    ids
}

fn first_letter_upper(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn quiz_question_bank() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            question: "What type is strong against fire?".to_string(),
            options: four(["Water", "Grass", "Electric", "Normal"]),
            correct_index: 0,
        },
        QuizQuestion {
            question: "Where might you find a water creature?".to_string(),
            options: four(["In a volcano", "In the ocean", "In the sky", "In a cave"]),
            correct_index: 1,
        },
        QuizQuestion {
            question: "What color are most grass types?".to_string(),
            options: four(["Red", "Blue", "Green", "Purple"]),
            correct_index: 2,
        },
        QuizQuestion {
            question: "Which type can often fly?".to_string(),
            options: four(["Rock", "Ground", "Flying", "Steel"]),
            correct_index: 2,
        },
        QuizQuestion {
            question: "What do electric types often have?".to_string(),
            options: four(["Flames", "Leaves", "Lightning bolts", "Water drops"]),
            correct_index: 2,
        },
    ]
}

fn four(options: [&str; 4]) -> Vec<String> {
    options.iter().map(ToString::to_string).collect()
}
