/// Lexical gate applied to the latest user-authored chat text before any
/// model call. Pure, synchronous, and unable to fail; it never inspects
/// model output or earlier turns.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    patterns: Vec<String>,
}

pub const DEFAULT_BLOCKED_PATTERNS: &[&str] =
    &["kill", "hate", "weapon", "violence", "inappropriate", "adult"];

/// Substituted for the user's message when the policy blocks it. The model
/// is still invoked, so the child gets an in-character reply instead of a
/// refusal.
pub const SAFE_REDIRECT_PROMPT: &str = "Tell me something fun about friendly creatures!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl SafetyVerdict {
    fn clean() -> Self {
        Self {
            blocked: false,
            reason: None,
        }
    }

    fn blocked_by(pattern: &str) -> Self {
        Self {
            blocked: true,
            reason: Some(format!("matched disallowed pattern \"{pattern}\"")),
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_PATTERNS.iter().map(ToString::to_string))
    }
}

impl SafetyPolicy {
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|pattern| pattern.trim().to_lowercase())
                .filter(|pattern| !pattern.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive whole-word match. "adulting" does not match
    /// "adult"; "WEAPON" does.
    pub fn check(&self, text: &str) -> SafetyVerdict {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let lowered = word.to_lowercase();
            if self.patterns.iter().any(|pattern| *pattern == lowered) {
                return SafetyVerdict::blocked_by(&lowered);
            }
        }
        SafetyVerdict::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::{SAFE_REDIRECT_PROMPT, SafetyPolicy};

    #[test]
    fn blocks_disallowed_token() {
        let policy = SafetyPolicy::default();
        let verdict = policy.check("I hate everyone, where's a weapon");
        assert!(verdict.blocked);
        assert!(verdict.reason.is_some());
    }

    #[test]
    fn block_is_case_insensitive() {
        let policy = SafetyPolicy::default();
        assert!(policy.check("WEAPON").blocked);
        assert!(policy.check("WeApOn").blocked);
    }

    #[test]
    fn clean_text_passes() {
        let policy = SafetyPolicy::default();
        let verdict = policy.check("what do fire creatures eat for breakfast?");
        assert!(!verdict.blocked);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn matches_whole_words_only() {
        let policy = SafetyPolicy::default();
        assert!(!policy.check("adulting is hard, says my big sister").blocked);
        assert!(!policy.check("the skillful painter").blocked);
        assert!(policy.check("no adult supervision").blocked);
    }

    #[test]
    fn custom_pattern_list_is_honored() {
        let policy = SafetyPolicy::new(vec!["broccoli".to_string()]);
        assert!(policy.check("I refuse to draw broccoli").blocked);
        assert!(!policy.check("where's a weapon").blocked);
    }

    #[test]
    fn redirect_prompt_itself_is_clean() {
        let policy = SafetyPolicy::default();
        assert!(!policy.check(SAFE_REDIRECT_PROMPT).blocked);
    }
}
