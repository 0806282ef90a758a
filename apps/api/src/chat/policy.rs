//! Prompt policies — content-triggered directives appended to the first-pass system prompt.
//!
//! `ChatLoop` holds a list of `Arc<dyn PromptPolicy>`; each one looks at the
//! incoming user message and may contribute one extra instruction.

/// Marker phrase present in the pig latin directive.
pub const PIG_LATIN_MARKER: &str = "pig latin";

const PIG_LATIN_DIRECTIVE: &str = "Everything in your reply needs to be in pig latin - \
    it is mandatory that you respond only and entirely in pig latin";

pub trait PromptPolicy: Send + Sync {
    /// Returns an instruction to append to the system prompt, or `None` to leave it alone.
    fn directive(&self, message: &str) -> Option<String>;
}

/// Appends a fixed directive whenever the message contains `trigger` (case-sensitive).
#[derive(Debug, Clone)]
pub struct StyleTrigger {
    trigger: String,
    directive: String,
}

impl StyleTrigger {
    pub fn new(trigger: impl Into<String>, directive: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            directive: directive.into(),
        }
    }

    /// The stress-test register: any message mentioning `trigger` must be answered in pig latin.
    pub fn pig_latin(trigger: impl Into<String>) -> Self {
        Self::new(trigger, PIG_LATIN_DIRECTIVE)
    }
}

impl PromptPolicy for StyleTrigger {
    fn directive(&self, message: &str) -> Option<String> {
        // An empty trigger would match every message.
        if self.trigger.is_empty() || !message.contains(&self.trigger) {
            return None;
        }
        Some(self.directive.clone())
    }
}
