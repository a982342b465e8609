//! Flattening of a chat history into a single prompt string.
//!
//! Every supported model family speaks one of a small closed set of
//! [`Dialect`]s. A dialect decides the markers and labels around each
//! message and the cue appended after the last one. Formatting is a pure
//! function of the history and the [`PromptConfig`].

mod chat_markup;
mod instruction;

use super::message::ChatMessage;

/// Template convention used to render a chat history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `<|im_start|>` / `<|im_end|>` delimited turns, used by MPT-Chat.
    ChatMarkup,
    /// `### Instruction:` / `### Response:` labelled turns, used by the
    /// instruction-tuned Llama derivatives (Nous-Hermes, Vicuna).
    InstructionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub dialect: Dialect,
    /// Replace the caller's leading system message with `system_prompt_text`.
    pub inject_system_prompt: bool,
    pub system_prompt_text: String,
}

impl PromptConfig {
    /// Whether a system `message` of `history` gets rendered.
    ///
    /// Under injection the caller's system slot is the first message of the
    /// history, and every message equal to it is dropped.
    fn emits_system_message(&self, message: &ChatMessage, history: &[ChatMessage]) -> bool {
        !self.inject_system_prompt || history.first() != Some(message)
    }

    /// The injected text, when injection is enabled.
    fn injected_prompt(&self) -> Option<&str> {
        self.inject_system_prompt
            .then_some(self.system_prompt_text.as_str())
    }
}

/// Renders chat histories with a fixed [`PromptConfig`].
#[derive(Debug, Clone)]
pub struct PromptFormatter {
    config: PromptConfig,
}

impl PromptFormatter {
    pub const fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PromptConfig {
        &self.config
    }

    pub fn format(&self, history: &[ChatMessage]) -> String {
        format(history, &self.config)
    }
}

/// Builds the prompt for `history` in the dialect selected by `config`.
///
/// Message content is trimmed before insertion. Messages whose role is not
/// one of system, user or assistant are skipped.
pub fn format(history: &[ChatMessage], config: &PromptConfig) -> String {
    match config.dialect {
        Dialect::ChatMarkup => chat_markup::format(history, config),
        Dialect::InstructionResponse => instruction::format(history, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dialect: Dialect, inject: bool) -> PromptConfig {
        PromptConfig {
            dialect,
            inject_system_prompt: inject,
            system_prompt_text: "new".to_string(),
        }
    }

    #[test]
    fn test_format_is_deterministic() {
        let history = vec![
            ChatMessage::system("rules"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        for dialect in [Dialect::ChatMarkup, Dialect::InstructionResponse] {
            let formatter = PromptFormatter::new(config(dialect, true));
            assert_eq!(formatter.format(&history), formatter.format(&history));
        }
    }

    #[test]
    fn test_system_slot_matches_first_message_by_value() {
        let history = vec![
            ChatMessage::system("rules"),
            ChatMessage::user("hi"),
            ChatMessage::system("more rules"),
        ];
        let config = config(Dialect::ChatMarkup, true);
        assert!(!config.emits_system_message(&history[0], &history));
        assert!(!config.emits_system_message(&ChatMessage::system("rules"), &history));
        assert!(config.emits_system_message(&history[2], &history));

        let config = PromptConfig {
            inject_system_prompt: false,
            ..config
        };
        assert!(config.emits_system_message(&history[0], &history));
    }

    #[test]
    fn test_repeated_system_message_is_dropped_under_injection() {
        let history = vec![ChatMessage::system("same"), ChatMessage::system("same")];
        let prompt = format(&history, &config(Dialect::InstructionResponse, true));
        assert_eq!(prompt, "newASSISTANT:");

        let prompt = format(&history, &config(Dialect::ChatMarkup, true));
        assert!(!prompt.contains("same"));
    }

    #[test]
    fn test_repeated_system_message_is_kept_without_injection() {
        let history = vec![ChatMessage::system("same"), ChatMessage::system("same")];
        let prompt = format(&history, &config(Dialect::InstructionResponse, false));
        assert_eq!(prompt, "same same ASSISTANT:");
    }

    #[test]
    fn test_history_is_not_mutated() {
        let history = vec![ChatMessage::user("  padded  ")];
        let before = history.clone();
        let _ = format(&history, &config(Dialect::ChatMarkup, false));
        assert_eq!(history, before);
    }
}
