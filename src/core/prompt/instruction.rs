use super::PromptConfig;
use crate::core::message::{ChatMessage, Role};

const INSTRUCTION_LABEL: &str = "### Instruction:\n";
const RESPONSE_LABEL: &str = "### Response:\n";
const INSTRUCTION_END: &str = "[/INST]";
const ASSISTANT_CUE: &str = "ASSISTANT:";

// With injection off and an empty history the prompt is just the cue.
pub(super) fn format(history: &[ChatMessage], config: &PromptConfig) -> String {
    let mut prompt = config.injected_prompt().unwrap_or_default().to_string();

    for message in history {
        let content = message.content.trim();
        match message.role {
            Role::System if config.emits_system_message(message, history) => {
                prompt.push_str(content);
                prompt.push(' ');
            }
            Role::Assistant => {
                prompt.push_str(RESPONSE_LABEL);
                prompt.push_str(content);
                prompt.push_str(INSTRUCTION_END);
            }
            Role::User => {
                prompt.push_str(INSTRUCTION_LABEL);
                prompt.push_str(content);
                prompt.push(' ');
            }
            Role::System | Role::Other(_) => {}
        }
    }

    prompt.push_str(ASSISTANT_CUE);
    prompt
}
