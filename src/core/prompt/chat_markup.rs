use super::PromptConfig;
use crate::core::message::{ChatMessage, Role};

const BEGIN: &str = "<|im_start|>";
const END: &str = "<|im_end|>";
const HEADER: &str =
    "<|im_start|>system\n- You are a helpful assistant AI chatbot excited to help the user.<|im_end|>";
const RESPONSE_CUE: &str = "\n### Response:";

pub(super) fn format(history: &[ChatMessage], config: &PromptConfig) -> String {
    let mut prompt = String::from(HEADER);

    if let Some(injected) = config.injected_prompt() {
        prompt.push_str(injected);
    }

    for message in history {
        let content = message.content.trim();
        match message.role {
            Role::System if config.emits_system_message(message, history) => {
                prompt.push_str(BEGIN);
                prompt.push_str("system\n-");
                prompt.push_str(content);
                prompt.push_str(END);
            }
            Role::Assistant => {
                prompt.push_str("assistant\n");
                prompt.push_str(content);
                prompt.push_str(END);
            }
            Role::User => {
                prompt.push_str("user\n");
                prompt.push_str(content);
                prompt.push_str(END);
            }
            Role::System | Role::Other(_) => {}
        }
    }

    prompt.push_str(RESPONSE_CUE);
    prompt
}
