use prompting_miner::core::{ChatMessage, Dialect, PromptConfig, PromptFormatter};

const HEADER: &str =
    "<|im_start|>system\n- You are a helpful assistant AI chatbot excited to help the user.<|im_end|>";

fn formatter(dialect: Dialect, inject: bool) -> PromptFormatter {
    PromptFormatter::new(PromptConfig {
        dialect,
        inject_system_prompt: inject,
        system_prompt_text: "new".to_string(),
    })
}

#[test]
fn test_chat_markup_empty_history_is_header_and_cue() {
    let prompt = formatter(Dialect::ChatMarkup, false).format(&[]);
    assert_eq!(prompt, format!("{HEADER}\n### Response:"));
}

#[test]
fn test_chat_markup_injection_suppresses_caller_system_message() {
    let history = [ChatMessage::system("old")];
    let prompt = formatter(Dialect::ChatMarkup, true).format(&history);

    assert!(prompt.contains("new"));
    assert!(!prompt.contains("<|im_start|>system\n-old<|im_end|>"));
    assert_eq!(prompt.matches("<|im_start|>system").count(), 1);
}

#[test]
fn test_user_block_precedes_assistant_block() {
    let history = [
        ChatMessage::user("QUESTION"),
        ChatMessage::assistant("ANSWER"),
    ];
    for dialect in [Dialect::ChatMarkup, Dialect::InstructionResponse] {
        let prompt = formatter(dialect, false).format(&history);
        let user_at = prompt.find("QUESTION").unwrap();
        let assistant_at = prompt.find("ANSWER").unwrap();
        assert!(user_at < assistant_at, "{dialect:?}: {prompt}");
    }
}

#[test]
fn test_content_is_trimmed_but_markers_are_not() {
    let history = [ChatMessage::user("  hello  ")];

    let markup = formatter(Dialect::ChatMarkup, false).format(&history);
    assert!(markup.contains("user\nhello<|im_end|>"));
    assert!(markup.ends_with("\n### Response:"));

    let instruction = formatter(Dialect::InstructionResponse, false).format(&history);
    assert_eq!(instruction, "### Instruction:\nhello ASSISTANT:");
}

#[test]
fn test_unknown_role_adds_nothing() {
    let with_tool = [
        ChatMessage::user("q"),
        ChatMessage::new("tool", "lookup result"),
    ];
    let without_tool = [ChatMessage::user("q")];

    for dialect in [Dialect::ChatMarkup, Dialect::InstructionResponse] {
        let formatter = formatter(dialect, false);
        assert_eq!(formatter.format(&with_tool), formatter.format(&without_tool));
    }
}

#[test]
fn test_header_present_for_any_history() {
    let histories: [&[ChatMessage]; 3] = [
        &[],
        &[ChatMessage::system("x")],
        &[ChatMessage::new("tool", "y"), ChatMessage::assistant("z")],
    ];
    for history in histories {
        for inject in [false, true] {
            assert!(formatter(Dialect::ChatMarkup, inject)
                .format(history)
                .starts_with(HEADER));
        }
    }
}
