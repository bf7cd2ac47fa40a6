//! Llama 3 chat template.

use llm::{Message, Role};

/// Render a conversation into a Llama 3 instruct prompt, ending with an
/// open assistant header for the model to complete.
pub fn llama3(instructions: &str, messages: &[Message]) -> String {
    let mut prompt = String::from("<|begin_of_text|>");
    if !instructions.is_empty() {
        push_turn(&mut prompt, "system", instructions);
    }
    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        push_turn(&mut prompt, role, &message.content);
    }

    prompt.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
    prompt
}

fn push_turn(prompt: &mut String, role: &str, content: &str) {
    prompt.push_str("<|start_header_id|>");
    prompt.push_str(role);
    prompt.push_str("<|end_header_id|>\n\n");
    prompt.push_str(content);
    prompt.push_str("<|eot_id|>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_turn_prompt() {
        let prompt = llama3("Be brief.", &[Message::user("hello")]);
        assert_eq!(
            prompt,
            "<|begin_of_text|>\
             <|start_header_id|>system<|end_header_id|>\n\nBe brief.<|eot_id|>\
             <|start_header_id|>user<|end_header_id|>\n\nhello<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn no_system_turn_without_instructions() {
        let prompt = llama3("", &[Message::user("hi")]);
        assert!(!prompt.contains("system"));
    }

    #[test]
    fn history_keeps_turn_order() {
        let prompt = llama3(
            "",
            &[
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ],
        );
        let first = prompt.find("first").unwrap();
        let reply = prompt.find("reply").unwrap();
        let second = prompt.find("second").unwrap();
        assert!(first < reply && reply < second);
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }
}
