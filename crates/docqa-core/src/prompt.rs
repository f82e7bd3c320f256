//! Prompt construction for the completion model.

use crate::types::PromptMessage;

pub const SYSTEM_INSTRUCTION: &str = "I am going to ask you a question, which I would like you to answer \
based only on the provided context, and not any other information. If there is not enough information \
in the context to answer the question, say \"I am not sure\" and do not make up an answer. \
Break your answer up into nicely readable paragraphs.";

/// Builds the system + user message pair for one question.
///
/// Context chunks are joined with a single space in the order given, which is
/// relevance order rather than document order.
pub fn build_prompt(query: &str, context: &[String]) -> [PromptMessage; 2] {
    [
        PromptMessage::system(SYSTEM_INSTRUCTION),
        PromptMessage::user(format!("The question is {query}. Here is all the context you have: {}", context.join(" "))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn two_messages_system_then_user() {
        let messages = build_prompt("Q", &["A".to_string(), "B".to_string()]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains('Q'));
        assert!(messages[1].content.contains("A B"));
    }

    #[test]
    fn context_keeps_the_given_order() {
        let messages = build_prompt("why?", &["second".to_string(), "first".to_string()]);
        assert!(messages[1].content.ends_with("second first"));
    }

    #[test]
    fn empty_context_leaves_the_context_slot_blank() {
        let messages = build_prompt("anything", &[]);
        assert_eq!(messages[1].content, "The question is anything. Here is all the context you have: ");
    }

    #[test]
    fn system_message_forbids_outside_knowledge() {
        let messages = build_prompt("q", &[]);
        assert!(messages[0].content.contains("based only on the provided context"));
        assert!(messages[0].content.contains("I am not sure"));
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let messages = build_prompt("q", &[]);
        let json = serde_json::to_value(&messages).expect("json");
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["role"], "user");
    }
}
