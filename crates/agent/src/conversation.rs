use serde::Deserialize;

use dappazon_core::domain::action::SearchResult;
use dappazon_core::domain::conversation::ConversationMessage;
use dappazon_core::errors::TurnError;

use crate::search::format_results;

/// Reply used when the provider answers without any content.
pub const NO_REPLY_TEXT: &str = "Xin lỗi, tôi không thể trả lời lúc này.";

/// One inbound chat turn as the storefront sends it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<ConversationMessage>) -> Self {
        Self { message: Some(message.into()), conversation_history: history }
    }

    /// The user message, rejected when missing or blank.
    pub fn validated_message(&self) -> Result<&str, TurnError> {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => Ok(message),
            Some(_) => Err(TurnError::InvalidInput("message must not be blank".to_string())),
            None => Err(TurnError::InvalidInput("message is required".to_string())),
        }
    }
}

/// The most recent `window` messages of `history`, oldest first.
pub fn trailing_window(history: &[ConversationMessage], window: usize) -> &[ConversationMessage] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// `system prompt, history..., user message`
pub fn primary_messages(
    system_prompt: &str,
    history: &[ConversationMessage],
    message: &str,
) -> Vec<ConversationMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ConversationMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(ConversationMessage::user(message));
    messages
}

/// Primary messages followed by the model's first answer and a request to
/// summarize the search results.
pub fn follow_up_messages(
    primary: &[ConversationMessage],
    raw_reply: &str,
    results: &[SearchResult],
) -> Vec<ConversationMessage> {
    let mut messages = Vec::with_capacity(primary.len() + 2);
    messages.extend(primary.iter().cloned());
    messages.push(ConversationMessage::assistant(raw_reply));
    messages.push(ConversationMessage::user(summary_instruction(results)));
    messages
}

pub fn summary_instruction(results: &[SearchResult]) -> String {
    format!(
        "Đây là kết quả tìm kiếm web:\n\n{}\n\nHãy tóm tắt thông tin này một cách ngắn gọn và hữu ích cho người dùng. Trả lời bằng tiếng Việt.",
        format_results(results)
    )
}

#[cfg(test)]
mod tests {
    use dappazon_core::domain::action::SearchResult;
    use dappazon_core::domain::conversation::{ConversationMessage, Role};
    use dappazon_core::errors::TurnError;

    use super::{follow_up_messages, primary_messages, trailing_window, ChatRequest};

    fn history(len: usize) -> Vec<ConversationMessage> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationMessage::user(format!("q{i}"))
                } else {
                    ConversationMessage::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn request_parses_storefront_payload() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message":"Cho xem Drone","conversationHistory":[{"role":"user","content":"hi"}]}"#,
        )
        .expect("parse");

        assert_eq!(request.validated_message(), Ok("Cho xem Drone"));
        assert_eq!(request.conversation_history, vec![ConversationMessage::user("hi")]);

        let bare: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).expect("parse");
        assert!(bare.conversation_history.is_empty());
    }

    #[test]
    fn missing_or_blank_message_is_invalid_input() {
        let missing: ChatRequest = serde_json::from_str("{}").expect("parse");
        assert!(matches!(missing.validated_message(), Err(TurnError::InvalidInput(_))));

        let blank = ChatRequest::new("   \n", Vec::new());
        assert!(matches!(blank.validated_message(), Err(TurnError::InvalidInput(_))));
    }

    #[test]
    fn trailing_window_keeps_most_recent_messages_in_order() {
        let history = history(25);

        let window = trailing_window(&history, 20);
        assert_eq!(window.len(), 20);
        assert_eq!(window[0].content, "a5");
        assert_eq!(window[19].content, "q24");

        assert_eq!(trailing_window(&history[..3], 20).len(), 3);
    }

    #[test]
    fn primary_messages_wrap_history_with_system_and_user() {
        let messages = primary_messages("sys", &history(2), "Cho xem Drone");

        let roles: Vec<Role> = messages.iter().map(|message| message.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "Cho xem Drone");
    }

    #[test]
    fn follow_up_appends_raw_reply_and_result_summary_request() {
        let primary = primary_messages("sys", &[], "Giá ETH hôm nay");
        let results = vec![SearchResult {
            title: "ETH price".into(),
            link: "https://example.org/eth".into(),
            snippet: "ETH trades at $3,000".into(),
        }];

        let raw = "Để tôi tìm... [ACTION:WEB_SEARCH:eth]";

        let messages = follow_up_messages(&primary, raw, &results);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2], ConversationMessage::assistant(raw));
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.starts_with("Đây là kết quả tìm kiếm web:\n\n1. ETH price\n"));
        assert!(messages[3].content.ends_with("Trả lời bằng tiếng Việt."));
    }
}
