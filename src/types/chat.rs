use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Body of `POST /api/chat` for session-based conversations.
///
/// `session_id` is serialized as `null` when absent, which asks the
/// backend to open a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatParams {
    /// The user's message.
    pub message: String,

    /// Session to continue, if any.
    pub session_id: Option<SessionId>,
}

impl ChatParams {
    /// Create chat parameters.
    pub fn new(message: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// One completed exchange in a stateless conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What the user said.
    pub user: String,

    /// What the assistant replied.
    pub assistant: String,
}

impl ConversationTurn {
    /// Create a turn.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Body of `POST /api/chat` for stateless conversations.
///
/// The full history travels with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatelessChatParams {
    /// The user's message.
    pub message: String,

    /// Every prior turn, oldest first.
    pub history: Vec<ConversationTurn>,
}

/// Response to a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply text.
    pub reply: String,

    /// The session this reply belongs to.  Stateless backends omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// LLM provider that produced the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model that produced the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatReply {
    /// Create a reply with only text and session.
    pub fn new(reply: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            reply: reply.into(),
            session_id,
            provider: None,
            model: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_session_sends_null() {
        let params = ChatParams::new("hello there", None);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"message": "hello there", "session_id": null})
        );
    }

    #[test]
    fn continuing_session_echoes_id() {
        let params = ChatParams::new("again", Some(SessionId::from("abc123")));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"message": "again", "session_id": "abc123"})
        );
    }

    #[test]
    fn stateless_body() {
        let params = StatelessChatParams {
            message: "next".to_string(),
            history: vec![ConversationTurn::new("hi", "hello")],
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"message": "next", "history": [{"user": "hi", "assistant": "hello"}]})
        );
    }

    #[test]
    fn full_reply() {
        let reply: ChatReply = serde_json::from_value(json!({
            "reply": "Start with data structures...",
            "provider": "openai",
            "model": "gpt-4o-mini",
            "session_id": 12
        }))
        .unwrap();
        assert_eq!(reply.session_id, Some(SessionId::Numeric(12)));
        assert_eq!(reply.provider.as_deref(), Some("openai"));
    }

    #[test]
    fn stateless_reply() {
        let reply: ChatReply = serde_json::from_value(json!({"reply": "ok"})).unwrap();
        assert_eq!(reply, ChatReply::new("ok", None));
    }
}
