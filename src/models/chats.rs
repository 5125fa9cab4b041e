use serde::{Deserialize, Serialize};

// Enum to represent the role of the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "User"),
            MessageRole::Assistant => write!(f, "Assistant"),
            MessageRole::System => write!(f, "System"),
        }
    }
}

/// A single history item. Only the text content is scanned by the engine;
/// the role is carried so callers can round-trip messages unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_type: MessageRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(message_type: MessageRole, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
        }
    }
}
