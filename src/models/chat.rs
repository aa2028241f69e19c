use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
  System,
}

/// A piece of message content. Only text parts carry meaning here; any other
/// part type sent by the chat UI (files, tool calls, ...) is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
  Text { text: String },
  #[serde(other)]
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub role: Role,
  #[serde(default)]
  pub parts: Vec<MessagePart>,
}

impl ChatMessage {
  pub fn text(role: Role, text: impl Into<String>) -> Self {
    Self {
      id: None,
      role,
      parts: vec![MessagePart::Text { text: text.into() }],
    }
  }

  pub fn user(text: impl Into<String>) -> Self {
    Self::text(Role::User, text)
  }

  pub fn assistant(text: impl Into<String>) -> Self {
    Self::text(Role::Assistant, text)
  }

  /// All text parts joined together
  pub fn text_content(&self) -> String {
    self
      .parts
      .iter()
      .filter_map(|part| match part {
        MessagePart::Text { text } => Some(text.as_str()),
        MessagePart::Other => None,
      })
      .collect::<Vec<_>>()
      .join("")
  }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
  #[serde(default)]
  pub messages: Vec<ChatMessage>,
}
