use serde::{Deserialize, Serialize};

/// Author of a chat message.
///
/// Roles the gateway does not render (`developer`, `tool`, ...) are kept as
/// `Other` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCompletionRole {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionRequestMessage {
    pub role: ChatCompletionRole,
    /// `null` and missing content are both treated as empty text.
    #[serde(default)]
    pub content: Option<ChatMessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatCompletionRequestMessage {
    pub fn new(role: ChatCompletionRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(ChatMessageContent::Text(content.into())),
            name: None,
        }
    }

    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(ChatMessageContent::to_text)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Parts(Vec<ChatCompletionContentPart>),
}

impl ChatMessageContent {
    /// Flattens the content to plain text. Non-text parts carry nothing the
    /// upstream prompt format can express, so they are skipped.
    pub fn to_text(&self) -> String {
        match self {
            ChatMessageContent::Text(text) => text.clone(),
            ChatMessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ChatCompletionContentPart::Text { text } => Some(text.as_str()),
                    ChatCompletionContentPart::Other => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatCompletionContentPart {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionResponseMessage {
    pub role: ChatCompletionRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionStreamResponseDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCompletionFinishReason {
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "length")]
    Length,
    #[serde(rename = "content_filter")]
    ContentFilter,
}

/// Token accounting attached to a completion.
///
/// gemgate fills these from a character-count estimate, not a tokenizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
