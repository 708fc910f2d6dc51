//! Conversion between OpenAI-shaped requests/responses and the upstream's
//! plain-text prompt/reply exchange.

use gemgate_protocol::openai::create_chat_completions::response::{
    ChatCompletionChoice, ChatCompletionObjectType, CreateChatCompletionResponse,
};
use gemgate_protocol::openai::create_chat_completions::types::{
    ChatCompletionFinishReason, ChatCompletionRequestMessage, ChatCompletionResponseMessage,
    ChatCompletionRole, CompletionUsage,
};
use time::OffsetDateTime;
use uuid::Uuid;

const MESSAGE_SEPARATOR: &str = "\n\n";

/// Renders the message list as `"<Role>: <content>"` blocks in input
/// order. Roles without a label are dropped.
pub fn to_prompt(messages: &[ChatCompletionRequestMessage]) -> String {
    messages
        .iter()
        .filter_map(|message| {
            let label = role_label(&message.role)?;
            Some(format!("{label}: {}", message.text()))
        })
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

fn role_label(role: &ChatCompletionRole) -> Option<&'static str> {
    match role {
        ChatCompletionRole::System => Some("System"),
        ChatCompletionRole::User => Some("User"),
        ChatCompletionRole::Assistant => Some("Assistant"),
        ChatCompletionRole::Other(_) => None,
    }
}

/// Rough token count: one token per four characters, rounded down.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / 4) as u64
}

pub fn usage_for(prompt: &str, completion: &str) -> CompletionUsage {
    let prompt_tokens = estimate_tokens(prompt);
    let completion_tokens = estimate_tokens(completion);
    CompletionUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}

/// `chatcmpl-` followed by 8 hex characters.
pub fn completion_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &hex[..8])
}

pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Wraps a complete reply. `model` is echoed exactly as the caller sent it.
pub fn to_envelope(reply: &str, prompt: &str, model: &str) -> CreateChatCompletionResponse {
    CreateChatCompletionResponse {
        id: completion_id(),
        object: ChatCompletionObjectType::ChatCompletion,
        created: unix_now(),
        model: model.to_string(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ChatCompletionResponseMessage {
                role: ChatCompletionRole::Assistant,
                content: reply.to_string(),
            },
            finish_reason: ChatCompletionFinishReason::Stop,
        }],
        usage: usage_for(prompt, reply),
    }
}
