use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use gemgate_protocol::openai::create_chat_completions::stream::{
    ChatCompletionChunkObjectType, ChatCompletionStreamChoice, CreateChatCompletionStreamResponse,
};
use gemgate_protocol::openai::create_chat_completions::types::{
    ChatCompletionFinishReason, ChatCompletionStreamResponseDelta,
};

use crate::translate::unix_now;

/// One item of a streamed completion, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(CreateChatCompletionStreamResponse),
    /// Terminal `[DONE]` marker.
    Done,
}

pub type ReplyStream = BoxStream<'static, StreamEvent>;

enum Piece {
    Delta(String),
    Stop,
    Done,
}

/// Splits a reply into word-sized deltas.
///
/// Each token is a word with the whitespace that precedes it; trailing
/// whitespace rides on the last token. Concatenating the tokens gives back
/// the input exactly.
pub fn segment_reply(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if in_word {
                tokens.push(std::mem::take(&mut current));
                in_word = false;
            }
        } else {
            in_word = true;
        }
        current.push(ch);
    }
    if !current.is_empty() {
        match tokens.last_mut() {
            Some(last) if !in_word => last.push_str(&current),
            _ => tokens.push(current),
        }
    }
    tokens
}

/// Lazily emits the reply as delta chunks, one stop chunk, then `Done`.
///
/// `delay` is slept before every event after the first, except `Done`.
/// Dropping the stream stops emission.
pub fn stream_reply(
    reply: &str,
    model: impl Into<String>,
    stream_id: impl Into<String>,
    delay: Duration,
) -> ReplyStream {
    let model: Arc<str> = Arc::from(model.into());
    let stream_id: Arc<str> = Arc::from(stream_id.into());
    let created = unix_now();

    let pieces = segment_reply(reply)
        .into_iter()
        .map(Piece::Delta)
        .chain([Piece::Stop, Piece::Done]);

    stream::iter(pieces.enumerate())
        .then(move |(index, piece)| {
            let model = model.clone();
            let stream_id = stream_id.clone();
            async move {
                if index > 0 && !matches!(piece, Piece::Done) && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match piece {
                    Piece::Delta(text) => {
                        StreamEvent::Chunk(chunk(&stream_id, &model, created, Some(text), None))
                    }
                    Piece::Stop => StreamEvent::Chunk(chunk(
                        &stream_id,
                        &model,
                        created,
                        None,
                        Some(ChatCompletionFinishReason::Stop),
                    )),
                    Piece::Done => StreamEvent::Done,
                }
            }
        })
        .boxed()
}

fn chunk(
    stream_id: &str,
    model: &str,
    created: i64,
    content: Option<String>,
    finish_reason: Option<ChatCompletionFinishReason>,
) -> CreateChatCompletionStreamResponse {
    CreateChatCompletionStreamResponse {
        id: stream_id.to_string(),
        object: ChatCompletionChunkObjectType::ChatCompletionChunk,
        created,
        model: model.to_string(),
        choices: vec![ChatCompletionStreamChoice {
            index: 0,
            delta: ChatCompletionStreamResponseDelta { content },
            finish_reason,
        }],
    }
}
