use bytes::Bytes;

/// Terminal frame of an OpenAI chat completion stream.
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";

/// Encodes one SSE event. Multi-line data gets one `data:` line per line.
pub fn encode_sse(event: Option<&str>, data: &str) -> Bytes {
    let mut out = String::with_capacity(data.len() + 16);
    if let Some(event) = event {
        out.push_str("event: ");
        out.push_str(event);
        out.push('\n');
    }
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    Bytes::from(out)
}

pub fn encode_done() -> Bytes {
    Bytes::from_static(DONE_FRAME)
}
