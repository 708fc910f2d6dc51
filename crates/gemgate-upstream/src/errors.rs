use std::time::Duration;

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream handshake timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected upstream payload: {0}")]
    Protocol(String),
}
