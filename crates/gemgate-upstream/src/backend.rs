use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::errors::UpstreamResult;

/// Entry point to the upstream: exchanges credentials for an authenticated handle.
///
/// `initialize` performs the full handshake. Callers bound it with their own
/// timeout; implementations should not retry internally.
#[async_trait]
pub trait UpstreamBackend: Send + Sync {
    async fn initialize(&self, credentials: &Credentials)
    -> UpstreamResult<Arc<dyn UpstreamHandle>>;
}

/// One authenticated connection to the upstream.
#[async_trait]
pub trait UpstreamHandle: Send + Sync {
    /// Stateless one-shot prompt.
    async fn send(&self, prompt: &str) -> UpstreamResult<String>;

    /// Opens a multi-turn conversation bound to `model` (an upstream model name).
    async fn start_session(&self, model: &str) -> UpstreamResult<Arc<dyn ConversationSession>>;
}

#[async_trait]
pub trait ConversationSession: Send + Sync {
    /// Upstream model the conversation was opened with.
    fn model(&self) -> &str;

    async fn send_message(&self, prompt: &str) -> UpstreamResult<String>;
}
