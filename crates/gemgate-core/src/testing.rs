use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gemgate_storage::{CredentialStore, StorageResult};
use gemgate_upstream::{
    ConversationSession, Credentials, UpstreamBackend, UpstreamError, UpstreamHandle,
    UpstreamResult,
};

/// What the mocked upstream observed.
#[derive(Default)]
pub(crate) struct UpstreamLog {
    pub handshakes: AtomicUsize,
    pub attempted: Mutex<Vec<String>>,
    pub sessions: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl UpstreamLog {
    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub(crate) struct MockBackend {
    pub log: Arc<UpstreamLog>,
    accepted_psid: Option<String>,
    fail_first: usize,
    handshake_delay: Duration,
    session_delay: Duration,
    reply: String,
}

impl MockBackend {
    pub fn new(reply: &str) -> Self {
        Self {
            log: Arc::new(UpstreamLog::default()),
            accepted_psid: None,
            fail_first: 0,
            handshake_delay: Duration::ZERO,
            session_delay: Duration::ZERO,
            reply: reply.to_string(),
        }
    }

    /// Only this primary secret authenticates.
    pub fn accepting(mut self, psid: &str) -> Self {
        self.accepted_psid = Some(psid.to_string());
        self
    }

    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_first = attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    /// Slows down `start_session` so concurrent creators overlap.
    pub fn with_session_delay(mut self, delay: Duration) -> Self {
        self.session_delay = delay;
        self
    }
}

#[async_trait]
impl UpstreamBackend for MockBackend {
    async fn initialize(
        &self,
        credentials: &Credentials,
    ) -> UpstreamResult<Arc<dyn UpstreamHandle>> {
        let attempt = self.log.handshakes.fetch_add(1, Ordering::SeqCst);
        self.log
            .attempted
            .lock()
            .unwrap()
            .push(credentials.secure_1psid.clone());
        if !self.handshake_delay.is_zero() {
            tokio::time::sleep(self.handshake_delay).await;
        }
        if attempt < self.fail_first {
            return Err(UpstreamError::Transport("bridge unavailable".to_string()));
        }
        if let Some(accepted) = &self.accepted_psid
            && accepted != &credentials.secure_1psid
        {
            return Err(UpstreamError::Rejected {
                status: 401,
                message: "cookie expired".to_string(),
            });
        }
        Ok(Arc::new(MockHandle {
            log: self.log.clone(),
            session_delay: self.session_delay,
            reply: self.reply.clone(),
        }))
    }
}

struct MockHandle {
    log: Arc<UpstreamLog>,
    session_delay: Duration,
    reply: String,
}

#[async_trait]
impl UpstreamHandle for MockHandle {
    async fn send(&self, prompt: &str) -> UpstreamResult<String> {
        self.log.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    async fn start_session(&self, model: &str) -> UpstreamResult<Arc<dyn ConversationSession>> {
        self.log.sessions.lock().unwrap().push(model.to_string());
        if !self.session_delay.is_zero() {
            tokio::time::sleep(self.session_delay).await;
        }
        Ok(Arc::new(MockSession {
            model: model.to_string(),
            log: self.log.clone(),
            reply: self.reply.clone(),
        }))
    }
}

struct MockSession {
    model: String,
    log: Arc<UpstreamLog>,
    reply: String,
}

#[async_trait]
impl ConversationSession for MockSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, prompt: &str) -> UpstreamResult<String> {
        self.log.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub stored: Mutex<Option<Credentials>>,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn holding(credentials: Credentials) -> Self {
        Self {
            stored: Mutex::new(Some(credentials)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Credentials> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Option<Credentials> {
        self.stored.lock().unwrap().clone()
    }

    async fn save(&self, credentials: &Credentials) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.stored.lock().unwrap().is_some()
    }
}
