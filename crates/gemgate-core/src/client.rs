use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gemgate_storage::CredentialStore;
use gemgate_upstream::{Credentials, UpstreamBackend, UpstreamError, UpstreamHandle};
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::error::InitError;

/// Lifecycle of the shared upstream client.
///
/// `Failed` is transient: it is logged and immediately folds back into
/// `Uninitialized`, so the next request retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl ClientState {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientState::Uninitialized => "uninitialized",
            ClientState::Initializing => "initializing",
            ClientState::Ready => "ready",
            ClientState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CredentialSource {
    Persisted,
    Configured,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Persisted => f.write_str("persisted"),
            CredentialSource::Configured => f.write_str("configured"),
        }
    }
}

/// Owns the single process-wide upstream handle.
///
/// Once `Ready`, reads never take the lock. Initialization runs under
/// `init_lock` so that concurrent first callers share one handshake.
pub struct ClientManager {
    backend: Arc<dyn UpstreamBackend>,
    store: Arc<dyn CredentialStore>,
    configured: Credentials,
    init_timeout: Duration,
    handle: OnceCell<Arc<dyn UpstreamHandle>>,
    init_lock: Mutex<()>,
}

impl ClientManager {
    pub fn new(
        backend: Arc<dyn UpstreamBackend>,
        store: Arc<dyn CredentialStore>,
        configured: Credentials,
        init_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            configured,
            init_timeout,
            handle: OnceCell::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Returns the ready handle, initializing it on first use.
    pub async fn acquire(&self) -> Result<Arc<dyn UpstreamHandle>, InitError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        let _guard = self.init_lock.lock().await;
        // Another caller may have finished while we waited.
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        transition(ClientState::Initializing);
        match self.initialize().await {
            Ok(handle) => {
                // Only the lock holder writes the cell and it was empty above.
                let _ = self.handle.set(handle.clone());
                transition(ClientState::Ready);
                Ok(handle)
            }
            Err(err) => {
                warn!(
                    event = "client_init_failed",
                    attempts = err.attempts,
                    error = %err.last,
                    "upstream client initialization failed"
                );
                transition(ClientState::Failed);
                transition(ClientState::Uninitialized);
                Err(err)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.handle.initialized()
    }

    /// Current state. A dropped in-flight initialization reads as
    /// `Uninitialized` again because the lock is released with it.
    pub fn state(&self) -> ClientState {
        if self.handle.initialized() {
            ClientState::Ready
        } else if self.init_lock.try_lock().is_err() {
            ClientState::Initializing
        } else {
            ClientState::Uninitialized
        }
    }

    pub async fn credentials_persisted(&self) -> bool {
        self.store.exists().await
    }

    async fn initialize(&self) -> Result<Arc<dyn UpstreamHandle>, InitError> {
        let mut attempts = 0;

        let persisted = self.store.load().await;
        if let Some(credentials) = persisted.as_ref() {
            attempts += 1;
            match self
                .handshake(credentials, CredentialSource::Persisted)
                .await
            {
                Ok(handle) => {
                    self.persist(credentials).await;
                    return Ok(handle);
                }
                Err(err) if persisted.as_ref() == Some(&self.configured) => {
                    // The configured pair is the same one; retrying it is pointless.
                    return Err(InitError {
                        attempts,
                        last: err,
                    });
                }
                Err(_) => {}
            }
        }

        attempts += 1;
        match self
            .handshake(&self.configured, CredentialSource::Configured)
            .await
        {
            Ok(handle) => {
                self.persist(&self.configured).await;
                Ok(handle)
            }
            Err(last) => Err(InitError { attempts, last }),
        }
    }

    async fn handshake(
        &self,
        credentials: &Credentials,
        source: CredentialSource,
    ) -> Result<Arc<dyn UpstreamHandle>, UpstreamError> {
        info!(event = "upstream_handshake", source = %source, "attempting upstream handshake");
        let result = match tokio::time::timeout(
            self.init_timeout,
            self.backend.initialize(credentials),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.init_timeout)),
        };
        if let Err(err) = &result {
            warn!(
                event = "upstream_handshake_failed",
                source = %source,
                error = %err,
                "upstream handshake failed"
            );
        }
        result
    }

    async fn persist(&self, credentials: &Credentials) {
        match self.store.save(credentials).await {
            Ok(()) => info!(event = "credentials_persisted", "saved working credentials"),
            Err(err) => warn!(
                event = "credentials_persist_failed",
                error = %err,
                "failed to save working credentials"
            ),
        }
    }
}

fn transition(state: ClientState) {
    info!(event = "client_state", client_state = state.as_str());
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::future::join_all;
    use gemgate_upstream::{Credentials, UpstreamError};

    use super::{ClientManager, ClientState};
    use crate::testing::{MemoryStore, MockBackend};

    fn manager(backend: &Arc<MockBackend>, store: &Arc<MemoryStore>, psid: &str) -> ClientManager {
        ClientManager::new(
            backend.clone(),
            store.clone(),
            Credentials::new(psid, Some("ts".to_string())),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_shares_one_handshake() {
        let backend = Arc::new(MockBackend::new("ok").with_delay(Duration::from_millis(50)));
        let store = Arc::new(MemoryStore::default());
        let client = Arc::new(manager(&backend, &store, "good"));

        let calls = (0..8).map(|_| {
            let client = client.clone();
            async move { client.acquire().await.map(|_| ()) }
        });
        let results = join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(backend.log.handshakes(), 1);
        assert_eq!(store.saves(), 1);
        assert_eq!(client.state(), ClientState::Ready);
    }

    #[tokio::test]
    async fn ready_client_is_reused() {
        let backend = Arc::new(MockBackend::new("ok"));
        let store = Arc::new(MemoryStore::default());
        let client = manager(&backend, &store, "good");

        let first = client.acquire().await.unwrap();
        let second = client.acquire().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.log.handshakes(), 1);
    }

    #[tokio::test]
    async fn stale_persisted_credentials_fall_back_to_configured() {
        let backend = Arc::new(MockBackend::new("ok").accepting("fresh"));
        let store = Arc::new(MemoryStore::holding(Credentials::new("stale", None)));
        let client = manager(&backend, &store, "fresh");

        client.acquire().await.unwrap();

        assert_eq!(backend.log.attempted(), vec!["stale", "fresh"]);
        assert_eq!(store.stored().unwrap().secure_1psid, "fresh");
    }

    #[tokio::test]
    async fn working_persisted_credentials_win() {
        let backend = Arc::new(MockBackend::new("ok").accepting("cached"));
        let store = Arc::new(MemoryStore::holding(Credentials::new("cached", None)));
        let client = manager(&backend, &store, "configured");

        client.acquire().await.unwrap();

        assert_eq!(backend.log.attempted(), vec!["cached"]);
        assert_eq!(store.stored().unwrap().secure_1psid, "cached");
    }

    #[tokio::test]
    async fn identical_pairs_are_tried_once() {
        let backend = Arc::new(MockBackend::new("ok").accepting("other"));
        let configured = Credentials::new("same", Some("ts".to_string()));
        let store = Arc::new(MemoryStore::holding(configured.clone()));
        let client = manager(&backend, &store, "same");

        let err = client.acquire().await.err().unwrap();

        assert_eq!(err.attempts, 1);
        assert_eq!(backend.log.handshakes(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_sticky() {
        let backend = Arc::new(MockBackend::new("ok").failing_first(1));
        let store = Arc::new(MemoryStore::default());
        let client = manager(&backend, &store, "good");

        let err = client.acquire().await.err().unwrap();
        assert!(matches!(err.last, UpstreamError::Transport(_)));
        assert_eq!(client.state(), ClientState::Uninitialized);
        assert_eq!(store.saves(), 0);

        client.acquire().await.unwrap();
        assert_eq!(client.state(), ClientState::Ready);
        assert_eq!(backend.log.handshakes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handshake_times_out() {
        let backend = Arc::new(MockBackend::new("ok").with_delay(Duration::from_secs(60)));
        let store = Arc::new(MemoryStore::default());
        let client = ClientManager::new(
            backend.clone(),
            store.clone(),
            Credentials::new("good", None),
            Duration::from_secs(30),
        );

        let err = client.acquire().await.err().unwrap();

        assert!(matches!(err.last, UpstreamError::Timeout(d) if d == Duration::from_secs(30)));
        assert!(!client.is_ready());
    }
}
