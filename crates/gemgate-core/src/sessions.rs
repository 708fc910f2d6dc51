use std::collections::HashMap;
use std::sync::Arc;

use gemgate_upstream::{ConversationSession, UpstreamHandle, UpstreamResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Identity used when the caller does not name one.
pub const DEFAULT_IDENTITY: &str = "default";

/// Caller identity -> live upstream conversation.
///
/// Sessions live for the process lifetime. The model is fixed when a session
/// is created; later requests under the same identity reuse it regardless of
/// the model they ask for.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<dyn ConversationSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(
        &self,
        handle: &dyn UpstreamHandle,
        identity: &str,
        model: &str,
    ) -> UpstreamResult<Arc<dyn ConversationSession>> {
        if let Some(session) = self.sessions.read().await.get(identity) {
            return Ok(session.clone());
        }

        // Not holding the lock across the upstream call. Two racing creators
        // both open a conversation; the first insert wins.
        let created = handle.start_session(model).await?;

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(identity.to_string())
            .or_insert_with(|| created.clone())
            .clone();
        if Arc::ptr_eq(&session, &created) {
            info!(event = "session_created", identity, model, "opened upstream conversation");
        } else {
            debug!(identity, "discarded duplicate conversation");
        }
        Ok(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
