//! HTTP adapter that reaches the upstream through a bridge sidecar.
//!
//! The bridge owns the upstream's own protocol; gemgate only speaks this small
//! JSON contract to it:
//!
//! | call | request | response |
//! |---|---|---|
//! | `POST /v1/clients` | `{"SECURE_1PSID", "SECURE_1PSIDTS"}` | `{"client_id"}` |
//! | `POST /v1/clients/{client_id}/generate` | `{"prompt"}` | `{"text"}` |
//! | `POST /v1/clients/{client_id}/chats` | `{"model"}` | `{"chat_id"}` |
//! | `POST /v1/chats/{chat_id}/messages` | `{"prompt"}` | `{"text"}` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wreq::{Client, Method, Proxy};

use crate::backend::{ConversationSession, UpstreamBackend, UpstreamHandle};
use crate::credentials::Credentials;
use crate::errors::{UpstreamError, UpstreamResult};

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
}

impl BridgeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
struct BridgeClient {
    http: Client,
    base_url: Arc<str>,
}

#[derive(Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
}

#[derive(Deserialize)]
struct ClientCreated {
    client_id: String,
}

#[derive(Deserialize)]
struct ChatCreated {
    chat_id: String,
}

#[derive(Deserialize)]
struct TextReply {
    text: String,
}

pub struct BridgeBackend {
    client: BridgeClient,
}

impl BridgeBackend {
    pub fn new(config: BridgeConfig) -> UpstreamResult<Self> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(proxy) = normalize_proxy(config.proxy) {
            builder = builder.proxy(Proxy::all(proxy.as_str()).map_err(map_wreq_error)?);
        }
        let http = builder.build().map_err(map_wreq_error)?;
        Ok(Self {
            client: BridgeClient {
                http,
                base_url: Arc::from(config.base_url.trim_end_matches('/')),
            },
        })
    }
}

#[async_trait]
impl UpstreamBackend for BridgeBackend {
    async fn initialize(
        &self,
        credentials: &Credentials,
    ) -> UpstreamResult<Arc<dyn UpstreamHandle>> {
        let created: ClientCreated = self.client.post("/v1/clients", credentials).await?;
        debug!(client_id = %created.client_id, "bridge client created");
        Ok(Arc::new(BridgeHandle {
            client: self.client.clone(),
            client_id: created.client_id,
        }))
    }
}

struct BridgeHandle {
    client: BridgeClient,
    client_id: String,
}

#[async_trait]
impl UpstreamHandle for BridgeHandle {
    async fn send(&self, prompt: &str) -> UpstreamResult<String> {
        let path = format!("/v1/clients/{}/generate", self.client_id);
        let reply: TextReply = self.client.post(&path, &PromptBody { prompt }).await?;
        Ok(reply.text)
    }

    async fn start_session(&self, model: &str) -> UpstreamResult<Arc<dyn ConversationSession>> {
        let path = format!("/v1/clients/{}/chats", self.client_id);
        let created: ChatCreated = self.client.post(&path, &ChatBody { model }).await?;
        Ok(Arc::new(BridgeSession {
            client: self.client.clone(),
            chat_id: created.chat_id,
            model: model.to_string(),
        }))
    }
}

struct BridgeSession {
    client: BridgeClient,
    chat_id: String,
    model: String,
}

#[async_trait]
impl ConversationSession for BridgeSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, prompt: &str) -> UpstreamResult<String> {
        let path = format!("/v1/chats/{}/messages", self.chat_id);
        let reply: TextReply = self.client.post(&path, &PromptBody { prompt }).await?;
        Ok(reply.text)
    }
}

impl BridgeClient {
    async fn post<B, T>(&self, path: &str, body: &B) -> UpstreamResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        let payload =
            serde_json::to_vec(body).map_err(|err| UpstreamError::Protocol(err.to_string()))?;
        let resp = self
            .http
            .request(Method::POST, &url)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_wreq_error)?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(map_wreq_error)?;
        if !(200..300).contains(&status) {
            return Err(UpstreamError::Rejected {
                status,
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|err| UpstreamError::Protocol(err.to_string()))
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn normalize_proxy(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn map_wreq_error(err: wreq::Error) -> UpstreamError {
    UpstreamError::Transport(err.to_string())
}
