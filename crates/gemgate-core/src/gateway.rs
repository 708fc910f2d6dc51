use std::time::Duration;

use gemgate_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;
use gemgate_protocol::openai::create_chat_completions::response::CreateChatCompletionResponse;
use gemgate_protocol::openai::create_chat_completions::types::{
    ChatCompletionRequestMessage, ChatCompletionRole,
};
use gemgate_protocol::openai::create_completions::request::CreateCompletionRequestBody;
use gemgate_protocol::openai::get_model::types::{Model, ModelObjectType};
use gemgate_protocol::openai::list_models::response::{ListModelsResponse, ListObjectType};
use gemgate_upstream::upstream_model;
use serde::Serialize;
use tracing::debug;

use crate::client::ClientManager;
use crate::error::GatewayError;
use crate::sessions::{DEFAULT_IDENTITY, SessionRegistry};
use crate::stream::{ReplyStream, stream_reply};
use crate::translate::{completion_id, to_envelope, to_prompt, unix_now};

/// Advertised catalog: (id, owned_by).
const ADVERTISED_MODELS: &[(&str, &str)] = &[
    ("gpt-3.5-turbo", "openai-mapped"),
    ("gpt-4", "openai-mapped"),
    ("gemini-2.5-flash", "google"),
    ("gemini-2.5-pro", "google"),
];

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub stream_delay: Duration,
    /// Advertised by `GET /`.
    pub public_base_url: String,
}

pub enum CompletionOutcome {
    Envelope(CreateChatCompletionResponse),
    Stream(ReplyStream),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub client_initialized: bool,
    pub active_sessions: usize,
    pub cookie_persistence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub message: &'static str,
    pub version: &'static str,
    pub openai_base_url: String,
}

/// The OpenAI-compatible operations, independent of any HTTP framework.
pub struct Gateway {
    client: ClientManager,
    sessions: SessionRegistry,
    options: GatewayOptions,
}

impl Gateway {
    pub fn new(client: ClientManager, options: GatewayOptions) -> Self {
        Self {
            client,
            sessions: SessionRegistry::new(),
            options,
        }
    }

    pub fn client(&self) -> &ClientManager {
        &self.client
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            message: "gemgate: OpenAI-compatible gateway",
            version: env!("CARGO_PKG_VERSION"),
            openai_base_url: self.options.public_base_url.clone(),
        }
    }

    /// Static catalog. Never touches the upstream.
    pub fn list_models(&self) -> ListModelsResponse {
        let created = unix_now();
        ListModelsResponse {
            object: ListObjectType::List,
            data: ADVERTISED_MODELS
                .iter()
                .map(|(id, owned_by)| Model {
                    id: (*id).to_string(),
                    object: ModelObjectType::Model,
                    created,
                    owned_by: (*owned_by).to_string(),
                })
                .collect(),
        }
    }

    pub async fn create_completion(
        &self,
        request: CreateChatCompletionRequestBody,
    ) -> Result<CompletionOutcome, GatewayError> {
        if request.messages.is_empty() {
            return Err(GatewayError::invalid_request(
                "messages must contain at least one message",
            ));
        }

        let handle = self.client.acquire().await?;

        let target_model = upstream_model(&request.model);
        let identity = request
            .user
            .as_deref()
            .filter(|user| !user.is_empty())
            .unwrap_or(DEFAULT_IDENTITY);
        debug!(model = %request.model, upstream_model = target_model, identity, "resolved conversation");

        let session = self
            .sessions
            .get_or_create(handle.as_ref(), identity, target_model)
            .await?;

        let prompt = to_prompt(&request.messages);
        let reply = session.send_message(&prompt).await?;

        if request.is_stream() {
            Ok(CompletionOutcome::Stream(stream_reply(
                &reply,
                request.model,
                completion_id(),
                self.options.stream_delay,
            )))
        } else {
            Ok(CompletionOutcome::Envelope(to_envelope(
                &reply,
                &prompt,
                &request.model,
            )))
        }
    }

    /// Legacy text completion, answered in the chat-completion shape.
    pub async fn legacy_completion(
        &self,
        request: CreateCompletionRequestBody,
    ) -> Result<CompletionOutcome, GatewayError> {
        let prompt = request.prompt.into_text();
        let mut chat = CreateChatCompletionRequestBody::new(
            request.model,
            vec![ChatCompletionRequestMessage::new(ChatCompletionRole::User, prompt)],
        );
        chat.temperature = request.temperature;
        chat.max_tokens = request.max_tokens;
        chat.stream = request.stream;
        chat.user = request.user;
        self.create_completion(chat).await
    }

    pub async fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "healthy",
            client_initialized: self.client.is_ready(),
            active_sessions: self.sessions.len().await,
            cookie_persistence: self.client.credentials_persisted().await,
        }
    }
}
