use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{HeaderName, HeaderValue, Request, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use gemgate_core::{CompletionOutcome, Gateway, GatewayError, StreamEvent};
use gemgate_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;
use gemgate_protocol::openai::create_completions::request::CreateCompletionRequestBody;
use gemgate_protocol::sse::{CONTENT_TYPE_EVENT_STREAM, encode_done, encode_sse};

use crate::error::ApiError;

/// Response header carrying the per-request trace id.
pub const REQUEST_ID_HEADER: &str = "x-gemgate-request-id";

#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<Gateway>,
}

#[derive(Clone)]
struct RequestTraceId(String);

pub fn gateway_router(gateway: Arc<Gateway>) -> Router {
    let state = GatewayState { gateway };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/v1/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/completions", post(completions))
        .layer(middleware::from_fn(request_trace))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn request_trace(mut req: Request<Body>, next: Next) -> Response {
    let trace_id = uuid::Uuid::now_v7().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut()
        .insert(RequestTraceId(trace_id.clone()));
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        "request received"
    );

    let started = Instant::now();
    let mut resp = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        resp.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    info!(
        event = "downstream_responded",
        trace_id = %trace_id,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    resp
}

async fn root(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(state.gateway.descriptor())
}

async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(state.gateway.health().await)
}

async fn list_models(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(state.gateway.list_models())
}

async fn chat_completions(
    State(state): State<GatewayState>,
    Extension(trace_id): Extension<RequestTraceId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateChatCompletionRequestBody = parse_json_body(&body)?;
    info!(
        event = "chat_completion",
        trace_id = %trace_id.0,
        model = %request.model,
        stream = request.is_stream(),
        messages = request.messages.len(),
        "chat completion requested"
    );
    let outcome = state
        .gateway
        .create_completion(request)
        .await
        .inspect_err(|err| log_failure(&trace_id, err))?;
    Ok(outcome_response(outcome))
}

async fn completions(
    State(state): State<GatewayState>,
    Extension(trace_id): Extension<RequestTraceId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateCompletionRequestBody = parse_json_body(&body)?;
    info!(
        event = "legacy_completion",
        trace_id = %trace_id.0,
        model = %request.model,
        stream = request.stream.unwrap_or(false),
        "legacy completion requested"
    );
    let outcome = state
        .gateway
        .legacy_completion(request)
        .await
        .inspect_err(|err| log_failure(&trace_id, err))?;
    Ok(outcome_response(outcome))
}

fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|err| GatewayError::invalid_request(format!("invalid request body: {err}")))
}

fn log_failure(trace_id: &RequestTraceId, err: &GatewayError) {
    match err {
        GatewayError::InvalidRequest(message) => {
            info!(event = "request_rejected", trace_id = %trace_id.0, reason = %message, "rejected request")
        }
        GatewayError::Upstream(message) => {
            warn!(event = "upstream_failed", trace_id = %trace_id.0, error = %message, "upstream call failed")
        }
    }
}

fn outcome_response(outcome: CompletionOutcome) -> Response {
    match outcome {
        CompletionOutcome::Envelope(envelope) => Json(envelope).into_response(),
        CompletionOutcome::Stream(events) => {
            let stream = events.map(|event| Ok::<_, Infallible>(encode_event(event)));
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, CONTENT_TYPE_EVENT_STREAM)
                // Hint common reverse proxies to avoid buffering SSE responses.
                .header(header::CACHE_CONTROL, "no-cache")
                .header("x-accel-buffering", "no")
                .body(Body::from_stream(stream))
                .unwrap_or_else(|_| {
                    (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response()
                })
        }
    }
}

fn encode_event(event: StreamEvent) -> Bytes {
    match event {
        StreamEvent::Chunk(chunk) => serde_json::to_string(&chunk)
            .map(|json| encode_sse(None, &json))
            .unwrap_or_default(),
        StreamEvent::Done => encode_done(),
    }
}
