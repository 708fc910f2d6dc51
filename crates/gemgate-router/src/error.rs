use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gemgate_core::GatewayError;
use gemgate_protocol::openai::error::ErrorResponse;

/// [`GatewayError`] rendered as the OpenAI error envelope.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            GatewayError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error"),
        };
        (status, Json(ErrorResponse::new(kind, self.0.to_string()))).into_response()
    }
}
