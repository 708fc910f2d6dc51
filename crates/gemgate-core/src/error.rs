use gemgate_upstream::UpstreamError;

/// Every credential attempt failed. Carries the error of the last attempt.
#[derive(Debug, Clone, thiserror::Error)]
#[error("upstream client initialization failed after {attempts} attempt(s): {last}")]
pub struct InitError {
    pub attempts: usize,
    pub last: UpstreamError,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The caller sent something the gateway cannot act on (400).
    #[error("{0}")]
    InvalidRequest(String),
    /// Initialization, session creation, or message exchange failed (500).
    #[error("{0}")]
    Upstream(String),
}

impl GatewayError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        GatewayError::InvalidRequest(message.into())
    }
}

impl From<InitError> for GatewayError {
    fn from(err: InitError) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}
