//! HTTP surface of gemgate: OpenAI-compatible routes over [`gemgate_core::Gateway`].

mod error;
mod openai;

pub use error::ApiError;
pub use openai::{GatewayState, REQUEST_ID_HEADER, gateway_router};
