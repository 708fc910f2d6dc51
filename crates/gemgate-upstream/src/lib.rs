//! Upstream contracts for gemgate.
//!
//! The upstream conversational backend is opaque to the gateway. It is only
//! reached through three operations: `UpstreamBackend::initialize`,
//! `UpstreamHandle::send` / `UpstreamHandle::start_session`, and
//! `ConversationSession::send_message`. This crate defines those seams, the
//! credential pair they authenticate with, and the model-name table.

pub mod backend;
pub mod bridge;
pub mod credentials;
pub mod errors;
pub mod model_map;

pub use backend::{ConversationSession, UpstreamBackend, UpstreamHandle};
pub use bridge::{BridgeBackend, BridgeConfig};
pub use credentials::Credentials;
pub use errors::{UpstreamError, UpstreamResult};
pub use model_map::upstream_model;
