pub mod bootstrap;
pub mod client;
pub mod error;
pub mod gateway;
pub mod sessions;
pub mod stream;
pub mod translate;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientManager, ClientState};
pub use error::{GatewayError, InitError};
pub use gateway::{CompletionOutcome, Gateway, GatewayOptions, HealthSnapshot, ServiceDescriptor};
pub use sessions::{DEFAULT_IDENTITY, SessionRegistry};
pub use stream::{ReplyStream, StreamEvent};
