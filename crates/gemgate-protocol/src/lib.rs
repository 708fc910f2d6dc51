//! Wire types for the OpenAI-compatible surface exposed by gemgate.
//!
//! Only the subset of the protocol that the gateway answers is modeled here.
//! Field names follow the public API exactly so existing clients can point
//! their base URL at the gateway unchanged.

pub mod openai;
pub mod sse;
