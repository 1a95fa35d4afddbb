//! HTTP transport for the message service.
//!
//! Provides:
//! - Wire protocol types with uniform `{ ok, message }` envelopes
//! - An axum router translating requests to `MessageService` calls

pub mod http;
pub mod protocol;

pub use http::{AppState, router};
