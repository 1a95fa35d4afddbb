//! Core abstractions for multiplexed agent contexts.
//!
//! This crate provides the fundamental building blocks:
//! - `Log` - Versioned, append-mostly record of a context's output
//! - `LogEntry` / `EntryKind` - Typed log entries
//! - `AgentLoop` and `ChatStorage` traits
//! - `ChatRecord` - Serialized chat form for persistence and export

pub mod error;
pub mod log;
pub mod traits;

pub use error::{AgentError, LogError, StorageError};
pub use log::{EntryKind, Log, LogEntry, LogMeta, PollView};
pub use traits::{AgentLoop, ChatRecord, ChatStorage};
