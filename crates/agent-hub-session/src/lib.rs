//! Context multiplexing: registry, execution slots, message service.
//!
//! Provides:
//! - `ExecutionSlot` / `ResultHandle` - Serialized per-context processing
//! - `Context` / `ContextRegistry` - Live session map
//! - `MessageService` - Submit/pause/poll/reset/remove/export surface
//! - `SchedulerBridge` - Timer-driven submitter
//! - Storage implementations (memory, JSON files)
//! - `ModelConfigStore` - File-backed model selection

pub mod context;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod slot;
pub mod storage;

pub use context::{Context, ContextSummary};
pub use models::{ModelConfig, ModelConfigStore};
pub use registry::ContextRegistry;
pub use scheduler::{ScheduledMessage, SchedulerBridge};
pub use service::{
    ExportReply, MessageService, PauseReply, PollReply, ServiceConfig, ServiceError, SubmitReply,
};
pub use slot::{ExecutionSlot, ResultHandle};
pub use storage::{JsonFileStorage, MemoryStorage};
