//! Public entry points composing the registry, slots, and persistence.

use std::{sync::Arc, time::Duration};

use agent_hub_core::{
    AgentError, AgentLoop, ChatRecord, ChatStorage, EntryKind, LogEntry, StorageError,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{context::ContextSummary, registry::ContextRegistry};

/// Service error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Context is busy: {0}")]
    Busy(String),
    #[error("Timed out after {0:?} waiting for the agent")]
    Timeout(Duration),
    #[error("Agent failure: {0}")]
    Agent(#[from] AgentError),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Service tuning knobs.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Wait budget for synchronous submissions. Timing out abandons the
    /// wait only; processing runs to completion in the background.
    pub sync_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sync_timeout: Duration::from_secs(300),
        }
    }
}

/// Reply to a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReply {
    /// Id of the context that handled the submission.
    pub context: String,
    /// Final result text (sync) or an acknowledgment (async).
    pub message: String,
}

/// Reply to a pause toggle.
#[derive(Debug, Clone, Serialize)]
pub struct PauseReply {
    /// Id of the affected context.
    pub context: String,
    /// The flag as set.
    pub paused: bool,
}

/// Reply to an export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReply {
    /// Id of the exported context.
    pub context: String,
    /// Serialized chat JSON.
    pub content: String,
}

/// Reply to a poll: everything a client needs to update its local view
/// incrementally.
#[derive(Debug, Clone, Serialize)]
pub struct PollReply {
    /// Id of the polled context.
    pub context: String,
    /// Roster of all live contexts.
    pub contexts: Vec<ContextSummary>,
    /// Entries from the requested position onward, current content.
    pub logs: Vec<LogEntry>,
    /// Current log guid; a change tells the client to drop its view.
    pub log_guid: Uuid,
    /// Current log version counter.
    pub log_version: u64,
    /// Latest progress line.
    pub log_progress: String,
    /// Pause flag of the polled context.
    pub paused: bool,
}

/// Public surface over the context registry: submit, pause, poll,
/// reset, remove, export and import.
pub struct MessageService {
    registry: ContextRegistry,
    storage: Arc<dyn ChatStorage>,
    config: ServiceConfig,
}

impl MessageService {
    /// Build the service and repopulate the registry from storage.
    ///
    /// # Errors
    /// Fails if persisted chats cannot be loaded.
    pub async fn init(
        agent: Arc<dyn AgentLoop>,
        storage: Arc<dyn ChatStorage>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        let registry = ContextRegistry::new(agent);
        for record in storage.load_all().await? {
            tracing::info!(context = %record.id, entries = record.entries.len(), "restored chat");
            registry.insert_restored(record);
        }
        Ok(Self {
            registry,
            storage,
            config,
        })
    }

    /// Submit one input text to a context, creating it on demand.
    ///
    /// Asynchronous submissions return an acknowledgment immediately
    /// while processing continues in the background. Synchronous ones
    /// wait for the result up to the configured timeout; timing out
    /// abandons the wait only, and the eventual outcome stays
    /// observable through [`Self::poll`].
    ///
    /// # Errors
    /// `Validation` on empty text; `Timeout` or `Agent` on the
    /// synchronous path.
    pub async fn submit(
        &self,
        ctx_id: &str,
        text: &str,
        sync: bool,
    ) -> Result<SubmitReply, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::Validation(
                "message text is required".to_string(),
            ));
        }

        let ctx = self.registry.get_or_create(ctx_id);
        tracing::info!(context = %ctx.id(), sync, "user message");
        ctx.log()
            .append(EntryKind::User, Some("User message".to_string()), text);

        let handle = ctx.communicate(text);
        if sync {
            match tokio::time::timeout(self.config.sync_timeout, handle.wait()).await {
                Ok(result) => Ok(SubmitReply {
                    context: ctx.id().to_string(),
                    message: result?,
                }),
                Err(_) => Err(ServiceError::Timeout(self.config.sync_timeout)),
            }
        } else {
            // handle dropped; the slot processes in the background
            Ok(SubmitReply {
                context: ctx.id().to_string(),
                message: "Message received.".to_string(),
            })
        }
    }

    /// Set or clear a context's pause flag, creating it on demand.
    pub fn set_paused(&self, ctx_id: &str, paused: bool) -> PauseReply {
        let ctx = self.registry.get_or_create(ctx_id);
        ctx.set_paused(paused);
        tracing::info!(context = %ctx.id(), paused, "pause flag set");
        PauseReply {
            context: ctx.id().to_string(),
            paused,
        }
    }

    /// Incremental read: entries from `from` onward plus the roster of
    /// all live contexts. Never suspends.
    #[must_use]
    pub fn poll(&self, ctx_id: &str, from: usize) -> PollReply {
        let ctx = self.registry.get_or_create(ctx_id);
        let view = ctx.log().poll_view(from);
        PollReply {
            context: ctx.id().to_string(),
            contexts: self.registry.list(),
            logs: view.entries,
            log_guid: view.meta.guid,
            log_version: view.meta.version,
            log_progress: view.progress,
            paused: ctx.is_paused(),
        }
    }

    /// Reset a context's log and persist the cleared state. Returns the
    /// resolved context id.
    ///
    /// # Errors
    /// `Busy` while a submission is in flight; storage failures.
    pub async fn reset(&self, ctx_id: &str) -> Result<String, ServiceError> {
        let ctx = self.registry.get_or_create(ctx_id);
        ctx.reset()?;
        self.storage.save(&ctx.export()).await?;
        tracing::info!(context = %ctx.id(), "context reset");
        Ok(ctx.id().to_string())
    }

    /// Remove a context and its persisted form. Unknown ids are a
    /// no-op.
    ///
    /// # Errors
    /// Storage failures only.
    pub async fn remove(&self, ctx_id: &str) -> Result<(), ServiceError> {
        if self.registry.remove(ctx_id).is_some() {
            tracing::info!(context = %ctx_id, "context removed");
        }
        self.storage.remove(ctx_id).await?;
        Ok(())
    }

    /// Serialize one chat to JSON, creating the context on demand.
    ///
    /// # Errors
    /// `Validation` on an empty id.
    pub fn export_chat(&self, ctx_id: &str) -> Result<ExportReply, ServiceError> {
        if ctx_id.is_empty() {
            return Err(ServiceError::Validation(
                "context id is required".to_string(),
            ));
        }
        let ctx = self.registry.get_or_create(ctx_id);
        let content = serde_json::to_string_pretty(&ctx.export())
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(ExportReply {
            context: ctx.id().to_string(),
            content,
        })
    }

    /// Restore chats from their serialized forms, persisting each.
    /// Returns the restored context ids.
    ///
    /// # Errors
    /// `Validation` on an empty list or malformed chat JSON.
    pub async fn import_chats(&self, chats: &[String]) -> Result<Vec<String>, ServiceError> {
        if chats.is_empty() {
            return Err(ServiceError::Validation("no chats provided".to_string()));
        }
        let mut ids = Vec::with_capacity(chats.len());
        for raw in chats {
            let record: ChatRecord = serde_json::from_str(raw)
                .map_err(|e| ServiceError::Validation(format!("malformed chat: {e}")))?;
            let ctx = self.registry.insert_restored(record);
            self.storage.save(&ctx.export()).await?;
            ids.push(ctx.id().to_string());
        }
        tracing::info!(count = ids.len(), "chats imported");
        Ok(ids)
    }

    /// The underlying registry, for direct lookups.
    #[must_use]
    pub const fn registry(&self) -> &ContextRegistry {
        &self.registry
    }
}
