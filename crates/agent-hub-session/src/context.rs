//! One isolated conversation/execution session.

use std::sync::Arc;

use agent_hub_core::{AgentLoop, ChatRecord, Log};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    service::ServiceError,
    slot::{ExecutionSlot, ResultHandle},
};

/// Roster entry describing one live context, used by pollers to keep
/// the list of open conversations current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    /// Context id.
    pub id: String,
    /// Creation order number.
    pub no: u64,
    /// Current log guid.
    pub log_guid: Uuid,
    /// Current log version counter.
    pub log_version: u64,
    /// Current log length.
    pub log_length: usize,
    /// Pause flag.
    pub paused: bool,
}

/// One stateful conversation session: identity, log, execution slot.
pub struct Context {
    id: String,
    no: u64,
    log: Arc<Log>,
    slot: ExecutionSlot,
}

impl Context {
    pub(crate) fn new(id: String, no: u64, agent: Arc<dyn AgentLoop>) -> Self {
        let log = Arc::new(Log::new());
        let slot = ExecutionSlot::spawn(agent, Arc::clone(&log));
        Self { id, no, log, slot }
    }

    /// Rebuild a context from its persisted chat record.
    pub(crate) fn restore(record: ChatRecord, no: u64, agent: Arc<dyn AgentLoop>) -> Self {
        let log = Arc::new(Log::from_parts(
            record.guid,
            record.version,
            record.entries,
            record.progress,
        ));
        let slot = ExecutionSlot::spawn(agent, Arc::clone(&log));
        Self {
            id: record.id,
            no,
            log,
            slot,
        }
    }

    /// Context id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation order number; the lowest is the default context.
    #[must_use]
    pub const fn no(&self) -> u64 {
        self.no
    }

    /// The context's log.
    #[must_use]
    pub const fn log(&self) -> &Arc<Log> {
        &self.log
    }

    /// Hand one input to the execution slot. Fire-and-forget unless the
    /// caller keeps the handle.
    pub fn communicate(&self, text: impl Into<String>) -> ResultHandle {
        self.slot.submit(text)
    }

    /// Set or clear the pause flag.
    pub fn set_paused(&self, paused: bool) {
        self.slot.set_paused(paused);
    }

    /// Current pause flag.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.slot.is_paused()
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Clear the log and assign it a fresh guid. The context keeps its
    /// id and registry membership.
    ///
    /// # Errors
    /// Fails fast with [`ServiceError::Busy`] while a submission is in
    /// flight. Queued submissions survive and write to the fresh log.
    pub fn reset(&self) -> Result<(), ServiceError> {
        if self.slot.is_busy() {
            return Err(ServiceError::Busy(self.id.clone()));
        }
        self.log.reset();
        Ok(())
    }

    /// Roster summary for pollers.
    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        let meta = self.log.snapshot_meta();
        ContextSummary {
            id: self.id.clone(),
            no: self.no,
            log_guid: meta.guid,
            log_version: meta.version,
            log_length: meta.len,
            paused: self.is_paused(),
        }
    }

    /// Capture the full serialized form for persistence or export.
    #[must_use]
    pub fn export(&self) -> ChatRecord {
        let view = self.log.poll_view(0);
        ChatRecord {
            id: self.id.clone(),
            guid: view.meta.guid,
            version: view.meta.version,
            entries: view.entries,
            progress: view.progress,
        }
    }
}
