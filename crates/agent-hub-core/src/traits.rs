//! Traits for the agent loop and chat persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AgentError, StorageError},
    log::{Log, LogEntry},
};

/// The reasoning/tool loop running inside a context.
///
/// Given the context's log and one input text, an implementation
/// appends and revises log entries as it works and returns the final
/// response text. Failures are captured by the execution slot and
/// surfaced as failed results, never as service crashes.
#[async_trait]
pub trait AgentLoop: Send + Sync {
    /// Process one input to completion.
    async fn respond(&self, log: Arc<Log>, input: String) -> Result<String, AgentError>;
}

/// Serialized form of one chat, used for persistence and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Context id.
    pub id: String,
    /// Log guid at the time of capture.
    pub guid: Uuid,
    /// Log version counter at the time of capture. Defaults to zero for
    /// records written before the counter was persisted; restore clamps
    /// it to the entries' highest `update_id`.
    #[serde(default)]
    pub version: u64,
    /// All log entries.
    pub entries: Vec<LogEntry>,
    /// Latest progress line.
    #[serde(default)]
    pub progress: String,
}

/// Trait for chat persistence backends.
#[async_trait]
pub trait ChatStorage: Send + Sync {
    /// Load every persisted chat. Invoked once at process start to
    /// repopulate the registry.
    async fn load_all(&self) -> Result<Vec<ChatRecord>, StorageError>;

    /// Persist one chat, replacing any previous version.
    async fn save(&self, record: &ChatRecord) -> Result<(), StorageError>;

    /// Delete a persisted chat. Absent ids are a no-op.
    async fn remove(&self, id: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::EntryKind;

    #[test]
    fn chat_record_round_trips_through_json() {
        let record = ChatRecord {
            id: "ctx-1".to_string(),
            guid: Uuid::new_v4(),
            version: 3,
            entries: vec![LogEntry {
                no: 0,
                kind: EntryKind::User,
                heading: Some("User message".to_string()),
                content: "hello".to_string(),
                update_id: 1,
            }],
            progress: "done".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ChatRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.guid, record.guid);
        assert_eq!(parsed.version, record.version);
        assert_eq!(parsed.entries, record.entries);
        assert_eq!(parsed.progress, record.progress);
    }

    #[test]
    fn chat_record_optional_fields_default_when_missing() {
        let json = format!(r#"{{"id":"c","guid":"{}","entries":[]}}"#, Uuid::new_v4());
        let parsed: ChatRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.progress, "");
        assert_eq!(parsed.version, 0);
    }
}
