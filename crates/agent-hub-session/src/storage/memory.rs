//! In-memory chat storage.

use std::{collections::HashMap, sync::RwLock};

use agent_hub_core::{ChatRecord, ChatStorage, StorageError};
use async_trait::async_trait;

/// In-memory storage implementation.
///
/// Useful for development and tests. Data is lost on restart.
pub struct MemoryStorage {
    chats: RwLock<HashMap<String, ChatRecord>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chats: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStorage for MemoryStorage {
    async fn load_all(&self) -> Result<Vec<ChatRecord>, StorageError> {
        let chats = self
            .chats
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let mut records: Vec<ChatRecord> = chats.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn save(&self, record: &ChatRecord) -> Result<(), StorageError> {
        self.chats
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.chats
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .remove(id);
        Ok(())
    }
}
