//! Chat storage as one JSON file per chat in a directory.

use std::path::{Path, PathBuf};

use agent_hub_core::{ChatRecord, ChatStorage, StorageError};
use async_trait::async_trait;

/// Directory-backed storage: `<dir>/<id>.json` per chat.
///
/// Survives restarts; suitable for the single-process deployments this
/// service targets.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage rooted at `dir`. The directory is created on
    /// first load or save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn chat_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        // ids become file names; reject anything that would escape the dir
        if id.is_empty()
            || id.contains('/')
            || id.contains('\\')
            || id.contains("..")
            || id.starts_with('.')
        {
            return Err(StorageError::Internal(format!("invalid chat id: {id:?}")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

fn is_chat_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

#[async_trait]
impl ChatStorage for JsonFileStorage {
    async fn load_all(&self) -> Result<Vec<ChatRecord>, StorageError> {
        self.ensure_dir().await?;

        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?
        {
            let path = entry.path();
            if !is_chat_file(&path) {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::Internal(e.to_string()))?;
            match serde_json::from_str::<ChatRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping malformed chat file");
                }
            }
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn save(&self, record: &ChatRecord) -> Result<(), StorageError> {
        self.ensure_dir().await?;
        let path = self.chat_path(&record.id)?;
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let path = self.chat_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Internal(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use agent_hub_core::{EntryKind, LogEntry};
    use uuid::Uuid;

    use super::*;

    fn record(id: &str) -> ChatRecord {
        ChatRecord {
            id: id.to_string(),
            guid: Uuid::new_v4(),
            version: 1,
            entries: vec![LogEntry {
                no: 0,
                kind: EntryKind::Agent,
                heading: None,
                content: "reply".to_string(),
                update_id: 1,
            }],
            progress: "idle".to_string(),
        }
    }

    #[tokio::test]
    async fn save_then_load_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        storage.save(&record("one")).await.unwrap();
        storage.save(&record("two")).await.unwrap();

        let loaded = storage.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "one");
        assert_eq!(loaded[0].entries[0].content, "reply");
    }

    #[tokio::test]
    async fn remove_missing_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        storage.remove("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("bad.json"), b"{ not json")
            .await
            .unwrap();

        let storage = JsonFileStorage::new(dir.path());
        storage.save(&record("good")).await.unwrap();

        let loaded = storage.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "good");
    }

    #[tokio::test]
    async fn path_escaping_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        let err = storage.save(&record("../evil")).await.unwrap_err();
        assert!(matches!(err, StorageError::Internal(_)));
    }

    #[tokio::test]
    async fn load_all_on_fresh_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested"));
        assert!(storage.load_all().await.unwrap().is_empty());
    }
}
