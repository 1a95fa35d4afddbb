//! Model selection persisted as one JSON config file.

use std::path::PathBuf;

use agent_hub_core::StorageError;
use serde::{Deserialize, Serialize};

/// The three model roles the agent loop is wired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Main conversational model.
    pub chat_model: String,
    /// Model for internal utility calls.
    pub utility_model: String,
    /// Embedding model.
    pub embedding_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            utility_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Load/save for the model selection, backed by a single JSON file.
///
/// A missing file reads as the defaults; the file appears on first
/// save.
pub struct ModelConfigStore {
    path: PathBuf,
}

impl ModelConfigStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the current selection, falling back to the defaults when no
    /// file exists yet.
    ///
    /// # Errors
    /// I/O failures other than a missing file, or a malformed file.
    pub async fn load(&self) -> Result<ModelConfig, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ModelConfig::default());
            }
            Err(e) => return Err(StorageError::Internal(e.to_string())),
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// Persist a selection, replacing the previous one.
    ///
    /// # Errors
    /// I/O failures.
    pub async fn save(&self, config: &ModelConfig) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::Internal(e.to_string()))?;
            }
        }
        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelConfigStore::new(dir.path().join("config.json"));
        assert_eq!(store.load().await.unwrap(), ModelConfig::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelConfigStore::new(dir.path().join("config.json"));

        let config = ModelConfig {
            chat_model: "gpt-4o".to_string(),
            utility_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
        };
        store.save(&config).await.unwrap();
        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = ModelConfigStore::new(path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Internal(_)));
    }

    #[test]
    fn config_requires_every_model_key() {
        let err = serde_json::from_str::<ModelConfig>(r#"{"chat_model":"gpt-4o"}"#).unwrap_err();
        assert!(err.to_string().contains("utility_model"));
    }
}
