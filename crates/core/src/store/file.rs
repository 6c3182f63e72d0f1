use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreError, StoredEntry};

/// Get the root cache directory used for persisted visitor state
pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("pixeltap")
}

/// Get the default path of the persisted store
pub fn get_store_path() -> PathBuf {
    get_root_cache_dir().join("store.json")
}

/// JSON-file backed store, so the visitor identity survives between runs.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> std::io::Result<HashMap<String, StoredEntry>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
    }

    async fn save(&self, entries: &HashMap<String, StoredEntry>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let pretty_json = serde_json::to_string_pretty(entries).map_err(std::io::Error::other)?;
        fs::write(&self.path, pretty_json).await
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(get_store_path())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await.map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let write_err = |e: std::io::Error| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };

        // Corrupt contents are discarded on write.
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt store file");
                HashMap::new()
            }
            Err(e) => return Err(write_err(e)),
        };
        let now = Utc::now();
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key.to_string(), StoredEntry::new(value, max_age));
        self.save(&entries).await.map_err(write_err)?;

        debug!(path = %self.path.display(), key, "persisted store entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pixeltap-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let store = FileStore::new(temp_store_path("store.json"));
        assert_eq!(store.get("muid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let path = temp_store_path("store.json");
        FileStore::new(&path)
            .set("muid", "visitor-1", Duration::from_secs(3600))
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("muid").await.unwrap().as_deref(),
            Some("visitor-1")
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_read_error() {
        let path = temp_store_path("store.json");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, "not json").await.unwrap();

        let err = FileStore::new(&path).get("muid").await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn write_replaces_corrupt_file() {
        let path = temp_store_path("store.json");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, "{ truncated").await.unwrap();

        let store = FileStore::new(&path);
        store
            .set("muid", "visitor-2", Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(store.get("muid").await.unwrap().as_deref(), Some("visitor-2"));
    }
}
