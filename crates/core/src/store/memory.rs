use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;

use crate::store::{KeyValueStore, StoreError, StoredEntry};

/// In-process store. Individual keys, or every write, can be made to fail so
/// that callers' recovery paths can be exercised.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    failing_keys: Mutex<HashSet<String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value that never expires.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .expect("MemoryStore poisoned")
            .insert(
                key.to_string(),
                StoredEntry {
                    value: value.to_string(),
                    expires_at: None,
                },
            );
        self
    }

    pub fn fail_key(self, key: &str) -> Self {
        self.failing_keys
            .lock()
            .expect("MemoryStore poisoned")
            .insert(key.to_string());
        self
    }

    pub fn fail_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::Relaxed);
        self
    }

    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.entries
            .lock()
            .expect("MemoryStore poisoned")
            .get(key)
            .cloned()
    }

    fn is_failing(&self, key: &str) -> bool {
        self.failing_keys
            .lock()
            .expect("MemoryStore poisoned")
            .contains(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.is_failing(key) {
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "store unavailable".to_string(),
            });
        }

        let entries = self.entries.lock().expect("MemoryStore poisoned");
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        if self.is_failing(key) || self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "store unavailable".to_string(),
            });
        }

        self.entries
            .lock()
            .expect("MemoryStore poisoned")
            .insert(key.to_string(), StoredEntry::new(value, max_age));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_back_written_value() {
        let store = MemoryStore::new();
        store.set("muid", "abc", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("muid").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = MemoryStore::new();
        store.set("muid", "abc", Duration::ZERO).await.unwrap();
        assert_eq!(store.get("muid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_key_does_not_affect_others() {
        let store = MemoryStore::new()
            .with_entry("_fbp", "fb.1")
            .with_entry("_ga", "GA1")
            .fail_key("_fbp");

        assert!(store.get("_fbp").await.is_err());
        assert_eq!(store.get("_ga").await.unwrap().as_deref(), Some("GA1"));
    }
}
