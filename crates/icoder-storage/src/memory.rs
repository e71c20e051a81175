//! In-memory storage backend.
//!
//! Stores all data in a `BTreeMap` behind a `RwLock`. Nothing is persisted:
//! all data is lost when the process exits. Used by the test suites and by
//! `ICODER_STORAGE=memory` for local development.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Data is sorted by key, which makes prefix listing a single
/// `BTreeMap::range` walk. Clones share the same map.
///
/// # Examples
///
/// ```
/// # use icoder_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("contacts/1", b"{}").await.unwrap();
/// let val = backend.get("contacts/1").await.unwrap();
/// assert_eq!(val, Some(b"{}".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn create(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        match data.entry(key.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists {
                key: key.to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let backend = MemoryBackend::new();
        let result = backend.get("accounts/nobody@x.com").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn put_overwrites_existing() {
        let backend = MemoryBackend::new();
        backend.put("key", b"v1").await.unwrap();
        backend.put("key", b"v2").await.unwrap();
        let val = backend.get("key").await.unwrap();
        assert_eq!(val, Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn create_inserts_missing_key() {
        let backend = MemoryBackend::new();
        backend.create("accounts/a@x.com", b"doc").await.unwrap();
        let val = backend.get("accounts/a@x.com").await.unwrap();
        assert_eq!(val, Some(b"doc".to_vec()));
    }

    #[tokio::test]
    async fn create_rejects_existing_key_and_keeps_value() {
        let backend = MemoryBackend::new();
        backend.create("accounts/a@x.com", b"first").await.unwrap();
        let err = backend
            .create("accounts/a@x.com", b"second")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { ref key } if key == "accounts/a@x.com"));
        let val = backend.get("accounts/a@x.com").await.unwrap();
        assert_eq!(val, Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn concurrent_creates_admit_exactly_one() {
        let backend = MemoryBackend::new();
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.create("accounts/race@x.com", &[i]).await.is_ok()
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn delete_nonexistent_is_noop() {
        let backend = MemoryBackend::new();
        backend.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn list_with_prefix() {
        let backend = MemoryBackend::new();
        backend.put("contacts/a", b"1").await.unwrap();
        backend.put("contacts/b", b"2").await.unwrap();
        backend.put("accounts/a@x.com", b"3").await.unwrap();

        let keys = backend.list("contacts/").await.unwrap();
        assert_eq!(keys, vec!["contacts/a", "contacts/b"]);
    }

    #[tokio::test]
    async fn list_no_matches_returns_empty() {
        let backend = MemoryBackend::new();
        backend.put("accounts/a@x.com", b"1").await.unwrap();
        let keys = backend.list("contacts/").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn exists_tracks_presence() {
        let backend = MemoryBackend::new();
        assert!(!backend.exists("key").await.unwrap());
        backend.put("key", b"val").await.unwrap();
        assert!(backend.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.put("key", b"val").await.unwrap();
        let val = clone.get("key").await.unwrap();
        assert_eq!(val, Some(b"val".to_vec()));
    }
}
