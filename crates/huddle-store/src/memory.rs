//! In-memory key-value store backed by a concurrent map.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use huddle_core::result::AppResult;
use huddle_core::store::KvStore;

/// In-memory [`KvStore`] implementation.
///
/// One instance is shared by every session actor in the process; sessions
/// keep to their own key namespaces, so the map never needs coordination
/// beyond what `DashMap` provides.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn put_many(&self, pairs: Vec<(String, String)>) -> AppResult<()> {
        for (key, value) in pairs {
            self.entries.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn purge_prefix(&self, prefix: &str) -> AppResult<u64> {
        // Collect first: DashMap iteration while removing can deadlock
        // on the same shard.
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let count = keys.len() as u64;
        for key in keys {
            self.entries.remove(&key);
        }

        debug!(prefix, count, "Purged keys under prefix");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryKvStore::new();
        store.put("key1", "value1").await.unwrap();
        let val = store.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_many() {
        let store = MemoryKvStore::new();
        store
            .put_many(vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ])
            .await
            .unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryKvStore::new();
        store.put("key", "value").await.unwrap();
        store.delete("key").await.unwrap();
        store.delete("key").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let store = MemoryKvStore::new();
        store.put("x", "1").await.unwrap();
        store.put("y", "2").await.unwrap();
        store
            .delete_many(&["x".to_string(), "y".to_string(), "z".to_string()])
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_prefix_scopes_to_namespace() {
        let store = MemoryKvStore::new();
        store.put("sess:a:meta", "1").await.unwrap();
        store.put("sess:a:msg:1", "2").await.unwrap();
        store.put("sess:b:meta", "3").await.unwrap();

        let purged = store.purge_prefix("sess:a:").await.unwrap();
        assert_eq!(purged, 2);
        assert_eq!(store.get("sess:a:meta").await.unwrap(), None);
        assert_eq!(store.get("sess:b:meta").await.unwrap(), Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_purge_empty_prefix_is_noop() {
        let store = MemoryKvStore::new();
        assert_eq!(store.purge_prefix("sess:none:").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exists() {
        let store = MemoryKvStore::new();
        store.put("here", "x").await.unwrap();
        assert!(store.exists("here").await.unwrap());
        assert!(!store.exists("gone").await.unwrap());
    }
}
