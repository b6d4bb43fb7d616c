//! Backing-store trait for session state.
//!
//! Each session instance owns a key namespace inside a [`KvStore`]. The
//! trait is deliberately small: string keys, string (JSON) values,
//! multi-key writes for atomic-ish persistence, and prefix purge for
//! session teardown.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for key-value backends holding session state.
///
/// All values are serialized as strings (JSON). Multi-key operations are
/// expected to apply every key or fail as a whole as far as the backend
/// allows; callers never interleave operations for the same session, so
/// the consistency bar is "no other session operation observes a partial
/// write", not full transactional isolation.
#[async_trait]
pub trait KvStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a single value.
    async fn put(&self, key: &str, value: &str) -> AppResult<()>;

    /// Set several values in one call.
    async fn put_many(&self, pairs: Vec<(String, String)>) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is a no-op.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Delete several keys in one call.
    async fn delete_many(&self, keys: &[String]) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Delete every key starting with `prefix`. Returns the number of
    /// keys removed. Idempotent: purging an empty namespace returns 0.
    async fn purge_prefix(&self, prefix: &str) -> AppResult<u64>;
}
