//! KV Backend Trait
//!
//! TigerStyle: Abstract interface for the flat string-keyed store.
//!
//! All implementations must satisfy the same trait contract. The layer
//! owns no semantics beyond byte storage: no ordering, no transactions.
//! `compare_and_swap` is the one conditional primitive, used by the object
//! store to keep collection indexes consistent under concurrent writers.

use async_trait::async_trait;

use super::error::StorageResult;

/// Minimal key-value primitive underlying the object store.
///
/// TigerStyle: All operations are async, return explicit errors.
#[async_trait]
pub trait KvBackend: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`.
    ///
    /// Returns None if the key does not exist.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List keys matching a glob pattern (`*` any run, `?` one character).
    ///
    /// Keys are returned sorted.
    async fn keys(&self, pattern: &str) -> StorageResult<Vec<String>>;

    /// Check whether `key` exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Atomically replace the value under `key` if it still equals `expected`.
    ///
    /// `expected = None` means "only if the key is absent".
    /// Returns true if the write happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> StorageResult<bool>;
}
