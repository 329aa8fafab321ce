//! `MemoryKv` - In-Process Backing Store
//!
//! TigerStyle: Development and test backend with fault injection.
//!
//! Values live in a process-local map behind a `RwLock`. Clones share the
//! same map, so one backend can be handed to several stores.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use regex::Regex;

use super::backend::KvBackend;
use super::error::{StorageError, StorageResult};

// =============================================================================
// Glob Translation
// =============================================================================

/// Translate a glob (`*`, `?`) into an anchored regular expression source.
///
/// Every other character is matched literally.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

/// Compile a glob into a matcher.
pub(crate) fn compile_glob(pattern: &str) -> StorageResult<Regex> {
    Regex::new(&glob_to_regex(pattern))
        .map_err(|e| StorageError::validation(format!("invalid key pattern {pattern:?}: {e}")))
}

// =============================================================================
// MemoryKv
// =============================================================================

/// In-memory key-value backend.
///
/// TigerStyle:
/// - Thread-safe with `RwLock`
/// - Fault injection per operation name for failure-path tests
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    /// Stored values by key
    entries: Arc<RwLock<HashMap<String, String>>>,
    /// Operations that fail with a simulated fault
    faults: Arc<RwLock<HashSet<String>>>,
}

impl MemoryKv {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` fail with a simulated fault.
    ///
    /// Operation names match the trait methods: `get`, `set`, `delete`,
    /// `keys`, `exists`, `compare_and_swap`.
    pub fn fail_operation(&self, operation: &str) {
        self.faults
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(operation.to_string());
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.faults
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    /// Number of stored keys (for testing).
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Check if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a fault should be injected for an operation.
    fn maybe_inject_fault(&self, operation: &str) -> StorageResult<()> {
        let faults = self
            .faults
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if faults.contains(operation) {
            Err(StorageError::simulated_fault(format!(
                "injected failure during {operation}"
            )))
        } else {
            Ok(())
        }
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.maybe_inject_fault("get")?;
        Ok(self.read_entries().get(key).cloned())
    }

    #[tracing::instrument(skip(self, value), fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.maybe_inject_fault("set")?;
        self.write_entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.maybe_inject_fault("delete")?;
        self.write_entries().remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> StorageResult<Vec<String>> {
        self.maybe_inject_fault("keys")?;

        let matcher = compile_glob(pattern)?;
        let mut keys: Vec<String> = self
            .read_entries()
            .keys()
            .filter(|k| matcher.is_match(k))
            .cloned()
            .collect();

        // Sort for determinism
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.maybe_inject_fault("exists")?;
        Ok(self.read_entries().contains_key(key))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> StorageResult<bool> {
        self.maybe_inject_fault("compare_and_swap")?;

        // Single write guard covers both the comparison and the swap
        let mut entries = self.write_entries();
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), new.to_string());
        Ok(true)
    }
}

// =============================================================================
// Tests
// =============================================================================
