//! Object Store - Generic CRUD and Indexing
//!
//! TigerStyle: Collection-agnostic logic over the `KvBackend` primitive.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ObjectStore                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  {prefix}{id}        one JSON object per record              │
//! │  index:{collection}  JSON array of ids, CAS-maintained       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Consistency
//!
//! Index mutations go through compare-and-swap, so concurrent creates and
//! deletes in one collection never drop each other's index entries.
//! `update` is a plain read-modify-write: two concurrent updates of the same
//! record can lose one of the patches. A failure between the record write
//! and the index write leaves them out of step; `get_all` skips index
//! entries whose record is gone.

use std::sync::Arc;

use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::constants::{
    COLLECTION_NAME_BYTES_MAX, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT,
    INDEX_CAS_ATTEMPTS_MAX, RECORD_ID_BYTES_MAX,
};
use crate::layout::KeyLayout;
use crate::query::{Filter, Query};
use crate::record::{id_from_value, IntoFields, Record};
use crate::storage::{KvBackend, MemoryKv, StorageError, StorageResult};

// =============================================================================
// ObjectStore
// =============================================================================

/// Handle to the record store.
///
/// Cloning is cheap; clones share the backend. Construct one explicitly and
/// pass it to whatever needs persistence.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    backend: Arc<dyn KvBackend>,
    layout: KeyLayout,
    clock: Arc<dyn Clock>,
}

impl ObjectStore {
    /// Create a store over `backend` with default key layout and wall-clock time.
    #[must_use]
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            layout: KeyLayout::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a store over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()))
    }

    /// Use a custom key layout.
    #[must_use]
    pub fn with_layout(mut self, layout: KeyLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Use a custom clock for timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The backing store.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// The key layout.
    #[must_use]
    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Generate a fresh record id (UUID v4).
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Start a filter query on `collection`.
    #[must_use]
    pub fn query(&self, collection: impl Into<String>) -> Query<'_> {
        Query::new(self, collection)
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Create a record.
    ///
    /// Assigns an id if `data` has none and stamps `created_at` if absent,
    /// writes the record, then appends its id to the collection index.
    ///
    /// # Errors
    /// Fails if the backend fails, if the collection name is empty or too
    /// long, or if `data` is not a map or carries a list/map id.
    #[tracing::instrument(skip(self, data))]
    pub async fn create(&self, collection: &str, data: impl IntoFields) -> StorageResult<Record> {
        check_collection(collection)?;

        let mut fields = data.into_fields()?;
        let id = match fields.remove(FIELD_ID) {
            Some(value) => id_from_value(&value)?,
            None => None,
        }
        .unwrap_or_else(Self::generate_id);
        check_id(&id)?;

        fields
            .entry(FIELD_CREATED_AT)
            .or_insert_with(|| Value::String(self.clock.timestamp()));

        let record = Record::from_fields(id, fields);
        self.write_record(collection, &record).await?;

        let id = record.id.as_str();
        self.mutate_index(collection, |ids| {
            if ids.iter().any(|existing| existing == id) {
                false
            } else {
                ids.push(id.to_string());
                true
            }
        })
        .await?;

        tracing::debug!(id = %record.id, "record created");
        Ok(record)
    }

    /// Get a record by id. No index involved.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Record>> {
        check_collection(collection)?;
        let key = self.layout.record_key(collection, id);
        let Some(raw) = self.backend.get(&key).await? else {
            return Ok(None);
        };
        let record: Record = serde_json::from_str(&raw)
            .map_err(|e| StorageError::deserialization(&key, e.to_string()))?;
        Ok(Some(record))
    }

    /// Every indexed record of `collection`, optionally filtered.
    ///
    /// Records come back in index order. Linear in collection size.
    #[tracing::instrument(skip(self, filter), fields(constraints = filter.map_or(0, Filter::len)))]
    pub async fn get_all(
        &self,
        collection: &str,
        filter: Option<&Filter>,
    ) -> StorageResult<Vec<Record>> {
        check_collection(collection)?;
        let (_, ids) = self.read_index(collection).await?;

        let loaded =
            futures::future::try_join_all(ids.iter().map(|id| self.get(collection, id))).await?;

        let mut records = Vec::with_capacity(loaded.len());
        for (id, record) in ids.iter().zip(loaded) {
            match record {
                Some(record) if filter.map_or(true, |f| f.matches(&record)) => {
                    records.push(record);
                }
                Some(_) => {}
                None => tracing::debug!(id = %id, "index entry without record"),
            }
        }

        Ok(records)
    }

    /// Merge `patch` into an existing record.
    ///
    /// Returns None if the record does not exist. `id` and `created_at` in
    /// the patch are ignored; `updated_at` is stamped. The index is not
    /// touched.
    ///
    /// # Errors
    /// Fails if the backend fails or `patch` is not a map.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: impl IntoFields,
    ) -> StorageResult<Option<Record>> {
        check_collection(collection)?;
        let mut patch = patch.into_fields()?;
        let Some(mut record) = self.get(collection, id).await? else {
            return Ok(None);
        };

        patch.remove(FIELD_ID);
        patch.remove(FIELD_CREATED_AT);
        record.fields.extend(patch);
        record.set(FIELD_UPDATED_AT, self.clock.timestamp());

        self.write_record(collection, &record).await?;
        Ok(Some(record))
    }

    /// Delete a record and drop its id from the index.
    ///
    /// Returns true once both steps complete, whether or not the record
    /// existed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        check_collection(collection)?;
        self.backend
            .delete(&self.layout.record_key(collection, id))
            .await?;

        self.mutate_index(collection, |ids| {
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        })
        .await?;

        Ok(true)
    }

    /// Update the record if its id exists, create it otherwise.
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    pub async fn save(&self, collection: &str, record: Record) -> StorageResult<Record> {
        if !record.id.is_empty() && self.exists(collection, &record.id).await? {
            if let Some(updated) = self
                .update(collection, &record.id, record.fields.clone())
                .await?
            {
                return Ok(updated);
            }
        }
        self.create(collection, record).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// First record matching `filter`.
    pub async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StorageResult<Option<Record>> {
        Ok(self
            .get_all(collection, Some(filter))
            .await?
            .into_iter()
            .next())
    }

    /// Every record matching `filter`.
    pub async fn find_many(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Record>> {
        self.get_all(collection, Some(filter)).await
    }

    /// Number of records, optionally filtered.
    pub async fn count(&self, collection: &str, filter: Option<&Filter>) -> StorageResult<usize> {
        Ok(self.get_all(collection, filter).await?.len())
    }

    /// Check if a record exists without decoding it.
    pub async fn exists(&self, collection: &str, id: &str) -> StorageResult<bool> {
        check_collection(collection)?;
        self.backend
            .exists(&self.layout.record_key(collection, id))
            .await
    }

    /// Names of collections that have an index.
    pub async fn collections(&self) -> StorageResult<Vec<String>> {
        let keys = self
            .backend
            .keys(&KeyLayout::index_key("*"))
            .await?;
        Ok(keys
            .iter()
            .filter_map(|key| KeyLayout::collection_from_index_key(key))
            .map(str::to_string)
            .collect())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn write_record(&self, collection: &str, record: &Record) -> StorageResult<()> {
        let payload = serde_json::to_string(record)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        self.backend
            .set(&self.layout.record_key(collection, &record.id), &payload)
            .await
    }

    /// Raw index payload and decoded ids.
    async fn read_index(&self, collection: &str) -> StorageResult<(Option<String>, Vec<String>)> {
        let key = KeyLayout::index_key(collection);
        let raw = self.backend.get(&key).await?;
        let ids = match raw.as_deref() {
            Some(payload) => serde_json::from_str(payload)
                .map_err(|e| StorageError::deserialization(&key, e.to_string()))?,
            None => Vec::new(),
        };
        Ok((raw, ids))
    }

    /// Apply `mutate` to the index under compare-and-swap.
    ///
    /// `mutate` returns false when nothing changed, which skips the write.
    async fn mutate_index<F>(&self, collection: &str, mutate: F) -> StorageResult<()>
    where
        F: Fn(&mut Vec<String>) -> bool + Send + Sync,
    {
        let key = KeyLayout::index_key(collection);

        for attempt in 1..=INDEX_CAS_ATTEMPTS_MAX {
            let (current, mut ids) = self.read_index(collection).await?;
            if !mutate(&mut ids) {
                return Ok(());
            }

            let payload = serde_json::to_string(&ids)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            if self
                .backend
                .compare_and_swap(&key, current.as_deref(), &payload)
                .await?
            {
                return Ok(());
            }

            tracing::debug!(index = %key, attempt, "index changed concurrently, retrying");
            tokio::task::yield_now().await;
        }

        Err(StorageError::contention(key, INDEX_CAS_ATTEMPTS_MAX))
    }
}

fn check_collection(collection: &str) -> StorageResult<()> {
    if collection.is_empty() {
        return Err(StorageError::validation("collection name cannot be empty"));
    }
    if collection.len() > COLLECTION_NAME_BYTES_MAX {
        return Err(StorageError::validation(format!(
            "collection name {} bytes exceeds max {COLLECTION_NAME_BYTES_MAX}",
            collection.len()
        )));
    }
    Ok(())
}

fn check_id(id: &str) -> StorageResult<()> {
    if id.len() > RECORD_ID_BYTES_MAX {
        return Err(StorageError::validation(format!(
            "record id {} bytes exceeds max {RECORD_ID_BYTES_MAX}",
            id.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
