//! Sync Bridge
//!
//! TigerStyle: Blocking facade for callers that cannot `.await`.
//!
//! Every call builds a single-use current-thread runtime, drives one store
//! operation to completion, and drops the runtime before returning. No
//! runtime is shared between calls, so any thread may call in, but each
//! call pays runtime setup and teardown and separate calls never overlap
//! their I/O. Async callers should use [`ObjectStore`] directly.
//!
//! Backends that hold runtime-bound resources (pooled network connections)
//! stay tied to the runtime that opened them. For those, open and use the
//! store inside a single [`block_on`] call, or use the async API.

use std::future::Future;
use std::marker::PhantomData;

use serde_json::Value;

use crate::model::Model;
use crate::query::Filter;
use crate::record::{IntoFields, Record};
use crate::storage::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Drive `operation` to completion on a fresh runtime.
///
/// # Errors
/// Returns a bridge error when called from inside an async runtime (where
/// blocking would stall the executor) or if the runtime cannot be built;
/// otherwise returns the operation's own result.
pub fn block_on<T, F>(operation: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(StorageError::bridge(
            "called from inside an async runtime; await the store instead",
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StorageError::bridge(format!("failed to create runtime: {e}")))?;

    runtime.block_on(operation)
}

// =============================================================================
// SyncStore
// =============================================================================

/// Blocking view of an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct SyncStore {
    store: ObjectStore,
}

impl SyncStore {
    /// Wrap an async store.
    #[must_use]
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }

    /// Build the wrapped store with an async constructor, blocking until done.
    ///
    /// # Errors
    /// Returns the constructor's error or a bridge error.
    pub fn open_with<F>(open: F) -> StorageResult<Self>
    where
        F: Future<Output = StorageResult<ObjectStore>>,
    {
        block_on(open).map(Self::new)
    }

    /// The wrapped async store.
    #[must_use]
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Unwrap into the async store.
    #[must_use]
    pub fn into_inner(self) -> ObjectStore {
        self.store
    }

    /// Start a blocking filter query on `collection`.
    #[must_use]
    pub fn query(&self, collection: impl Into<String>) -> SyncQuery<'_> {
        SyncQuery {
            store: self,
            collection: collection.into(),
            filter: Filter::new(),
        }
    }

    /// See [`ObjectStore::create`].
    pub fn create(&self, collection: &str, data: impl IntoFields) -> StorageResult<Record> {
        block_on(self.store.create(collection, data))
    }

    /// See [`ObjectStore::get`].
    pub fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Record>> {
        block_on(self.store.get(collection, id))
    }

    /// See [`ObjectStore::get_all`].
    pub fn get_all(&self, collection: &str, filter: Option<&Filter>) -> StorageResult<Vec<Record>> {
        block_on(self.store.get_all(collection, filter))
    }

    /// See [`ObjectStore::update`].
    pub fn update(
        &self,
        collection: &str,
        id: &str,
        patch: impl IntoFields,
    ) -> StorageResult<Option<Record>> {
        block_on(self.store.update(collection, id, patch))
    }

    /// See [`ObjectStore::delete`].
    pub fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        block_on(self.store.delete(collection, id))
    }

    /// See [`ObjectStore::save`].
    pub fn save(&self, collection: &str, record: Record) -> StorageResult<Record> {
        block_on(self.store.save(collection, record))
    }

    /// See [`ObjectStore::find_one`].
    pub fn find_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Record>> {
        block_on(self.store.find_one(collection, filter))
    }

    /// See [`ObjectStore::find_many`].
    pub fn find_many(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Record>> {
        block_on(self.store.find_many(collection, filter))
    }

    /// See [`ObjectStore::count`].
    pub fn count(&self, collection: &str, filter: Option<&Filter>) -> StorageResult<usize> {
        block_on(self.store.count(collection, filter))
    }

    /// See [`ObjectStore::exists`].
    pub fn exists(&self, collection: &str, id: &str) -> StorageResult<bool> {
        block_on(self.store.exists(collection, id))
    }

    /// See [`ObjectStore::get_related`].
    pub fn get_related(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
    ) -> StorageResult<Vec<Record>> {
        block_on(
            self.store
                .get_related(parent_collection, parent_id, child_collection),
        )
    }

    /// See [`ObjectStore::add_relation`].
    pub fn add_relation(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
        data: impl IntoFields,
    ) -> StorageResult<Record> {
        block_on(
            self.store
                .add_relation(parent_collection, parent_id, child_collection, data),
        )
    }

    // =========================================================================
    // Typed models
    // =========================================================================

    /// Start a blocking typed query on `M`'s collection.
    #[must_use]
    pub fn model_query<M: Model>(&self) -> SyncModelQuery<'_, M> {
        SyncModelQuery {
            store: self,
            filter: Filter::new(),
            model: PhantomData,
        }
    }

    /// See [`ObjectStore::create_model`].
    pub fn create_model<M: Model>(&self, model: &M) -> StorageResult<M> {
        block_on(self.store.create_model(model))
    }

    /// See [`ObjectStore::get_model`].
    pub fn get_model<M: Model>(&self, id: &str) -> StorageResult<Option<M>> {
        block_on(self.store.get_model(id))
    }

    /// See [`ObjectStore::find_models`].
    pub fn find_models<M: Model>(&self, filter: &Filter) -> StorageResult<Vec<M>> {
        block_on(self.store.find_models(filter))
    }

    /// See [`ObjectStore::find_one_model`].
    pub fn find_one_model<M: Model>(&self, filter: &Filter) -> StorageResult<Option<M>> {
        block_on(self.store.find_one_model(filter))
    }

    /// See [`ObjectStore::save_model`].
    pub fn save_model<M: Model>(&self, model: &M) -> StorageResult<M> {
        block_on(self.store.save_model(model))
    }

    /// See [`ObjectStore::delete_model`].
    pub fn delete_model<M: Model>(&self, id: &str) -> StorageResult<bool> {
        block_on(self.store.delete_model::<M>(id))
    }
}

// =============================================================================
// SyncQuery
// =============================================================================

/// Blocking filter builder; terminals run through the bridge.
#[derive(Debug, Clone)]
pub struct SyncQuery<'a> {
    store: &'a SyncStore,
    collection: String,
    filter: Filter,
}

impl SyncQuery<'_> {
    /// Require `field == value`.
    #[must_use]
    pub fn filter_by(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field, value);
        self
    }

    /// Require every constraint of `filter`.
    #[must_use]
    pub fn filter_by_all(mut self, filter: Filter) -> Self {
        self.filter.extend(filter);
        self
    }

    /// Constraints accumulated so far.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// First matching record.
    pub fn first(&self) -> StorageResult<Option<Record>> {
        self.store.find_one(&self.collection, &self.filter)
    }

    /// All matching records.
    pub fn all(&self) -> StorageResult<Vec<Record>> {
        self.store.find_many(&self.collection, &self.filter)
    }

    /// Number of matching records.
    pub fn count(&self) -> StorageResult<usize> {
        self.store.count(&self.collection, Some(&self.filter))
    }
}

/// Blocking filter builder that decodes results into `M`.
#[derive(Debug)]
pub struct SyncModelQuery<'a, M> {
    store: &'a SyncStore,
    filter: Filter,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> SyncModelQuery<'_, M> {
    /// Require `field == value`.
    #[must_use]
    pub fn filter_by(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field, value);
        self
    }

    /// First matching model.
    pub fn first(&self) -> StorageResult<Option<M>> {
        self.store.find_one_model(&self.filter)
    }

    /// All matching models.
    pub fn all(&self) -> StorageResult<Vec<M>> {
        self.store.find_models(&self.filter)
    }

    /// Number of matching records.
    pub fn count(&self) -> StorageResult<usize> {
        self.store.count(M::COLLECTION, Some(&self.filter))
    }
}

// =============================================================================
// Tests
// =============================================================================
