//! Query Facade
//!
//! Chainable equality filters over one collection:
//!
//! ```rust,ignore
//! let alex = store
//!     .query("client")
//!     .filter_by("name", "Alex")
//!     .filter_by("active", true)
//!     .first()
//!     .await?;
//! ```
//!
//! Constraints are ANDed. There is no OR, negation, or ordering.

use serde_json::Value;

use crate::record::{Fields, Record};
use crate::storage::StorageResult;
use crate::store::ObjectStore;

// =============================================================================
// Filter
// =============================================================================

/// A set of `field == value` constraints.
///
/// Setting the same field twice keeps the later value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    constraints: Fields,
}

impl Filter {
    /// Empty filter (matches every record).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter from an existing field map.
    #[must_use]
    pub fn from_fields(constraints: Fields) -> Self {
        Self { constraints }
    }

    /// Add a constraint (builder style).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Add a constraint.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.constraints.insert(field.into(), value.into());
    }

    /// Merge another filter in; its constraints win on conflict.
    pub fn extend(&mut self, other: Filter) {
        self.constraints.extend(other.constraints);
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Check if there are no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Iterate constraints.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.constraints.iter()
    }

    /// Check whether a record satisfies every constraint.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.constraints
            .iter()
            .all(|(field, expected)| record.field_equals(field, expected))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filter = Self::new();
        for (field, value) in iter {
            filter.insert(field, value);
        }
        filter
    }
}

// =============================================================================
// Query
// =============================================================================

/// Async filter builder bound to one collection of an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct Query<'a> {
    store: &'a ObjectStore,
    collection: String,
    filter: Filter,
}

impl<'a> Query<'a> {
    pub(crate) fn new(store: &'a ObjectStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            filter: Filter::new(),
        }
    }

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

    /// Collection being queried.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Constraints accumulated so far.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// First matching record in index order.
    pub async fn first(&self) -> StorageResult<Option<Record>> {
        self.store.find_one(&self.collection, &self.filter).await
    }

    /// All matching records in index order.
    pub async fn all(&self) -> StorageResult<Vec<Record>> {
        self.store.find_many(&self.collection, &self.filter).await
    }

    /// Number of matching records.
    pub async fn count(&self) -> StorageResult<usize> {
        self.store.count(&self.collection, Some(&self.filter)).await
    }
}

// =============================================================================
// Tests
// =============================================================================
