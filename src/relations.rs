//! Relationship Helper
//!
//! Parent/child links by naming convention: a child of `client` carries a
//! `client_id` field. Lookups go through the normal filter query. Nothing
//! checks that the parent still exists.

use serde_json::Value;

use crate::constants::FOREIGN_KEY_SUFFIX;
use crate::query::Filter;
use crate::record::{IntoFields, Record};
use crate::storage::StorageResult;
use crate::store::ObjectStore;

/// Field naming the parent in a child record (`{parent_collection}_id`).
#[must_use]
pub fn foreign_key(parent_collection: &str) -> String {
    format!("{parent_collection}{FOREIGN_KEY_SUFFIX}")
}

impl ObjectStore {
    /// Records of `child_collection` whose foreign key names `parent_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_related(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
    ) -> StorageResult<Vec<Record>> {
        let filter = Filter::new().with(foreign_key(parent_collection), parent_id);
        self.find_many(child_collection, &filter).await
    }

    /// Create a child record linked to `parent_id`.
    ///
    /// Any foreign-key value already in `data` is overwritten.
    #[tracing::instrument(skip(self, data))]
    pub async fn add_relation(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
        data: impl IntoFields,
    ) -> StorageResult<Record> {
        let mut fields = data.into_fields()?;
        fields.insert(
            foreign_key(parent_collection),
            Value::String(parent_id.to_string()),
        );
        self.create(child_collection, fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foreign_key() {
        assert_eq!(foreign_key("client"), "client_id");
        assert_eq!(foreign_key("workout_template"), "workout_template_id");
    }

    #[tokio::test]
    async fn test_add_and_get_related() {
        let store = ObjectStore::in_memory();
        let alex = store.create("client", json!({"name": "Alex"})).await.unwrap();
        let sam = store.create("client", json!({"name": "Sam"})).await.unwrap();

        let log = store
            .add_relation("client", &alex.id, "workout_log", json!({"week": 1}))
            .await
            .unwrap();
        assert_eq!(log.get_str("client_id"), Some(alex.id.as_str()));

        store
            .add_relation("client", &alex.id, "workout_log", json!({"week": 2}))
            .await
            .unwrap();
        store
            .add_relation("client", &sam.id, "workout_log", json!({"week": 1}))
            .await
            .unwrap();

        let alex_logs = store
            .get_related("client", &alex.id, "workout_log")
            .await
            .unwrap();
        assert_eq!(alex_logs.len(), 2);
        assert!(alex_logs.iter().all(|r| r.get_str("client_id") == Some(alex.id.as_str())));

        let sam_logs = store.get_related("client", &sam.id, "workout_log").await.unwrap();
        assert_eq!(sam_logs.len(), 1);
    }

    #[tokio::test]
    async fn test_add_relation_overwrites_foreign_key() {
        let store = ObjectStore::in_memory();

        let msg = store
            .add_relation("client", "u1", "message", json!({"client_id": "u9", "body": "hi"}))
            .await
            .unwrap();

        assert_eq!(msg.get_str("client_id"), Some("u1"));
    }

    #[tokio::test]
    async fn test_related_survives_parent_deletion() {
        let store = ObjectStore::in_memory();
        let parent = store.create("client", json!({})).await.unwrap();
        store
            .add_relation("client", &parent.id, "body_stat", json!({"weight": 80}))
            .await
            .unwrap();

        store.delete("client", &parent.id).await.unwrap();

        // No referential integrity: the child still points at the parent
        let orphans = store
            .get_related("client", &parent.id, "body_stat")
            .await
            .unwrap();
        assert_eq!(orphans.len(), 1);
    }

    #[tokio::test]
    async fn test_get_related_none() {
        let store = ObjectStore::in_memory();
        let related = store.get_related("client", "nobody", "message").await.unwrap();
        assert!(related.is_empty());
    }
}
