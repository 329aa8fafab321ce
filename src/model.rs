//! Typed Models
//!
//! Binds a serde type to its collection so callers work with structs
//! instead of raw field bags:
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct Client {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<String>,
//!     name: String,
//! }
//!
//! impl Model for Client {
//!     const COLLECTION: &'static str = collection::CLIENT;
//! }
//!
//! let alex: Client = store.create_model(&Client { id: None, name: "Alex".into() }).await?;
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::FIELD_ID;
use crate::query::Filter;
use crate::record::{id_from_value, Record};
use crate::storage::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// A record type living in one collection.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the model is stored in.
    const COLLECTION: &'static str;
}

impl ObjectStore {
    /// Create a record from a typed value and decode the stored result.
    ///
    /// # Errors
    /// Fails if the value does not encode to a map, the backend fails, or
    /// the stored record does not decode back into `M`.
    pub async fn create_model<M: Model>(&self, model: &M) -> StorageResult<M> {
        let fields = Record::encode(model)?;
        let record = self.create(M::COLLECTION, fields).await?;
        self.decode_model(&record)
    }

    /// Get a typed record by id.
    pub async fn get_model<M: Model>(&self, id: &str) -> StorageResult<Option<M>> {
        match self.get(M::COLLECTION, id).await? {
            Some(record) => self.decode_model(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Typed records matching `filter`.
    pub async fn find_models<M: Model>(&self, filter: &Filter) -> StorageResult<Vec<M>> {
        self.find_many(M::COLLECTION, filter)
            .await?
            .iter()
            .map(|record| self.decode_model(record))
            .collect()
    }

    /// First typed record matching `filter`.
    pub async fn find_one_model<M: Model>(&self, filter: &Filter) -> StorageResult<Option<M>> {
        match self.find_one(M::COLLECTION, filter).await? {
            Some(record) => self.decode_model(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Create-or-update a typed value.
    ///
    /// A value whose id names an existing record is merged into it; one
    /// without an id (or with an unknown id) is created.
    ///
    /// # Errors
    /// Fails like [`ObjectStore::save`], or if the stored record does not
    /// decode back into `M`.
    #[tracing::instrument(skip(self, model), fields(collection = M::COLLECTION))]
    pub async fn save_model<M: Model>(&self, model: &M) -> StorageResult<M> {
        let mut fields = Record::encode(model)?;
        let id = match fields.remove(FIELD_ID) {
            Some(value) => id_from_value(&value)?.unwrap_or_default(),
            None => String::new(),
        };
        let record = self
            .save(M::COLLECTION, Record::from_fields(id, fields))
            .await?;
        self.decode_model(&record)
    }

    /// Delete a typed record by id. See [`ObjectStore::delete`].
    pub async fn delete_model<M: Model>(&self, id: &str) -> StorageResult<bool> {
        self.delete(M::COLLECTION, id).await
    }

    fn decode_model<M: Model>(&self, record: &Record) -> StorageResult<M> {
        record.decode().map_err(|e| {
            StorageError::deserialization(
                self.layout().record_key(M::COLLECTION, &record.id),
                e.to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::collection;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Exercise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        muscle_group: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<String>,
    }

    impl Model for Exercise {
        const COLLECTION: &'static str = collection::EXERCISE;
    }

    fn squat() -> Exercise {
        Exercise {
            id: None,
            name: "Squat".to_string(),
            muscle_group: "legs".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_model() {
        let store = ObjectStore::in_memory();

        let created = store.create_model(&squat()).await.unwrap();
        let id = created.id.clone().unwrap();
        assert!(created.created_at.is_some());

        let fetched: Exercise = store.get_model(&id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_model::<Exercise>("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_models() {
        let store = ObjectStore::in_memory();
        store.create_model(&squat()).await.unwrap();
        store
            .create_model(&Exercise {
                name: "Bench".to_string(),
                muscle_group: "chest".to_string(),
                ..squat()
            })
            .await
            .unwrap();

        let legs: Vec<Exercise> = store
            .find_models(&Filter::new().with("muscle_group", "legs"))
            .await
            .unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].name, "Squat");
    }

    #[tokio::test]
    async fn test_save_model_creates_then_updates() {
        let store = ObjectStore::in_memory();

        let saved = store.save_model(&squat()).await.unwrap();
        let id = saved.id.clone().unwrap();
        assert!(saved.created_at.is_some());

        let renamed = store
            .save_model(&Exercise {
                name: "Front Squat".to_string(),
                ..saved.clone()
            })
            .await
            .unwrap();
        assert_eq!(renamed.id.as_deref(), Some(id.as_str()));
        assert_eq!(renamed.created_at, saved.created_at);
        assert_eq!(store.count(collection::EXERCISE, None).await.unwrap(), 1);

        let fetched: Exercise = store.get_model(&id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Front Squat");
        let record = store.get(collection::EXERCISE, &id).await.unwrap().unwrap();
        assert!(record.has("updated_at"));
    }

    #[tokio::test]
    async fn test_save_model_with_unknown_id_creates() {
        let store = ObjectStore::in_memory();

        let saved = store
            .save_model(&Exercise {
                id: Some("e9".to_string()),
                ..squat()
            })
            .await
            .unwrap();

        assert_eq!(saved.id.as_deref(), Some("e9"));
        assert!(store.exists(collection::EXERCISE, "e9").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_model_and_find_one_model() {
        let store = ObjectStore::in_memory();
        let created = store.create_model(&squat()).await.unwrap();
        let id = created.id.clone().unwrap();

        let found: Option<Exercise> = store
            .find_one_model(&Filter::new().with("name", "Squat"))
            .await
            .unwrap();
        assert_eq!(found, Some(created));

        assert!(store.delete_model::<Exercise>(&id).await.unwrap());
        assert!(store.get_model::<Exercise>(&id).await.unwrap().is_none());
        assert!(store
            .find_one_model::<Exercise>(&Filter::new().with("name", "Squat"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_undecodable_record_is_an_error() {
        let store = ObjectStore::in_memory();
        store
            .create(collection::EXERCISE, serde_json::json!({"id": "e1", "name": 5}))
            .await
            .unwrap();

        let err = store.get_model::<Exercise>("e1").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Deserialization { ref key, .. } if key == "exercise:e1"
        ));
    }
}
