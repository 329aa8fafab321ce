//! Recordstore - Schema-less Object Store over Key-Value Storage
//!
//! TigerStyle: One generic store, any collection, interchangeable backends.
//!
//! Records are JSON objects with a string `id`, grouped into named
//! collections. Each collection keeps an index of its ids so records can be
//! listed and filtered without scanning the keyspace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │   SyncStore (blocking)          Model (typed serde)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │   ObjectStore    CRUD │ Query │ Relations │ Index (CAS)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │   KvBackend      MemoryKv │ PostgresKv (feature "postgres")  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use recordstore::{Filter, ObjectStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> recordstore::StorageResult<()> {
//!     let store = ObjectStore::in_memory();
//!
//!     store.create("client", json!({"id": "u1", "name": "Alex"})).await?;
//!     store.update("client", "u1", json!({"email": "a@x"})).await?;
//!
//!     let found = store
//!         .find_many("client", &Filter::new().with("name", "Alex"))
//!         .await?;
//!     assert_eq!(found[0].get_str("email"), Some("a@x"));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod bridge;
pub mod clock;
pub mod config;
pub mod constants;
pub mod layout;
pub mod model;
pub mod query;
pub mod record;
pub mod relations;
pub mod storage;
pub mod store;

// Re-export common types
pub use bridge::{SyncModelQuery, SyncQuery, SyncStore};
pub use clock::{Clock, SimClock, SystemClock};
pub use config::{BackendConfig, StoreConfig};
pub use layout::KeyLayout;
pub use model::Model;
pub use query::{Filter, Query};
pub use record::{Fields, IntoFields, Record};
pub use relations::foreign_key;
pub use storage::{KvBackend, MemoryKv, StorageError, StorageResult};
pub use store::ObjectStore;

#[cfg(feature = "postgres")]
pub use storage::PostgresKv;
