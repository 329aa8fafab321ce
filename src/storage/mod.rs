//! Storage - Backing Store Trait and Implementations
//!
//! TigerStyle: Abstract KV storage, interchangeable backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KvBackend Trait                         │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                              ↑
//!          │                              │
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │    MemoryKv     │           │   PostgresKv    │
//! │ (dev / testing) │           │  (production)   │
//! └─────────────────┘           └─────────────────┘
//! ```

mod backend;
mod error;
mod memory;

#[cfg(feature = "postgres")]
mod postgres;

pub use backend::KvBackend;
pub use error::{StorageError, StorageResult};
pub use memory::{glob_to_regex, MemoryKv};

#[cfg(feature = "postgres")]
pub use postgres::PostgresKv;
