//! TigerStyle Constants
//!
//! Limits use big-endian naming with units in the name:
//! `INDEX_CAS_ATTEMPTS_MAX`, not `MAX_RETRIES`.

// =============================================================================
// Key Layout
// =============================================================================

/// Prefix of every collection index key (`index:{collection}`)
pub const INDEX_KEY_PREFIX: &str = "index:";

/// Separator appended to a collection name to form its default record prefix
pub const COLLECTION_PREFIX_SEPARATOR: char = ':';

/// Maximum length of a collection name
pub const COLLECTION_NAME_BYTES_MAX: usize = 128;

/// Maximum length of a record id
pub const RECORD_ID_BYTES_MAX: usize = 256;

// =============================================================================
// Record Fields
// =============================================================================

/// Field holding the record id in the stored payload
pub const FIELD_ID: &str = "id";

/// Field stamped once at creation
pub const FIELD_CREATED_AT: &str = "created_at";

/// Field stamped on every update
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Suffix joining a parent collection name into a foreign-key field
pub const FOREIGN_KEY_SUFFIX: &str = "_id";

// =============================================================================
// Index Maintenance
// =============================================================================

/// Maximum compare-and-swap attempts for one index mutation
pub const INDEX_CAS_ATTEMPTS_MAX: usize = 128;

// =============================================================================
// Simulated Time
// =============================================================================

/// Maximum single advance of a simulated clock (1 day)
pub const SIM_TIME_ADVANCE_MS_MAX: u64 = 86_400_000;

/// Milliseconds per second
pub const TIME_MS_PER_SEC: u64 = 1000;
