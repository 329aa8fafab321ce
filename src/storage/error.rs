//! Storage Errors
//!
//! TigerStyle: Explicit error types with context.

use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Backing store could not be reached
    #[error("connection error: {message}")]
    Connection {
        /// Connection error message
        message: String,
    },

    /// Backing store rejected or failed a command
    #[error("query error: {message}")]
    Query {
        /// Query error message
        message: String,
    },

    /// A value could not be encoded for storage
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored payload is malformed
    #[error("malformed payload at {key}: {message}")]
    Deserialization {
        /// Key holding the payload
        key: String,
        /// Parser message
        message: String,
    },

    /// Caller-supplied data is unusable
    #[error("validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// An index mutation kept losing compare-and-swap races
    #[error("index {key} still contended after {attempts} attempts")]
    Contention {
        /// Index key
        key: String,
        /// Attempts made
        attempts: usize,
    },

    /// The sync bridge could not drive the operation
    #[error("sync bridge error: {message}")]
    Bridge {
        /// Bridge error message
        message: String,
    },

    /// Fault injected by a test backend
    #[error("simulated fault: {fault_type}")]
    SimulatedFault {
        /// Type of simulated fault
        fault_type: String,
    },

    /// Internal error
    #[error("internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl StorageError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a read error (wraps query error for reads).
    #[must_use]
    pub fn read(message: impl Into<String>) -> Self {
        Self::Query {
            message: format!("read: {}", message.into()),
        }
    }

    /// Create a write error (wraps query error for writes).
    #[must_use]
    pub fn write(message: impl Into<String>) -> Self {
        Self::Query {
            message: format!("write: {}", message.into()),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a deserialization error for the payload under `key`.
    #[must_use]
    pub fn deserialization(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deserialization {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a contention error.
    #[must_use]
    pub fn contention(key: impl Into<String>, attempts: usize) -> Self {
        Self::Contention {
            key: key.into(),
            attempts,
        }
    }

    /// Create a sync bridge error.
    #[must_use]
    pub fn bridge(message: impl Into<String>) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }

    /// Create a simulated fault error.
    #[must_use]
    pub fn simulated_fault(fault_type: impl Into<String>) -> Self {
        Self::SimulatedFault {
            fault_type: fault_type.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a transient error (can be retried by the caller).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::SimulatedFault { .. } | Self::Contention { .. }
        )
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = StorageError::deserialization("client:u1", "expected value");
        assert!(matches!(
            err,
            StorageError::Deserialization { ref key, .. } if key == "client:u1"
        ));

        let err = StorageError::read("timeout");
        assert!(matches!(err, StorageError::Query { message } if message == "read: timeout"));
    }

    #[test]
    fn test_is_transient() {
        assert!(StorageError::connection("refused").is_transient());
        assert!(StorageError::simulated_fault("set").is_transient());
        assert!(StorageError::contention("index:client", 3).is_transient());

        assert!(!StorageError::validation("bad id").is_transient());
        assert!(!StorageError::deserialization("k", "eof").is_transient());
        assert!(!StorageError::bridge("nested runtime").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = StorageError::contention("index:client", 128);
        assert_eq!(
            err.to_string(),
            "index index:client still contended after 128 attempts"
        );
    }
}
