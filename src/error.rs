//! Error types for state storage operations

use thiserror::Error;

/// Result type for state storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for state storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller passed an argument the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Conditional write rejected because the stored revision no longer matches
    #[error("Concurrency conflict for key '{key}': token '{token}' is stale")]
    ConcurrencyConflict {
        /// Application key whose write was rejected
        key: String,
        /// The stale token the caller presented
        token: String,
    },

    /// Conditional write targeted a document that does not exist
    #[error("Document not found for key '{0}'")]
    NotFound(String),

    /// Payload serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database or collection provisioning failed
    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    /// Store endpoint unreachable or connection could not be established
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other error reported by the backing store
    #[error("Backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::ConcurrencyConflict {
            key: "user/1".to_string(),
            token: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Concurrency conflict for key 'user/1': token 'abc' is stale"
        );

        let err = StoreError::InvalidArgument("keys must not be empty".to_string());
        assert!(err.to_string().contains("Invalid argument"));
    }
}
