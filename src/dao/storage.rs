use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Short description of the failed operation.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A write was rejected by a unique constraint.
    #[error("duplicate value for unique key `{key}`")]
    DuplicateKey {
        /// Name of the violated unique key.
        key: &'static str,
    },
    /// A write referenced a row that does not exist (or no longer does).
    #[error("referenced `{key}` does not exist")]
    MissingReference {
        /// Name of the dangling reference.
        key: &'static str,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the failure came from a unique constraint.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StorageError::DuplicateKey { .. })
    }

    /// Whether the write pointed at a missing row.
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, StorageError::MissingReference { .. })
    }
}
