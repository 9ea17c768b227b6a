//! Storage-specific error type.

use modhub_domain::error::ModHubError;

/// Errors originating from the in-memory storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A writer panicked while holding a store lock.
    #[error("{0} store lock poisoned")]
    Poisoned(&'static str),

    /// An item with the same id already exists.
    #[error("{entity} {id} already exists")]
    Duplicate { entity: &'static str, id: String },

    /// Failed to read the seed file.
    #[error("failed to read seed file")]
    Io(#[from] std::io::Error),

    /// The seed file is not valid JSON of the expected shape.
    #[error("failed to parse seed file")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for ModHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
