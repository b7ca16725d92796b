/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored value does not fit the domain type
    #[error("Corrupt value in {column}: {value}")]
    Corrupt { column: &'static str, value: i64 },

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

impl From<StorageError> for linkdrop_core::LinkdropError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(e) => linkdrop_core::LinkdropError::from(e),
            other => linkdrop_core::LinkdropError::storage(other.to_string()),
        }
    }
}
