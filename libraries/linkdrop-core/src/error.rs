//! Core error types for Linkdrop

use std::fmt;
use thiserror::Error;

/// Result type alias using `LinkdropError`
pub type Result<T> = std::result::Result<T, LinkdropError>;

/// Catalog write performed during a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// Removing the oldest entries to make room
    Evict,
    /// Adding the new batch at the head
    Insert,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Evict => write!(f, "evict"),
            WriteOp::Insert => write!(f, "insert"),
        }
    }
}

/// Core error type for Linkdrop
#[derive(Error, Debug)]
pub enum LinkdropError {
    /// Catalog request failed (lookup, listing, search)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Expanding one link failed; siblings are unaffected
    #[error("Failed to expand {reference}: {message}")]
    Expansion {
        /// The link as `kind:id`, or the video URL
        reference: String,
        /// Underlying catalog error text
        message: String,
    },

    /// A catalog write failed and aborted the pass
    #[error("Playlist {op} failed: {message}")]
    Write {
        /// Which step of the pass failed
        op: WriteOp,
        /// Underlying catalog error text
        message: String,
    },

    /// Video title could not be resolved
    #[error("Title resolution error: {0}")]
    TitleResolution(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database errors (for ledger implementations)
    #[error("Database error: {0}")]
    Database(String),
}

impl LinkdropError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create an expansion error for one link
    pub fn expansion(reference: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Expansion {
            reference: reference.into(),
            message: msg.into(),
        }
    }

    /// Create a write failure
    pub fn write(op: WriteOp, msg: impl Into<String>) -> Self {
        Self::Write {
            op,
            message: msg.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether this error aborted a reconciliation pass
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for LinkdropError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failure_names_the_operation() {
        let err = LinkdropError::write(WriteOp::Evict, "502 Bad Gateway");
        assert!(err.is_write_failure());
        assert_eq!(err.to_string(), "Playlist evict failed: 502 Bad Gateway");
    }

    #[test]
    fn expansion_error_is_not_a_write_failure() {
        let err = LinkdropError::expansion("album:xyz", "timeout");
        assert!(!err.is_write_failure());
        assert!(err.to_string().contains("album:xyz"));
    }
}
