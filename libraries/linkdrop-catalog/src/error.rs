//! Error types for the catalog client.

use thiserror::Error;

/// Errors that can occur when talking to the catalog service.
#[derive(Error, Debug)]
pub enum CatalogClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service returned an error response
    #[error("Catalog error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Access token missing or expired
    #[error("Authentication required")]
    AuthRequired,

    /// The refresh token was rejected
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid base URL or pagination link
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, CatalogClientError>;

impl From<CatalogClientError> for linkdrop_core::LinkdropError {
    fn from(err: CatalogClientError) -> Self {
        linkdrop_core::LinkdropError::catalog(err.to_string())
    }
}
