//! Error types for the proxy crate.

use thiserror::Error;

/// Proxy error type.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Proxy-settings write failed.
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential lookup error.
    #[error("Credential error: {0}")]
    Credentials(String),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
