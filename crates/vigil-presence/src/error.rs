use thiserror::Error;

/// Errors from the presence service and chat channel.
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Update channel closed")]
    ChannelClosed,
}

/// Result type for presence operations.
pub type Result<T> = std::result::Result<T, PresenceError>;
