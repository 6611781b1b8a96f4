//! Wire types for the presence service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One device sighting reported by the presence service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSighting {
    pub app_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Response of `POST /api/view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStatus {
    pub status: String,
    #[serde(default)]
    pub devices: Vec<DeviceSighting>,
}

impl ViewStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body of `POST /api/view`.
#[derive(Debug, Serialize)]
pub struct ViewRequest<'a> {
    pub app_id: &'a str,
}

/// Body of `POST /api/activity`.
#[derive(Debug, Serialize)]
pub struct ActivityReport<'a> {
    pub app_id: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// A chat message, as exchanged over the WebSocket and returned by
/// `GET /api/chat/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
