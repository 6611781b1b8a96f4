//! HTTP client for the presence service.
//!
//! Three endpoints: `POST /api/view` reports who is looking, `POST
//! /api/activity` records an actual message send, `GET /api/chat/history`
//! returns recent chat messages. Non-2xx responses are errors; callers
//! decide whether to retry (nothing here does).

use chrono::Utc;
use tracing::debug;

use crate::error::{PresenceError, Result};
use crate::models::{ActivityReport, ChatMessage, ViewRequest, ViewStatus};

/// Default presence service base URL.
pub const DEFAULT_BASE_URL: &str = "https://sharegpt.gurum.cat";

/// Client for the presence service.
#[derive(Debug, Clone)]
pub struct PresenceClient {
    client: reqwest::Client,
    base_url: String,
}

impl PresenceClient {
    /// Creates a client against the default service.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against `base_url` (no trailing slash).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("Vigil/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reports this device as viewing and returns the current sightings.
    pub async fn fetch_view_status(&self, app_id: &str) -> Result<ViewStatus> {
        let url = format!("{}/api/view", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&ViewRequest { app_id })
            .send()
            .await?;
        let status = check_status(&url, res)?;
        let view: ViewStatus = status.json().await?;
        debug!(status = %view.status, devices = view.devices.len(), "View status fetched");
        Ok(view)
    }

    /// Reports that this device just sent a chat message.
    pub async fn report_activity(&self, app_id: &str) -> Result<()> {
        let url = format!("{}/api/activity", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&ActivityReport {
                app_id,
                timestamp: Utc::now(),
            })
            .send()
            .await?;
        check_status(&url, res)?;
        debug!("Activity reported");
        Ok(())
    }

    /// Fetches the recent chat history.
    pub async fn fetch_chat_history(&self) -> Result<Vec<ChatMessage>> {
        let url = format!("{}/api/chat/history", self.base_url);
        let res = self.client.get(&url).send().await?;
        let res = check_status(&url, res)?;
        Ok(res.json().await?)
    }
}

fn check_status(endpoint: &str, res: reqwest::Response) -> Result<reqwest::Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(PresenceError::Status {
            endpoint: endpoint.to_string(),
            status: res.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = PresenceClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        let client = PresenceClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
