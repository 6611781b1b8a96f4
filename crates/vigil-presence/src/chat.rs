//! WebSocket chat channel.
//!
//! Frames are JSON `{text, timestamp}` both directions. Blank messages are
//! never sent. On connect the recent history is pulled over HTTP so the
//! log starts populated.

use std::collections::VecDeque;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::client::PresenceClient;
use crate::error::Result;
use crate::models::ChatMessage;

/// Default chat WebSocket URL.
pub const DEFAULT_CHAT_URL: &str = "wss://sharegpt.gurum.cat/chat";

/// Maximum number of messages kept in a [`ChatLog`].
pub const CHAT_LOG_CAPACITY: usize = 5;

/// Bounded log of the most recent chat messages, oldest evicted first.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, evicting the oldest past capacity.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > CHAT_LOG_CAPACITY {
            self.messages.pop_front();
        }
    }

    /// Messages in arrival order, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn is_sendable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Connects to the chat service.
#[derive(Debug, Clone)]
pub struct ChatClient {
    url: String,
}

impl ChatClient {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_CHAT_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Opens the WebSocket connection.
    pub async fn connect(&self) -> Result<ChatSession> {
        let (ws, _response) = connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "Chat connected");
        Ok(ChatSession { ws })
    }

    /// Opens the connection and seeds `log` with the recent history.
    ///
    /// A history fetch failure is logged and does not fail the connect.
    pub async fn connect_with_history(
        &self,
        presence: &PresenceClient,
        log: &mut ChatLog,
    ) -> Result<ChatSession> {
        let session = self.connect().await?;
        match presence.fetch_chat_history().await {
            Ok(history) => {
                for msg in history {
                    log.push(msg);
                }
            }
            Err(e) => warn!("Failed to fetch chat history: {}", e),
        }
        Ok(session)
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

/// An open chat connection.
pub struct ChatSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ChatSession {
    /// Sends `text` stamped with the current time. Empty or whitespace-only
    /// text is dropped; returns whether a frame was sent.
    pub async fn send(&mut self, text: &str) -> Result<bool> {
        if !is_sendable(text) {
            debug!("Dropping blank chat message");
            return Ok(false);
        }
        let frame = serde_json::to_string(&ChatMessage::now(text))?;
        self.ws.send(Message::Text(frame)).await?;
        Ok(true)
    }

    /// Waits for the next chat message. Returns `None` when the connection
    /// closes; non-text frames are skipped.
    pub async fn next_message(&mut self) -> Option<Result<ChatMessage>> {
        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(Into::into))
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage {
            text: text.into(),
            timestamp: "2026-08-23T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn chat_log_keeps_five_most_recent() {
        let mut log = ChatLog::new();
        for i in 0..8 {
            log.push(msg(&format!("message {}", i)));
        }

        assert_eq!(log.len(), CHAT_LOG_CAPACITY);
        let texts: Vec<_> = log.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["message 3", "message 4", "message 5", "message 6", "message 7"]
        );
    }

    #[test]
    fn chat_log_under_capacity_keeps_everything() {
        let mut log = ChatLog::new();
        log.push(msg("a"));
        log.push(msg("b"));
        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());
    }

    #[test]
    fn blank_messages_are_not_sendable() {
        assert!(!is_sendable(""));
        assert!(!is_sendable("   "));
        assert!(!is_sendable("\n\t"));
        assert!(is_sendable("hello"));
        assert!(is_sendable("  padded  "));
    }
}
