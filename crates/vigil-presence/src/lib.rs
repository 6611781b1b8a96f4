//! Presence polling and chat for Vigil.
//!
//! Talks to the shared presence service: the [`PresenceClient`] wraps the
//! HTTP endpoints, the [`UsagePoller`] turns ticks into rate-limited
//! checks pushed over a channel, [`summarize`] reduces a response to a
//! human-readable digest, and the [`ChatClient`] carries the WebSocket
//! chat with a bounded [`ChatLog`].

pub mod chat;
pub mod client;
pub mod error;
pub mod models;
pub mod poller;
pub mod summary;

pub use chat::{ChatClient, ChatLog, ChatSession, CHAT_LOG_CAPACITY, DEFAULT_CHAT_URL};
pub use client::{PresenceClient, DEFAULT_BASE_URL};
pub use error::{PresenceError, Result};
pub use models::{ActivityReport, ChatMessage, DeviceSighting, ViewStatus};
pub use poller::{Update, UsagePoller, DEFAULT_POLL_INTERVAL};
pub use summary::{summarize, PresenceSummary, RECENT_WINDOW_SECS};
