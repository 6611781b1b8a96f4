//! Proxy control, diagnostics, and authentication.
//!
//! Ties the PAC policy to the platform: the [`ProxyController`] installs or
//! clears the auto-proxy configuration through a [`ProxySettings`] seam,
//! the [`DiagnosticsRecorder`] keeps counters and a bounded activity log
//! persisted through a [`DiagnosticsStore`], the [`TrafficObserver`] does
//! per-request byte accounting, and the [`AuthResponder`] answers
//! proxy-auth challenges from stored credentials.

pub mod auth;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod settings;
pub mod traffic;

pub use auth::{AuthChallenge, AuthCredentials, AuthResponder, CredentialSource};
pub use controller::{Applied, ProxyController};
pub use diagnostics::{
    AuthAudit, DiagPatch, DiagnosticsRecorder, DiagnosticsState, DiagnosticsStore, LogEntry,
    LogLevel, MemoryStore, PacMode, MAX_LOG_ENTRIES,
};
pub use error::{ProxyError, Result};
pub use settings::{ProxySettings, SystemProxySettings};
pub use traffic::TrafficObserver;
