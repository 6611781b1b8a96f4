//! Diagnostics state and recorder.
//!
//! A single process-wide [`DiagnosticsRecorder`] owns the diagnostics
//! state: aggregate request/byte counters, the last proxy error, the last
//! auth exchange, and a bounded log of recent events. Every mutation
//! persists the full snapshot through an injected [`DiagnosticsStore`];
//! persistence failures are logged and never fatal.
//!
//! The serialized field names are part of the stored `proxyDiagnostics`
//! format; snapshots written by earlier releases must stay readable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProxyError, Result};

/// Maximum number of retained log entries. Oldest are evicted first.
pub const MAX_LOG_ENTRIES: usize = 50;

/// Active proxy policy mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacMode {
    /// No proxying; every request goes direct.
    #[default]
    Direct,
    /// PAC script installed.
    PacScript,
}

/// Log entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A single diagnostics log entry. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Timestamp of the append.
    pub ts: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Short human-readable message.
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl LogEntry {
    fn new(level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level,
            msg: msg.into(),
            url: None,
            status_code: None,
            error: None,
            in_bytes: None,
            out_bytes: None,
            host: None,
            port: None,
        }
    }

    /// Info-level entry.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, msg)
    }

    /// Warn-level entry.
    pub fn warn(msg: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, msg)
    }

    /// Error-level entry.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, msg)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_bytes(mut self, in_bytes: u64, out_bytes: u64) -> Self {
        self.in_bytes = Some(in_bytes);
        self.out_bytes = Some(out_bytes);
        self
    }

    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }
}

/// Audit record of the most recent auth exchange. Passwords never appear
/// here; callers log them masked only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAudit {
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default)]
    pub url_host: String,
    #[serde(default)]
    pub challenger_host: String,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub realm: String,
    /// Whether credentials were supplied.
    #[serde(default)]
    pub provided: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthAudit {
    /// Audit entry for a failed credential lookup.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// The full diagnostics snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsState {
    /// Whether the PAC policy is currently applied.
    pub enabled: bool,
    /// Active proxy mode. Invariant: `pac_mode == PacScript` iff `enabled`.
    pub pac_mode: PacMode,
    /// When the current policy was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
    /// Proxy host the policy points at.
    #[serde(default)]
    pub host: String,
    /// Proxy port the policy points at.
    #[serde(default)]
    pub port: u16,
    /// Total observed requests to target hosts.
    #[serde(default)]
    pub sum_requests: u64,
    /// Requests that completed with a 2xx/3xx status.
    #[serde(rename = "sumOK", default)]
    pub sum_ok: u64,
    /// Requests that failed or completed with 4xx/5xx.
    #[serde(default)]
    pub sum_failed: u64,
    /// Response bytes, from Content-Length headers.
    #[serde(default)]
    pub sum_bytes_in: u64,
    /// Request bytes, from Content-Length headers.
    #[serde(default)]
    pub sum_bytes_out: u64,
    /// Most recent proxy error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Most recent auth exchange, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_auth: Option<AuthAudit>,
    /// Recent log entries, oldest first, at most [`MAX_LOG_ENTRIES`].
    #[serde(default)]
    pub recent: Vec<LogEntry>,
}

/// Partial update merged into [`DiagnosticsState`] by
/// [`DiagnosticsRecorder::record`]. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct DiagPatch {
    pub enabled: Option<bool>,
    pub pac_mode: Option<PacMode>,
    pub applied_at: Option<DateTime<Utc>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub last_error: Option<String>,
    pub last_auth: Option<AuthAudit>,
}

/// Persistence seam for the diagnostics snapshot.
pub trait DiagnosticsStore: Send + Sync {
    /// Persist the full snapshot.
    fn persist(&self, snapshot: &DiagnosticsState) -> Result<()>;
}

impl DiagnosticsStore for vigil_storage::Database {
    fn persist(&self, snapshot: &DiagnosticsState) -> Result<()> {
        self.save_diagnostics(snapshot)
            .map_err(|e| ProxyError::Storage(e.to_string()))
    }
}

/// In-memory store for ephemeral runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    last: Mutex<Option<DiagnosticsState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently persisted snapshot.
    pub fn last_persisted(&self) -> Option<DiagnosticsState> {
        self.last.lock().clone()
    }
}

impl DiagnosticsStore for MemoryStore {
    fn persist(&self, snapshot: &DiagnosticsState) -> Result<()> {
        *self.last.lock() = Some(snapshot.clone());
        Ok(())
    }
}

/// Process-wide diagnostics recorder.
///
/// Cheap to clone; clones share the same state and store.
#[derive(Clone)]
pub struct DiagnosticsRecorder {
    state: Arc<Mutex<DiagnosticsState>>,
    store: Arc<dyn DiagnosticsStore>,
}

impl DiagnosticsRecorder {
    /// Creates a recorder starting from a fresh state.
    pub fn new(store: Arc<dyn DiagnosticsStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DiagnosticsState::default())),
            store,
        }
    }

    /// Creates a recorder resuming from a previously persisted state.
    pub fn with_state(store: Arc<dyn DiagnosticsStore>, state: DiagnosticsState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            store,
        }
    }

    /// Returns a deep copy of the current state, safe for callers to
    /// mutate.
    pub fn snapshot(&self) -> DiagnosticsState {
        self.state.lock().clone()
    }

    /// Merges `patch` into the state, optionally appends a log entry, and
    /// persists the full snapshot.
    pub fn record(&self, patch: DiagPatch, entry: Option<LogEntry>) {
        let snapshot = {
            let mut state = self.state.lock();
            if let Some(v) = patch.enabled {
                state.enabled = v;
            }
            if let Some(v) = patch.pac_mode {
                state.pac_mode = v;
            }
            if let Some(v) = patch.applied_at {
                state.applied_at = Some(v);
            }
            if let Some(v) = patch.host {
                state.host = v;
            }
            if let Some(v) = patch.port {
                state.port = v;
            }
            if let Some(v) = patch.last_error {
                state.last_error = Some(v);
            }
            if let Some(v) = patch.last_auth {
                state.last_auth = Some(v);
            }
            if let Some(entry) = entry {
                push_bounded(&mut state.recent, entry);
            }
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Appends a log entry with bounded eviction and persists.
    pub fn push_log(&self, entry: LogEntry) {
        let snapshot = {
            let mut state = self.state.lock();
            push_bounded(&mut state.recent, entry);
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Counts one observed request outcome and persists.
    pub fn add_request_outcome(&self, ok: bool, in_bytes: u64, out_bytes: u64) {
        let snapshot = {
            let mut state = self.state.lock();
            state.sum_requests += 1;
            if ok {
                state.sum_ok += 1;
            } else {
                state.sum_failed += 1;
            }
            state.sum_bytes_in += in_bytes;
            state.sum_bytes_out += out_bytes;
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Zeroes all counters and clears the log. Mode, endpoint, and the
    /// enabled flag are untouched.
    pub fn reset_counters(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.sum_requests = 0;
            state.sum_ok = 0;
            state.sum_failed = 0;
            state.sum_bytes_in = 0;
            state.sum_bytes_out = 0;
            state.recent.clear();
            state.clone()
        };
        self.persist(&snapshot);
    }

    fn persist(&self, snapshot: &DiagnosticsState) {
        if let Err(e) = self.store.persist(snapshot) {
            warn!("Failed to persist diagnostics: {}", e);
        }
    }
}

fn push_bounded(log: &mut Vec<LogEntry>, entry: LogEntry) {
    log.push(entry);
    if log.len() > MAX_LOG_ENTRIES {
        let excess = log.len() - MAX_LOG_ENTRIES;
        log.drain(0..excess);
    }
}
