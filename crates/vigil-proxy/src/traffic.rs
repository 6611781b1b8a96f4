//! Traffic observation and byte accounting.
//!
//! Requests to target hosts report three lifecycle events keyed by a
//! per-request identifier: headers sent, completed, or failed. Outbound
//! bytes are captured from the request Content-Length at send time and
//! consumed when the request reaches a terminal event. Both terminal
//! events (completion and error) evict the pending entry, so an aborted
//! request cannot leak accounting state.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::diagnostics::{DiagPatch, DiagnosticsRecorder, LogEntry};

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn content_length(headers: &[(String, String)]) -> Option<u64> {
    header_value(headers, "content-length").and_then(|v| v.trim().parse().ok())
}

/// Observes request lifecycle events for target hosts and feeds the
/// diagnostics recorder.
pub struct TrafficObserver {
    diagnostics: DiagnosticsRecorder,
    /// Pending outbound byte counts, keyed by request identifier.
    pending: Mutex<HashMap<String, u64>>,
}

impl TrafficObserver {
    pub fn new(diagnostics: DiagnosticsRecorder) -> Self {
        Self {
            diagnostics,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Request headers are about to be sent. Captures the outbound
    /// Content-Length, if present.
    pub fn on_request(&self, request_id: &str, request_headers: &[(String, String)]) {
        if let Some(bytes) = content_length(request_headers) {
            self.pending.lock().insert(request_id.to_string(), bytes);
        }
    }

    /// Request completed with a status code. Consumes the pending entry and
    /// counts the outcome; inbound bytes come from the response
    /// Content-Length, defaulting to 0 when absent.
    pub fn on_completed(
        &self,
        request_id: &str,
        url: &str,
        status_code: u16,
        response_headers: &[(String, String)],
    ) {
        let out_bytes = self.pending.lock().remove(request_id).unwrap_or(0);
        let in_bytes = content_length(response_headers).unwrap_or(0);
        let ok = (200..400).contains(&status_code);

        self.diagnostics.add_request_outcome(ok, in_bytes, out_bytes);
        self.diagnostics.push_log(
            LogEntry::info("Request completed")
                .with_url(url)
                .with_status(status_code)
                .with_bytes(in_bytes, out_bytes),
        );
        debug!(url, status_code, in_bytes, out_bytes, "Request completed");
    }

    /// Request failed before completion. Counts a failure and evicts the
    /// pending entry so aborted requests do not accumulate.
    pub fn on_error(&self, request_id: &str, url: &str, error: &str) {
        self.pending.lock().remove(request_id);

        self.diagnostics.add_request_outcome(false, 0, 0);
        self.diagnostics
            .push_log(LogEntry::error("Request error").with_url(url).with_error(error));
        warn!(url, error, "Request error");
    }

    /// A proxy-level error (PAC evaluation, connection to the proxy).
    pub fn on_proxy_error(&self, error: &str) {
        self.diagnostics.record(
            DiagPatch {
                last_error: Some(error.to_string()),
                ..DiagPatch::default()
            },
            Some(LogEntry::error("Proxy error").with_error(error)),
        );
        warn!(error, "Proxy error");
    }

    /// Number of requests awaiting a terminal event.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
