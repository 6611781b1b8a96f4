//! Command dispatcher.
//!
//! All app surfaces funnel through one tagged command union with an
//! exhaustive match, so adding a command is a compile error until every
//! dispatch site handles it.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use vigil_presence::PresenceClient;
use vigil_proxy::{DiagnosticsRecorder, DiagnosticsState, ProxyController};
use vigil_storage::Database;

/// Commands accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply the stored proxy configuration.
    ApplyProxy,
    /// Clear the proxy (DIRECT).
    DisableProxy,
    /// Fetch the current diagnostics snapshot.
    GetProxyStatus,
    /// Zero the diagnostics counters and log.
    ResetProxyStats,
    /// A chat message was sent; report activity to the presence service.
    ChatMessageSent,
}

/// Dispatch results.
#[derive(Debug)]
pub enum Response {
    Ack,
    Snapshot(DiagnosticsState),
}

/// Routes commands to the proxy controller, diagnostics, and presence
/// service.
pub struct Dispatcher {
    db: Arc<Database>,
    controller: ProxyController,
    diagnostics: DiagnosticsRecorder,
    presence: PresenceClient,
    app_id: String,
}

impl Dispatcher {
    pub fn new(
        db: Arc<Database>,
        controller: ProxyController,
        diagnostics: DiagnosticsRecorder,
        presence: PresenceClient,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            db,
            controller,
            diagnostics,
            presence,
            app_id: app_id.into(),
        }
    }

    pub async fn handle(&self, command: Command) -> Result<Response> {
        match command {
            Command::ApplyProxy => {
                let config = self.db.load_proxy_config()?;
                self.controller.apply(&config)?;
                Ok(Response::Ack)
            }
            Command::DisableProxy => {
                self.controller.clear()?;
                Ok(Response::Ack)
            }
            Command::GetProxyStatus => Ok(Response::Snapshot(self.diagnostics.snapshot())),
            Command::ResetProxyStats => {
                self.diagnostics.reset_counters();
                Ok(Response::Ack)
            }
            Command::ChatMessageSent => {
                // Best effort; a missed activity report is not worth failing.
                if let Err(e) = self.presence.report_activity(&self.app_id).await {
                    warn!("Failed to report activity: {}", e);
                }
                Ok(Response::Ack)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::ProxyConfig;
    use vigil_proxy::{MemoryStore, ProxySettings};

    struct NoopSettings;

    impl ProxySettings for NoopSettings {
        fn apply_pac(&self, _pac: &str) -> vigil_proxy::Result<()> {
            Ok(())
        }

        fn apply_direct(&self) -> vigil_proxy::Result<()> {
            Ok(())
        }
    }

    fn dispatcher() -> Dispatcher {
        let db = Arc::new(Database::in_memory().unwrap());
        let diagnostics = DiagnosticsRecorder::new(Arc::new(MemoryStore::new()));
        let controller = ProxyController::new(Arc::new(NoopSettings), diagnostics.clone());
        let presence = PresenceClient::with_base_url("http://127.0.0.1:1").unwrap();
        Dispatcher::new(db, controller, diagnostics, presence, "test-app")
    }

    #[tokio::test]
    async fn apply_with_enabled_config_records_diagnostics() {
        let d = dispatcher();
        d.db.save_proxy_config(&ProxyConfig {
            host: "10.0.0.1".into(),
            port: 3128,
            username: String::new(),
            password: String::new(),
            enabled: true,
        })
        .unwrap();

        assert!(matches!(
            d.handle(Command::ApplyProxy).await.unwrap(),
            Response::Ack
        ));
        let Response::Snapshot(snap) = d.handle(Command::GetProxyStatus).await.unwrap() else {
            panic!("expected snapshot");
        };
        assert!(snap.enabled);
        assert_eq!(snap.host, "10.0.0.1");
    }

    #[tokio::test]
    async fn apply_with_empty_config_is_a_no_op() {
        let d = dispatcher();

        d.handle(Command::ApplyProxy).await.unwrap();
        let Response::Snapshot(snap) = d.handle(Command::GetProxyStatus).await.unwrap() else {
            panic!("expected snapshot");
        };
        assert!(!snap.enabled);
        assert!(snap.recent.is_empty());
    }

    #[tokio::test]
    async fn reset_zeroes_counters() {
        let d = dispatcher();
        d.diagnostics.add_request_outcome(true, 10, 20);

        d.handle(Command::ResetProxyStats).await.unwrap();
        let snap = d.diagnostics.snapshot();
        assert_eq!(snap.sum_requests, 0);
        assert_eq!(snap.sum_bytes_in, 0);
    }

    #[tokio::test]
    async fn chat_message_sent_acks_even_when_service_is_down() {
        let d = dispatcher();
        // Presence client points at a closed port.
        assert!(matches!(
            d.handle(Command::ChatMessageSent).await.unwrap(),
            Response::Ack
        ));
    }
}
