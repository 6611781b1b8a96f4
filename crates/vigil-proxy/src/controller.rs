//! Proxy controller.
//!
//! Applies or clears the PAC policy and records the outcome in
//! diagnostics. Diagnostics are updated only after the settings write is
//! acknowledged; a failed write records the error and never produces a
//! false "applied" entry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use vigil_core::{build_pac_script, ProxyConfig, PROXY_TARGETS};

use crate::diagnostics::{DiagPatch, DiagnosticsRecorder, LogEntry, PacMode};
use crate::error::Result;
use crate::settings::ProxySettings;

/// Outcome of an apply attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The PAC policy was installed.
    Applied,
    /// The config was disabled or invalid; nothing was changed.
    Skipped,
}

/// Installs and clears the PAC proxy policy.
pub struct ProxyController {
    settings: Arc<dyn ProxySettings>,
    diagnostics: DiagnosticsRecorder,
}

impl ProxyController {
    pub fn new(settings: Arc<dyn ProxySettings>, diagnostics: DiagnosticsRecorder) -> Self {
        Self {
            settings,
            diagnostics,
        }
    }

    /// Applies the PAC policy for `config`.
    ///
    /// Disabled or invalid configs are a silent no-op (`Skipped`).
    /// Otherwise the PAC script is generated and installed; on
    /// acknowledgement the diagnostics record the applied endpoint, and on
    /// failure the error is recorded and returned.
    pub fn apply(&self, config: &ProxyConfig) -> Result<Applied> {
        if !config.enabled {
            debug!("Proxy disabled; skipping apply");
            return Ok(Applied::Skipped);
        }
        if let Err(e) = config.validate() {
            debug!("Invalid proxy config ({}); skipping apply", e);
            return Ok(Applied::Skipped);
        }

        let pac = build_pac_script(&config.host, config.port, PROXY_TARGETS);
        info!(
            host = %config.host,
            port = config.port,
            targets = PROXY_TARGETS.len(),
            "Applying PAC policy"
        );
        debug!(pac = %pac, "Generated PAC script");

        match self.settings.apply_pac(&pac) {
            Ok(()) => {
                self.diagnostics.record(
                    DiagPatch {
                        enabled: Some(true),
                        pac_mode: Some(PacMode::PacScript),
                        applied_at: Some(Utc::now()),
                        host: Some(config.host.clone()),
                        port: Some(config.port),
                        ..DiagPatch::default()
                    },
                    Some(LogEntry::info("PAC applied").with_endpoint(&config.host, config.port)),
                );
                Ok(Applied::Applied)
            }
            Err(e) => {
                self.diagnostics.record(
                    DiagPatch {
                        last_error: Some(e.to_string()),
                        ..DiagPatch::default()
                    },
                    Some(LogEntry::error("PAC apply failed").with_error(e.to_string())),
                );
                Err(e)
            }
        }
    }

    /// Installs a direct (no-proxy) policy unconditionally.
    pub fn clear(&self) -> Result<()> {
        match self.settings.apply_direct() {
            Ok(()) => {
                info!("Proxy cleared (DIRECT)");
                self.diagnostics.record(
                    DiagPatch {
                        enabled: Some(false),
                        pac_mode: Some(PacMode::Direct),
                        applied_at: Some(Utc::now()),
                        ..DiagPatch::default()
                    },
                    Some(LogEntry::info("PAC cleared")),
                );
                Ok(())
            }
            Err(e) => {
                self.diagnostics.record(
                    DiagPatch {
                        last_error: Some(e.to_string()),
                        ..DiagPatch::default()
                    },
                    Some(LogEntry::error("PAC clear failed").with_error(e.to_string())),
                );
                Err(e)
            }
        }
    }
}
