//! Usage poller.
//!
//! Periodically asks the presence service who else is viewing and forwards
//! results over a channel. Ticks are cheap and may arrive from anywhere
//! (timers, UI refresh); the poller issues an actual check only when the
//! configured interval has elapsed or the tick is forced, and never while a
//! previous check is still in flight.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::PresenceClient;
use crate::models::ViewStatus;

/// Default interval between presence checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Updates pushed by the poller.
#[derive(Debug, Clone)]
pub enum Update {
    /// A view-status response arrived.
    ViewStatus(ViewStatus),
    /// A forced check started; consumers may show a loading state.
    Refresh,
}

#[derive(Default)]
struct PollState {
    checking: bool,
    last_checked: Option<Instant>,
}

/// Polls the presence service on ticks.
pub struct UsagePoller {
    client: PresenceClient,
    app_id: String,
    interval: Duration,
    state: Mutex<PollState>,
    updates: mpsc::Sender<Update>,
}

impl UsagePoller {
    pub fn new(
        client: PresenceClient,
        app_id: impl Into<String>,
        interval: Duration,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            interval,
            state: Mutex::new(PollState::default()),
            updates,
        }
    }

    /// Requests a check. Returns `true` if one was actually issued.
    ///
    /// Unforced ticks are dropped until [`Self::interval`] has elapsed
    /// since the last completed check; all ticks are dropped while a check
    /// is in flight.
    pub async fn tick(&self, force: bool) -> bool {
        if !self.try_begin(force) {
            return false;
        }

        if force {
            self.push(Update::Refresh).await;
        }

        match self.client.fetch_view_status(&self.app_id).await {
            Ok(status) => {
                debug!(devices = status.devices.len(), "Presence check completed");
                self.push(Update::ViewStatus(status)).await;
            }
            Err(e) => {
                // Non-fatal; the next tick tries again.
                warn!("Presence check failed: {}", e);
            }
        }

        self.finish();
        true
    }

    /// Configured check interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn try_begin(&self, force: bool) -> bool {
        let mut st = self.state.lock().unwrap();
        if st.checking {
            return false;
        }
        let due = force
            || st
                .last_checked
                .map_or(true, |t| t.elapsed() >= self.interval);
        if !due {
            return false;
        }
        st.checking = true;
        true
    }

    fn finish(&self) {
        let mut st = self.state.lock().unwrap();
        st.checking = false;
        st.last_checked = Some(Instant::now());
    }

    async fn push(&self, update: Update) {
        if self.updates.send(update).await.is_err() {
            warn!("Update channel closed; dropping presence update");
        }
    }
}
