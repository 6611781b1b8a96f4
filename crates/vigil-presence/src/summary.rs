//! Presence summaries.
//!
//! Reduces a raw view-status response to what the user actually cares
//! about: has anyone else used the chat interface in the last ten minutes,
//! and how recently.

use chrono::{DateTime, Utc};

use crate::models::ViewStatus;

/// Sightings older than this many seconds are ignored.
pub const RECENT_WINDOW_SECS: i64 = 10 * 60;

/// Digest of a view-status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceSummary {
    /// Other devices were active within the window.
    OthersActive {
        /// Number of other devices seen in the window.
        count: usize,
        /// Seconds since the most recent other sighting.
        seconds_ago: i64,
    },
    /// No other device seen in the window.
    Quiet { checked_at: DateTime<Utc> },
}

/// Summarizes `status` from the point of view of `my_app_id`.
///
/// Returns `None` for unsuccessful responses. The own device is excluded,
/// as are sightings older than [`RECENT_WINDOW_SECS`].
pub fn summarize(status: &ViewStatus, my_app_id: &str, now: DateTime<Utc>) -> Option<PresenceSummary> {
    if !status.is_success() {
        return None;
    }

    let recent_others: Vec<_> = status
        .devices
        .iter()
        .filter(|d| d.app_id != my_app_id)
        .filter(|d| now.signed_duration_since(d.timestamp).num_seconds() <= RECENT_WINDOW_SECS)
        .collect();

    let most_recent = recent_others.iter().map(|d| d.timestamp).max();

    Some(match most_recent {
        Some(ts) => PresenceSummary::OthersActive {
            count: recent_others.len(),
            seconds_ago: now.signed_duration_since(ts).num_seconds(),
        },
        None => PresenceSummary::Quiet { checked_at: now },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceSighting;

    fn status(devices: Vec<DeviceSighting>) -> ViewStatus {
        ViewStatus {
            status: "success".into(),
            devices,
        }
    }

    fn sighting(app_id: &str, ts: &str) -> DeviceSighting {
        DeviceSighting {
            app_id: app_id.into(),
            timestamp: ts.parse().unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-23T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn reports_most_recent_other_sighting() {
        let st = status(vec![
            sighting("other-1", "2026-08-23T11:55:00Z"),
            sighting("other-2", "2026-08-23T11:58:30Z"),
        ]);

        let summary = summarize(&st, "me", now()).unwrap();
        assert_eq!(
            summary,
            PresenceSummary::OthersActive {
                count: 2,
                seconds_ago: 90,
            }
        );
    }

    #[test]
    fn own_device_is_excluded() {
        let st = status(vec![sighting("me", "2026-08-23T11:59:59Z")]);
        let summary = summarize(&st, "me", now()).unwrap();
        assert!(matches!(summary, PresenceSummary::Quiet { .. }));
    }

    #[test]
    fn old_sightings_are_excluded() {
        let st = status(vec![
            sighting("other-1", "2026-08-23T11:49:59Z"), // 10m 1s ago
            sighting("other-2", "2026-08-23T11:50:00Z"), // exactly 10m ago
        ]);

        let summary = summarize(&st, "me", now()).unwrap();
        assert_eq!(
            summary,
            PresenceSummary::OthersActive {
                count: 1,
                seconds_ago: 600,
            }
        );
    }

    #[test]
    fn quiet_when_no_devices() {
        let summary = summarize(&status(vec![]), "me", now()).unwrap();
        assert_eq!(summary, PresenceSummary::Quiet { checked_at: now() });
    }

    #[test]
    fn unsuccessful_response_yields_none() {
        let st = ViewStatus {
            status: "error".into(),
            devices: vec![sighting("other", "2026-08-23T11:59:00Z")],
        };
        assert!(summarize(&st, "me", now()).is_none());
    }
}
