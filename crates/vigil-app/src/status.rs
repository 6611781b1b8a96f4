//! Terminal rendering of diagnostics and presence summaries.

use chrono::{DateTime, Local, Utc};

use vigil_presence::PresenceSummary;
use vigil_proxy::{DiagnosticsState, LogEntry, LogLevel, PacMode};

/// Renders a diagnostics snapshot: summary lines followed by the recent
/// log, newest first.
pub fn render(snap: &DiagnosticsState) -> String {
    let mut out = String::new();

    let mode = match snap.pac_mode {
        PacMode::PacScript => "active (PAC)",
        PacMode::Direct => "inactive (DIRECT)",
    };
    out.push_str(&format!("Status:    {}\n", mode));

    let endpoint = if snap.host.is_empty() {
        "-".to_string()
    } else if snap.port > 0 {
        format!("{}:{}", snap.host, snap.port)
    } else {
        snap.host.clone()
    };
    out.push_str(&format!("Endpoint:  {}\n", endpoint));
    out.push_str(&format!("Applied:   {}\n", fmt_ts(snap.applied_at)));
    out.push_str(&format!(
        "Requests:  {} total, {} ok, {} failed\n",
        snap.sum_requests, snap.sum_ok, snap.sum_failed
    ));
    out.push_str(&format!(
        "Data:      {} in, {} out (approx)\n",
        fmt_bytes(snap.sum_bytes_in),
        fmt_bytes(snap.sum_bytes_out)
    ));
    if let Some(err) = &snap.last_error {
        out.push_str(&format!("Last err:  {}\n", err));
    }

    if !snap.recent.is_empty() {
        out.push_str("\nRecent:\n");
        for entry in snap.recent.iter().rev() {
            out.push_str(&render_log_line(entry));
            out.push('\n');
        }
    }

    out
}

fn render_log_line(e: &LogEntry) -> String {
    let level = match e.level {
        LogLevel::Info => "info ",
        LogLevel::Warn => "warn ",
        LogLevel::Error => "error",
    };
    let mut line = format!("  [{}] {} {}", fmt_ts(Some(e.ts)), level, e.msg);
    if let Some(url) = &e.url {
        line.push_str(&format!(" {}", url));
    }
    if let Some(status) = e.status_code {
        line.push_str(&format!(" {}", status));
    }
    if let Some(err) = &e.error {
        line.push_str(&format!(" {}", err));
    }
    if e.in_bytes.unwrap_or(0) > 0 || e.out_bytes.unwrap_or(0) > 0 {
        line.push_str(&format!(
            " {}/{}",
            fmt_bytes(e.in_bytes.unwrap_or(0)),
            fmt_bytes(e.out_bytes.unwrap_or(0))
        ));
    }
    line
}

/// Renders a presence summary as a single line.
pub fn render_summary(summary: &PresenceSummary) -> String {
    match summary {
        PresenceSummary::OthersActive { count, seconds_ago } => format!(
            "Used {}s ago on {} other device{}",
            seconds_ago,
            count,
            if *count == 1 { "" } else { "s" }
        ),
        PresenceSummary::Quiet { checked_at } => format!(
            "No other device in the last 10 minutes ({})",
            checked_at
                .with_timezone(&Local)
                .format("%H:%M:%S")
        ),
    }
}

fn fmt_ts(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

/// Human-readable byte count: B/KB/MB/GB, one decimal below 10 units.
pub fn fmt_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut v = n as f64;
    let mut i = 0;
    while v >= 1024.0 && i < UNITS.len() - 1 {
        v /= 1024.0;
        i += 1;
    }
    if i > 0 && v < 10.0 {
        format!("{:.1} {}", v, UNITS[i])
    } else {
        format!("{:.0} {}", v, UNITS[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_matches_expected_units() {
        assert_eq!(fmt_bytes(0), "0 B");
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(1024), "1.0 KB");
        assert_eq!(fmt_bytes(10 * 1024), "10 KB");
        assert_eq!(fmt_bytes(1536), "1.5 KB");
        assert_eq!(fmt_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn render_shows_endpoint_and_counters() {
        let mut snap = DiagnosticsState::default();
        snap.enabled = true;
        snap.pac_mode = PacMode::PacScript;
        snap.host = "10.0.0.1".into();
        snap.port = 3128;
        snap.sum_requests = 5;
        snap.sum_ok = 4;
        snap.sum_failed = 1;
        snap.sum_bytes_in = 2048;

        let text = render(&snap);
        assert!(text.contains("active (PAC)"));
        assert!(text.contains("10.0.0.1:3128"));
        assert!(text.contains("5 total, 4 ok, 1 failed"));
        assert!(text.contains("2.0 KB in"));
    }

    #[test]
    fn render_log_is_newest_first() {
        let mut snap = DiagnosticsState::default();
        snap.recent.push(LogEntry::info("first"));
        snap.recent.push(LogEntry::error("second"));

        let text = render(&snap);
        let first = text.find("second").unwrap();
        let second = text.find("first").unwrap();
        assert!(first < second);
    }

    #[test]
    fn summary_lines_read_naturally() {
        let one = render_summary(&PresenceSummary::OthersActive {
            count: 1,
            seconds_ago: 42,
        });
        assert_eq!(one, "Used 42s ago on 1 other device");

        let many = render_summary(&PresenceSummary::OthersActive {
            count: 3,
            seconds_ago: 7,
        });
        assert_eq!(many, "Used 7s ago on 3 other devices");

        let quiet = render_summary(&PresenceSummary::Quiet {
            checked_at: "2026-08-23T12:00:00Z".parse().unwrap(),
        });
        assert!(quiet.starts_with("No other device in the last 10 minutes"));
    }
}
