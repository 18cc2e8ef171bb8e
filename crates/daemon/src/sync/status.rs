// Human-readable sync status and the surface it is published to.
//
// The scheduler never renders anything itself; it publishes `SyncStatus`
// values and a busy flag to a `StatusSurface`. The daemon uses
// `StatusBoard`, which fans snapshots out over a watch channel.

use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{info, warn};

/// Outcome of the most recent sync activity, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    InProgress,
    Succeeded { at: String },
    NothingToSync { at: String },
    PullFailed { at: String },
    PushFailed { at: String },
    NotConfigured,
}

impl SyncStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncStatus::PullFailed { .. } | SyncStatus::PushFailed { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "Sync idle"),
            SyncStatus::InProgress => write!(f, "Sync in progress"),
            SyncStatus::Succeeded { at } => write!(f, "Sync succeeded: {at}"),
            SyncStatus::NothingToSync { at } => write!(f, "Nothing to sync: {at}"),
            SyncStatus::PullFailed { at } => write!(f, "Pull failed: {at}"),
            SyncStatus::PushFailed { at } => write!(f, "Push failed: {at}"),
            SyncStatus::NotConfigured => write!(f, "Sync not configured"),
        }
    }
}

/// Where status text and the busy indicator go.
pub trait StatusSurface: Send + Sync {
    fn publish(&self, status: &SyncStatus);
    fn set_busy(&self, busy: bool);
    /// One-off user-facing message (e.g. missing configuration).
    fn notice(&self, message: &str);
}

/// Latest status text plus the busy flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: SyncStatus,
    pub text: String,
    pub busy: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self { text: SyncStatus::Idle.to_string(), status: SyncStatus::Idle, busy: false }
    }
}

/// Watch-channel backed status surface.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: watch::Sender<StatusSnapshot>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }
}

impl StatusSurface for StatusBoard {
    fn publish(&self, status: &SyncStatus) {
        if status.is_failure() {
            warn!(status = %status, "sync status");
        } else {
            info!(status = %status, "sync status");
        }
        self.tx.send_modify(|snapshot| {
            snapshot.status = status.clone();
            snapshot.text = status.to_string();
        });
    }

    fn set_busy(&self, busy: bool) {
        self.tx.send_if_modified(|snapshot| {
            let changed = snapshot.busy != busy;
            snapshot.busy = busy;
            changed
        });
    }

    fn notice(&self, message: &str) {
        warn!(notice = message, "sync notice");
    }
}

// ── Timestamps ──────────────────────────────────────────────────────

/// Format `at` with a moment-style pattern such as `YYYY-MM-DD HH:mm:ss`.
pub fn format_timestamp(at: &DateTime<Local>, moment_format: &str) -> String {
    at.format(&moment_to_strftime(moment_format)).to_string()
}

/// Tokens understood by [`moment_to_strftime`], longest first.
const MOMENT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("dddd", "%A"),
    ("MMM", "%b"),
    ("ddd", "%a"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("M", "%-m"),
    ("D", "%-d"),
    ("H", "%-H"),
    ("h", "%-I"),
    ("m", "%-M"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// Translate a moment.js-style format string into a chrono strftime string.
///
/// Text inside `[...]` is copied literally, `%` is escaped, and anything
/// that is not a known token passes through unchanged.
pub fn moment_to_strftime(moment: &str) -> String {
    let mut out = String::with_capacity(moment.len() * 2);
    let mut rest = moment;

    'outer: while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            if let Some(end) = rest.find(']') {
                push_literal(&mut out, &rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }

        for (token, replacement) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }

        push_literal(&mut out, &rest[..ch.len_utf8()]);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, literal: &str) {
    for ch in literal.chars() {
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 4).single().expect("valid local time")
    }

    #[test]
    fn default_format_converts() {
        assert_eq!(moment_to_strftime("YYYY-MM-DD HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(format_timestamp(&sample(), "YYYY-MM-DD HH:mm:ss"), "2024-03-07 09:05:04");
    }

    #[test]
    fn unpadded_and_twelve_hour_tokens() {
        assert_eq!(format_timestamp(&sample(), "D/M/YY h:m:s A"), "7/3/24 9:5:4 AM");
    }

    #[test]
    fn month_and_weekday_names() {
        assert_eq!(format_timestamp(&sample(), "dddd, MMMM D"), "Thursday, March 7");
        assert_eq!(format_timestamp(&sample(), "ddd MMM"), "Thu Mar");
    }

    #[test]
    fn bracketed_text_and_percent_are_literal() {
        assert_eq!(moment_to_strftime("[at] HH:mm [100%]"), "at %H:%M 100%%");
        assert_eq!(format_timestamp(&sample(), "[Day] DD"), "Day 07");
    }

    #[test]
    fn unknown_characters_pass_through() {
        assert_eq!(moment_to_strftime("YYYY_MM @ ü"), "%Y_%m @ ü");
    }

    #[test]
    fn status_text() {
        let at = "2024-03-07 09:05:04".to_string();
        assert_eq!(
            SyncStatus::Succeeded { at: at.clone() }.to_string(),
            "Sync succeeded: 2024-03-07 09:05:04"
        );
        assert_eq!(SyncStatus::PullFailed { at: at.clone() }.to_string(), "Pull failed: 2024-03-07 09:05:04");
        assert_eq!(SyncStatus::PushFailed { at: at.clone() }.to_string(), "Push failed: 2024-03-07 09:05:04");
        assert_eq!(SyncStatus::NothingToSync { at }.to_string(), "Nothing to sync: 2024-03-07 09:05:04");
        assert!(!SyncStatus::NotConfigured.is_failure());
    }

    #[test]
    fn board_tracks_latest_snapshot() {
        let board = StatusBoard::new();
        let rx = board.subscribe();

        board.set_busy(true);
        board.publish(&SyncStatus::InProgress);
        assert!(rx.borrow().busy);
        assert_eq!(rx.borrow().text, "Sync in progress");

        board.set_busy(false);
        let snapshot = board.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.status, SyncStatus::InProgress);
    }
}
