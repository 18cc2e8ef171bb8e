// Event debouncer for vault file events.
//
// Coalesces bursts of filesystem events on the same path within a quiet
// window (default 250ms, range 50–5000ms). A structural kind (create,
// rename, delete) survives later modifies on the same path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::{FileEvent, FileEventKind};
use crate::config::DebounceSettings;

const DEFAULT_DEBOUNCE_MS: u64 = 250;
const MIN_DEBOUNCE_MS: u64 = 50;
const MAX_DEBOUNCE_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    pub window: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { window: Duration::from_millis(DEFAULT_DEBOUNCE_MS) }
    }
}

impl DebounceConfig {
    /// Create a config with the given window in milliseconds, clamped to [50, 5000].
    pub fn with_millis(ms: u64) -> Self {
        let clamped = ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        Self { window: Duration::from_millis(clamped) }
    }
}

impl From<&DebounceSettings> for DebounceConfig {
    fn from(settings: &DebounceSettings) -> Self {
        Self::with_millis(settings.file_event_window_ms)
    }
}

struct PendingEvent {
    kind: FileEventKind,
    last_seen: Instant,
}

/// Call `push()` for each incoming event, then `drain_ready()` once
/// `next_deadline()` has passed.
pub struct Debouncer {
    config: DebounceConfig,
    pending: HashMap<PathBuf, PendingEvent>,
}

impl Debouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self { config, pending: HashMap::new() }
    }

    /// Change the quiet window; pending events keep their timestamps.
    pub fn set_config(&mut self, config: DebounceConfig) {
        self.config = config;
    }

    /// Record a new event. A pending event for the same path is merged and
    /// its timer resets.
    pub fn push(&mut self, event: FileEvent) {
        self.push_at(event, Instant::now());
    }

    fn push_at(&mut self, event: FileEvent, now: Instant) {
        let kind = match self.pending.get(&event.path) {
            Some(existing) => existing.kind.merge(event.kind),
            None => event.kind,
        };
        self.pending.insert(event.path, PendingEvent { kind, last_seen: now });
    }

    /// Drain all events whose quiet window has elapsed.
    pub fn drain_ready(&mut self) -> Vec<FileEvent> {
        self.drain_ready_at(Instant::now())
    }

    fn drain_ready_at(&mut self, now: Instant) -> Vec<FileEvent> {
        let window = self.config.window;
        let mut ready = Vec::new();

        self.pending.retain(|path, pending| {
            if now.duration_since(pending.last_seen) >= window {
                ready.push(FileEvent { kind: pending.kind, path: path.clone() });
                false
            } else {
                true
            }
        });

        ready
    }

    /// Number of events still waiting in the window.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// When the next pending event becomes ready, or None if empty.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.last_seen + self.config.window).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: FileEventKind, path: &str) -> FileEvent {
        FileEvent { kind, path: PathBuf::from(path) }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn config_clamps_window() {
        assert_eq!(DebounceConfig::default().window, ms(250));
        assert_eq!(DebounceConfig::with_millis(10).window, ms(50));
        assert_eq!(DebounceConfig::with_millis(60_000).window, ms(5000));
        assert_eq!(DebounceConfig::with_millis(400).window, ms(400));
    }

    #[test]
    fn config_from_settings() {
        let settings = DebounceSettings { file_event_window_ms: 120, ..Default::default() };
        assert_eq!(DebounceConfig::from(&settings).window, ms(120));
    }

    #[test]
    fn single_event_waits_for_window() {
        let mut debouncer = Debouncer::new(DebounceConfig::with_millis(100));
        let now = Instant::now();

        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now);

        assert!(debouncer.drain_ready_at(now + ms(50)).is_empty());
        assert_eq!(debouncer.pending_count(), 1);

        let ready = debouncer.drain_ready_at(now + ms(100));
        assert_eq!(ready, vec![event(FileEventKind::Modify, "/v/a.md")]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[test]
    fn create_survives_following_modifies() {
        let mut debouncer = Debouncer::new(DebounceConfig::with_millis(100));
        let now = Instant::now();

        debouncer.push_at(event(FileEventKind::Create, "/v/a.md"), now);
        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now + ms(20));
        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now + ms(40));

        assert_eq!(debouncer.pending_count(), 1);
        assert!(debouncer.drain_ready_at(now + ms(80)).is_empty());

        let ready = debouncer.drain_ready_at(now + ms(140));
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].kind, FileEventKind::Create);
    }

    #[test]
    fn create_then_delete_coalesces_to_delete() {
        let mut debouncer = Debouncer::new(DebounceConfig::with_millis(100));
        let now = Instant::now();

        debouncer.push_at(event(FileEventKind::Create, "/v/a.md"), now);
        debouncer.push_at(event(FileEventKind::Delete, "/v/a.md"), now + ms(30));

        let ready = debouncer.drain_ready_at(now + ms(130));
        assert_eq!(ready[0].kind, FileEventKind::Delete);
    }

    #[test]
    fn different_paths_tracked_independently() {
        let mut debouncer = Debouncer::new(DebounceConfig::with_millis(100));
        let now = Instant::now();

        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now);
        debouncer.push_at(event(FileEventKind::Create, "/v/b.md"), now + ms(50));

        let ready = debouncer.drain_ready_at(now + ms(100));
        assert_eq!(ready, vec![event(FileEventKind::Modify, "/v/a.md")]);

        let ready = debouncer.drain_ready_at(now + ms(150));
        assert_eq!(ready, vec![event(FileEventKind::Create, "/v/b.md")]);
    }

    #[test]
    fn next_deadline_is_earliest_pending() {
        let mut debouncer = Debouncer::new(DebounceConfig::with_millis(100));
        assert!(debouncer.next_deadline().is_none());

        let now = Instant::now();
        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now);
        debouncer.push_at(event(FileEventKind::Create, "/v/b.md"), now + ms(50));

        assert_eq!(debouncer.next_deadline(), Some(now + ms(100)));
    }

    #[test]
    fn drain_is_idempotent() {
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        let now = Instant::now();
        debouncer.push_at(event(FileEventKind::Modify, "/v/a.md"), now);

        assert_eq!(debouncer.drain_ready_at(now + ms(250)).len(), 1);
        assert!(debouncer.drain_ready_at(now + ms(500)).is_empty());
        assert!(debouncer.drain_ready().is_empty());
    }
}
