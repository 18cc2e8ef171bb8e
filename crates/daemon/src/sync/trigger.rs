// Sync triggers and the push debounce gate.
//
// Two independent thresholds are compared against the time since the last
// push: a short one for content edits and a longer one for the periodic
// timer. Structural file changes, startup, manual and shutdown triggers
// are never debounced.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::DebounceSettings;
use crate::watcher::FileEventKind;

// ── Trigger events ──────────────────────────────────────────────────

/// What caused a sync cycle to be considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Startup,
    Timer,
    FileModified,
    FileCreated,
    FileRenamed,
    FileDeleted,
    Manual,
    Shutdown,
}

impl Trigger {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::Timer => "timer",
            Trigger::FileModified => "file_modified",
            Trigger::FileCreated => "file_created",
            Trigger::FileRenamed => "file_renamed",
            Trigger::FileDeleted => "file_deleted",
            Trigger::Manual => "manual",
            Trigger::Shutdown => "shutdown",
        }
    }

    /// Manual syncs run even when automatic sync is switched off.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Trigger::Manual)
    }
}

impl From<FileEventKind> for Trigger {
    fn from(kind: FileEventKind) -> Self {
        match kind {
            FileEventKind::Create => Trigger::FileCreated,
            FileEventKind::Modify => Trigger::FileModified,
            FileEventKind::Rename => Trigger::FileRenamed,
            FileEventKind::Delete => Trigger::FileDeleted,
        }
    }
}

// ── Debounce gate ───────────────────────────────────────────────────

/// Push debounce thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushDebounce {
    /// Gate for `FileModified`.
    pub modify: Duration,
    /// Gate for `Timer`.
    pub periodic: Duration,
}

impl Default for PushDebounce {
    fn default() -> Self {
        Self::from(&DebounceSettings::default())
    }
}

impl From<&DebounceSettings> for PushDebounce {
    fn from(settings: &DebounceSettings) -> Self {
        Self { modify: settings.modify_push(), periodic: settings.periodic_push() }
    }
}

impl PushDebounce {
    /// Threshold that applies to `trigger`, if any.
    pub fn threshold(&self, trigger: Trigger) -> Option<Duration> {
        match trigger {
            Trigger::FileModified => Some(self.modify),
            Trigger::Timer => Some(self.periodic),
            _ => None,
        }
    }

    /// Whether `trigger` may start a cycle at `now` given the last push.
    /// The elapsed time must strictly exceed the threshold.
    pub fn allows(&self, trigger: Trigger, last_push: Option<Instant>, now: Instant) -> bool {
        let Some(threshold) = self.threshold(trigger) else {
            return true;
        };
        match last_push {
            Some(last) => now.checked_duration_since(last).is_some_and(|elapsed| elapsed > threshold),
            None => true, // never pushed
        }
    }
}
