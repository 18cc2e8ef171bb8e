// Vault file watcher: fsevents/inotify → FileEvent → debounce → scheduler.
// This module handles the first stage: raw FS event detection and filtering.

pub mod debounce;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Kind of change the sync scheduler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    /// File or directory was created.
    Create,
    /// File content was modified.
    Modify,
    /// File or directory was renamed or moved.
    Rename,
    /// File or directory was deleted.
    Delete,
}

impl FileEventKind {
    /// Create, rename and delete change the vault's structure; they are
    /// never debounced by the scheduler.
    pub fn is_structural(self) -> bool {
        !matches!(self, FileEventKind::Modify)
    }

    fn rank(self) -> u8 {
        match self {
            FileEventKind::Modify => 0,
            FileEventKind::Create => 1,
            FileEventKind::Rename => 2,
            FileEventKind::Delete => 3,
        }
    }

    /// Combine two events on the same path. A later structural event
    /// replaces the earlier kind; a later modify never hides a structural one.
    pub fn merge(self, later: FileEventKind) -> FileEventKind {
        if self.is_structural() && !later.is_structural() {
            self
        } else {
            later
        }
    }

    /// Most significant kind in a batch, or None for an empty batch.
    pub fn strongest(kinds: impl IntoIterator<Item = FileEventKind>) -> Option<FileEventKind> {
        kinds.into_iter().max_by_key(|kind| kind.rank())
    }
}

/// A filesystem change under the vault root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

/// Capacity for the internal event channel.
const EVENT_CHANNEL_CAPACITY: usize = 512;

/// Watches a vault directory using the OS-native file watcher (fsevents on
/// macOS, inotify on Linux). Changes inside `.git/` are ignored, so the
/// sync's own git activity does not re-trigger it.
///
/// Events are sent to the returned receiver until the watcher is dropped.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl VaultWatcher {
    /// Start watching `root` recursively.
    pub fn start(root: &Path) -> Result<(Self, mpsc::Receiver<FileEvent>)> {
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to canonicalize watch root: {}", root.display()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let root_for_filter = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for file_event in translate_event(&event, &root_for_filter) {
                        if tx.blocking_send(file_event).is_err() {
                            debug!("event channel closed, stopping event dispatch");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "file watcher error");
                }
            }
        })
        .context("failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch directory: {}", root.display()))?;

        debug!(path = %root.display(), "vault watcher started");

        Ok((Self { _watcher: watcher, root }, rx))
    }

    /// The canonicalized root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Returns true if any component of `path` below `root` is `.git`.
fn is_git_internal(path: &Path, root: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}

fn is_inside_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Translate a `notify::Event` into zero or more `FileEvent`s.
fn translate_event(event: &Event, root: &Path) -> Vec<FileEvent> {
    use notify::event::ModifyKind;

    let kind = match &event.kind {
        EventKind::Create(_) => FileEventKind::Create,
        EventKind::Modify(ModifyKind::Name(_)) => FileEventKind::Rename,
        EventKind::Modify(ModifyKind::Metadata(_)) => {
            trace!("skipping metadata-only modify event");
            return Vec::new();
        }
        EventKind::Modify(_) => FileEventKind::Modify,
        EventKind::Remove(_) => FileEventKind::Delete,
        _ => {
            trace!(kind = ?event.kind, "skipping non-content event");
            return Vec::new();
        }
    };

    event
        .paths
        .iter()
        .filter(|p| {
            if is_inside_root(p, root) {
                true
            } else {
                warn!(path = %p.display(), "ignoring event outside watch root");
                false
            }
        })
        .filter(|p| !is_git_internal(p, root))
        .map(|p| FileEvent { kind, path: p.clone() })
        .collect()
}
