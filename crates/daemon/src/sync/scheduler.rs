// Sync scheduler: decides when to pull and push, and reports the outcome.
//
// The host wires its own event sources into the entry points below
// (`on_start`, `on_file_event`, `on_timer_tick`, `trigger_manual`,
// `on_shutdown`). Each entry point either skips (debounce, auto-sync off),
// aborts (no active repository) or runs a full pull + push cycle.
//
// State is behind a std mutex that is never held across an await. Two
// cycles may therefore overlap (e.g. a manual sync while a timer cycle is
// still pushing). They do not coordinate: each records its own pull/push
// settle time, and whichever settles last wins.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::progress::ProgressTracker;
use super::status::{format_timestamp, StatusSurface, SyncStatus};
use super::trigger::{PushDebounce, Trigger};
use crate::config::SyncConfig;
use crate::git::ops::{GitError, GitOps, PushOutcome, SyncOptions};
use crate::git::runner::CommandRunner;
use crate::repo_select::{PathCheck, RepositoryList};
use crate::watcher::FileEventKind;

/// Why a trigger did not start a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AutoSyncDisabled,
    Debounced,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AutoSyncDisabled => write!(f, "auto sync is disabled"),
            SkipReason::Debounced => write!(f, "last push is too recent"),
        }
    }
}

/// Pull and push results of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub trigger: Trigger,
    pub generation: u64,
    pub repository: PathBuf,
    pub pull: Result<String, GitError>,
    pub push: Result<PushOutcome, GitError>,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    NotConfigured,
    Completed(Box<CycleReport>),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn ran(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

/// Point-in-time view of the scheduler's mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub last_pull: Option<Instant>,
    pub last_push: Option<Instant>,
    /// Generation currently owning the in-progress indicator.
    pub in_progress: Option<u64>,
    pub last_status: Option<SyncStatus>,
}

struct SchedulerState {
    config: SyncConfig,
    active_repository: Option<PathBuf>,
    last_pull: Option<Instant>,
    last_push: Option<Instant>,
    last_status: Option<SyncStatus>,
}

struct Inner<R> {
    git: GitOps<R>,
    paths: Arc<dyn PathCheck>,
    status: Arc<dyn StatusSurface>,
    progress: ProgressTracker,
    state: Mutex<SchedulerState>,
}

/// Cloneable handle to the scheduler; clones share state.
pub struct SyncScheduler<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for SyncScheduler<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R: CommandRunner> SyncScheduler<R> {
    pub fn new(
        git: GitOps<R>,
        config: SyncConfig,
        paths: Arc<dyn PathCheck>,
        status: Arc<dyn StatusSurface>,
    ) -> Self {
        let active_repository = RepositoryList::parse(&config.repositories).select_active(&*paths);
        let state = SchedulerState {
            config,
            active_repository,
            last_pull: None,
            last_push: None,
            last_status: None,
        };
        Self {
            inner: Arc::new(Inner {
                git,
                paths,
                status,
                progress: ProgressTracker::new(),
                state: Mutex::new(state),
            }),
        }
    }

    // ── Host entry points ───────────────────────────────────────────

    pub async fn on_start(&self) -> CycleOutcome {
        self.handle(Trigger::Startup).await
    }

    pub async fn on_file_event(&self, kind: FileEventKind) -> CycleOutcome {
        self.handle(Trigger::from(kind)).await
    }

    pub async fn on_timer_tick(&self) -> CycleOutcome {
        self.handle(Trigger::Timer).await
    }

    pub async fn trigger_manual(&self) -> CycleOutcome {
        self.handle(Trigger::Manual).await
    }

    pub async fn on_shutdown(&self) -> CycleOutcome {
        self.handle(Trigger::Shutdown).await
    }

    /// Replace the configuration. The active repository is re-selected when
    /// the repository list changed. Returns the active repository.
    pub fn update_config(&self, config: SyncConfig) -> Option<PathBuf> {
        let mut state = self.lock();
        if state.config.repositories != config.repositories {
            state.active_repository =
                RepositoryList::parse(&config.repositories).select_active(&*self.inner.paths);
            info!(
                repository = ?state.active_repository,
                "repository list changed, re-selected active repository"
            );
        }
        state.config = config;
        state.active_repository.clone()
    }

    /// Re-run repository selection against the current list.
    pub fn refresh_repository(&self) -> Option<PathBuf> {
        let mut state = self.lock();
        state.active_repository =
            RepositoryList::parse(&state.config.repositories).select_active(&*self.inner.paths);
        state.active_repository.clone()
    }

    pub fn active_repository(&self) -> Option<PathBuf> {
        self.lock().active_repository.clone()
    }

    pub fn config(&self) -> SyncConfig {
        self.lock().config.clone()
    }

    pub fn state(&self) -> SyncState {
        let state = self.lock();
        SyncState {
            last_pull: state.last_pull,
            last_push: state.last_push,
            in_progress: self.inner.progress.current(),
            last_status: state.last_status.clone(),
        }
    }

    // ── Cycle ───────────────────────────────────────────────────────

    /// Gate `trigger` and, if allowed, run a pull + push cycle.
    pub async fn handle(&self, trigger: Trigger) -> CycleOutcome {
        let (config, repository, last_push) = {
            let state = self.lock();
            (state.config.clone(), state.active_repository.clone(), state.last_push)
        };

        if trigger.is_automatic() && !config.auto_sync_enabled {
            debug!(trigger = trigger.kind(), "auto sync disabled, skipping");
            return CycleOutcome::Skipped(SkipReason::AutoSyncDisabled);
        }

        let gate = PushDebounce::from(&config.debounce);
        if !gate.allows(trigger, last_push, Instant::now()) {
            debug!(trigger = trigger.kind(), "last push too recent, skipping");
            return CycleOutcome::Skipped(SkipReason::Debounced);
        }

        let Some(repository) = repository else {
            self.inner.status.notice(&format!(
                "Sync not configured: no git repository found in \"{}\"",
                config.repositories
            ));
            self.inner.status.publish(&SyncStatus::NotConfigured);
            return CycleOutcome::NotConfigured;
        };

        self.run_cycle(trigger, repository, &config).await
    }

    async fn run_cycle(
        &self,
        trigger: Trigger,
        repository: PathBuf,
        config: &SyncConfig,
    ) -> CycleOutcome {
        let generation = self.inner.progress.begin();
        self.inner.status.set_busy(true);
        self.inner.status.publish(&SyncStatus::InProgress);
        info!(
            trigger = trigger.kind(),
            generation,
            repository = %repository.display(),
            "sync cycle started"
        );

        let options = SyncOptions::from_config(&config.git, repository.clone());

        let pull = self.inner.git.pull(&options).await;
        self.lock().last_pull = Some(Instant::now());
        if let Err(error) = &pull {
            warn!(generation, %error, "git pull failed");
        }

        let push = self.inner.git.push(&options).await;
        self.lock().last_push = Some(Instant::now());
        match &push {
            Ok(PushOutcome::NothingToSync) => debug!(generation, "nothing to sync"),
            Ok(PushOutcome::Pushed { .. }) => {}
            Err(error) => warn!(generation, %error, "git push failed"),
        }

        let at = format_timestamp(&Local::now(), &config.time_format);
        let status = summarize(&pull, &push, at);
        self.inner.status.publish(&status);
        self.lock().last_status = Some(status.clone());
        info!(generation, status = %status, "sync cycle finished");

        self.clear_progress_after(generation, config.debounce.progress_grace());

        CycleOutcome::Completed(Box::new(CycleReport {
            trigger,
            generation,
            repository,
            pull,
            push,
            status,
        }))
    }

    /// Drop the busy indicator after `grace`, unless a newer cycle owns it.
    fn clear_progress_after(&self, generation: u64, grace: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if inner.progress.finish(generation) {
                inner.status.set_busy(false);
            } else {
                debug!(generation, "progress indicator owned by a newer cycle");
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn summarize(
    pull: &Result<String, GitError>,
    push: &Result<PushOutcome, GitError>,
    at: String,
) -> SyncStatus {
    match (pull, push) {
        (Err(_), _) => SyncStatus::PullFailed { at },
        (_, Err(_)) => SyncStatus::PushFailed { at },
        (_, Ok(PushOutcome::NothingToSync)) => SyncStatus::NothingToSync { at },
        (_, Ok(PushOutcome::Pushed { .. })) => SyncStatus::Succeeded { at },
    }
}
