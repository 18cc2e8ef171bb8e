// Daemon event loop: wires the timer, vault watcher, reload and shutdown
// signals into the sync scheduler's entry points.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::{resolve_config_path, SyncConfig};
use crate::git::{CommandRunner, GitOps, ShellCommandRunner};
use crate::repo_select::LocalFs;
use crate::sync::{StatusBoard, SyncScheduler, Trigger};
use crate::watcher::debounce::{DebounceConfig, Debouncer};
use crate::watcher::{FileEvent, FileEventKind, VaultWatcher};

/// Build the production scheduler: shell runner, local filesystem check,
/// watch-channel status board.
pub fn build_scheduler(config: SyncConfig) -> (SyncScheduler<ShellCommandRunner>, StatusBoard) {
    let board = StatusBoard::new();
    let scheduler = SyncScheduler::new(
        GitOps::new(ShellCommandRunner),
        config,
        Arc::new(LocalFs),
        Arc::new(board.clone()),
    );
    (scheduler, board)
}

/// Run the daemon in the foreground until Ctrl-C.
pub async fn run_standalone(config_path: Option<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config_path.as_deref())
        .context("could not determine config path (no home directory?)")?;
    let config = SyncConfig::load_or_default(&config_path);
    info!(config_path = %config_path.display(), "loaded config");

    let (scheduler, _board) = build_scheduler(config);

    let (reload_tx, reload_rx) = mpsc::channel(4);
    forward_reload_signal(reload_tx)?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    run_event_loop(scheduler, Some(config_path), reload_rx, shutdown).await
}

#[cfg(unix)]
fn forward_reload_signal(tx: mpsc::Sender<()>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn forward_reload_signal(_tx: mpsc::Sender<()>) -> Result<()> {
    Ok(())
}

/// Drive `scheduler` until `shutdown` resolves.
///
/// Startup, timer and file-event cycles run as independent tasks and may
/// overlap. Every message on `reload` re-reads `config_path` and re-selects
/// the active repository. On shutdown the loop waits for in-flight cycles,
/// then runs a final shutdown cycle.
pub async fn run_event_loop<R, F>(
    scheduler: SyncScheduler<R>,
    config_path: Option<PathBuf>,
    mut reload: mpsc::Receiver<()>,
    shutdown: F,
) -> Result<()>
where
    R: CommandRunner,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let config = scheduler.config();
    let mut period = config.tick_interval();
    let mut ticker = new_ticker(period);
    let mut debouncer = Debouncer::new(DebounceConfig::from(&config.debounce));
    let mut watched = scheduler.active_repository();
    let (mut _watcher, mut events) = start_watcher(watched.as_deref());
    let mut reload_open = true;
    let mut cycles = JoinSet::new();

    spawn_cycle(&mut cycles, &scheduler, Trigger::Startup);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                spawn_cycle(&mut cycles, &scheduler, Trigger::Timer);
            }
            event = next_file_event(&mut events) => match event {
                Some(event) => {
                    trace!(kind = ?event.kind, path = %event.path.display(), "file event");
                    debouncer.push(event);
                }
                None => {
                    warn!("vault watcher stopped delivering events");
                    events = None;
                }
            },
            _ = wait_for(deadline) => {
                let ready = debouncer.drain_ready();
                if let Some(kind) = FileEventKind::strongest(ready.iter().map(|e| e.kind)) {
                    debug!(count = ready.len(), ?kind, "file changes settled");
                    spawn_cycle(&mut cycles, &scheduler, Trigger::from(kind));
                }
            }
            Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(error) = joined {
                    warn!(%error, "sync cycle task failed");
                }
            }
            message = reload.recv(), if reload_open => {
                if message.is_none() {
                    reload_open = false;
                    continue;
                }
                let Some(path) = config_path.as_deref() else {
                    warn!("reload requested but no config file is in use");
                    continue;
                };
                let Some(config) = reload_config(path) else { continue };

                let new_period = config.tick_interval();
                debouncer.set_config(DebounceConfig::from(&config.debounce));
                scheduler.update_config(config);
                // A candidate may have gained its `.git` since the last selection.
                let active = scheduler.refresh_repository();

                if new_period != period {
                    info!(?new_period, "sync interval changed");
                    period = new_period;
                    ticker = new_ticker(period);
                }
                if active != watched {
                    watched = active;
                    (_watcher, events) = start_watcher(watched.as_deref());
                }
            }
        }
    }

    while let Some(joined) = cycles.join_next().await {
        if let Err(error) = joined {
            warn!(%error, "sync cycle task failed");
        }
    }

    let outcome = scheduler.on_shutdown().await;
    info!(ran = outcome.ran(), "final sync finished");
    Ok(())
}

fn spawn_cycle<R: CommandRunner>(
    cycles: &mut JoinSet<()>,
    scheduler: &SyncScheduler<R>,
    trigger: Trigger,
) {
    let scheduler = scheduler.clone();
    cycles.spawn(async move {
        scheduler.handle(trigger).await;
    });
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn start_watcher(
    repository: Option<&Path>,
) -> (Option<VaultWatcher>, Option<mpsc::Receiver<FileEvent>>) {
    let Some(repository) = repository else {
        return (None, None);
    };
    match VaultWatcher::start(repository) {
        Ok((watcher, rx)) => {
            info!(path = %watcher.root().display(), "watching vault");
            (Some(watcher), Some(rx))
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "vault watcher unavailable, timer sync only");
            (None, None)
        }
    }
}

fn reload_config(path: &Path) -> Option<SyncConfig> {
    match SyncConfig::load_from(path) {
        Ok(config) => {
            info!(path = %path.display(), "config reloaded");
            Some(config)
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "config reload failed, keeping previous config");
            None
        }
    }
}

async fn next_file_event(events: &mut Option<mpsc::Receiver<FileEvent>>) -> Option<FileEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
