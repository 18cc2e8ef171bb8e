// CLI subcommand dispatch.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use vaultsync_daemon::config::{resolve_config_path, SyncConfig};
use vaultsync_daemon::repo_select::{LocalFs, RepositoryList};

use crate::exit_code::{CliError, ExitCode};
use crate::output::OutputFormat;

pub mod config;
pub mod pull;
pub mod push;
pub mod repo;
pub mod run;
pub mod sync;

#[derive(Subcommand)]
pub enum Command {
    /// Run one pull + push cycle now
    Sync(sync::SyncArgs),
    /// Pull from the remote into the active repository
    Pull(pull::PullArgs),
    /// Commit all changes and push them to the remote
    Push(push::PushArgs),
    /// List candidate repositories and the active one
    Repo(repo::RepoArgs),
    /// Show or create the config file
    Config(config::ConfigArgs),
    /// Run the sync daemon in the foreground
    Run(run::RunArgs),
}

impl Command {
    /// `run` logs lifecycle events; one-shot commands stay quiet.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Command::Run(_) => "info",
            _ => "warn",
        }
    }
}

pub fn run(
    command: Command,
    config_path: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Sync(args) => sync::run(args, &CliContext::load(config_path)?, format),
        Command::Pull(args) => pull::run(args, &CliContext::load(config_path)?, format),
        Command::Push(args) => push::run(args, &CliContext::load(config_path)?, format),
        Command::Repo(args) => repo::run(args, &CliContext::load(config_path)?, format),
        Command::Config(args) => config::run(args, &CliContext::load(config_path)?, format),
        Command::Run(args) => run::run(args, config_path),
    }
}

/// Resolved config file location plus its effective contents.
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: SyncConfig,
}

impl CliContext {
    pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(explicit.as_deref())
            .context("could not determine config path (no home directory?)")?;
        let config = SyncConfig::load_or_default(&config_path);
        Ok(Self { config_path, config })
    }

    /// First configured candidate that is a git repository.
    pub fn active_repository(&self) -> anyhow::Result<PathBuf> {
        RepositoryList::parse(&self.config.repositories).select_active(&LocalFs).ok_or_else(|| {
            CliError::NotConfigured { repositories: self.config.repositories.clone() }.into()
        })
    }
}

/// Run an async operation on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    Ok(runtime.block_on(future))
}
