// `vaultsync run`: run the sync daemon in the foreground.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::block_on;
use crate::exit_code::ExitCode;

#[derive(Debug, Args)]
pub struct RunArgs {}

pub fn run(_args: RunArgs, config_path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    tracing::info!("starting vaultsync daemon in the foreground");
    block_on(vaultsync_daemon::runtime::run_standalone(config_path))?
        .context("daemon terminated unexpectedly")?;
    Ok(ExitCode::Success)
}
