// `vaultsync config`: inspect or create the config file.

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use vaultsync_daemon::config::SyncConfig;

use super::CliContext;
use crate::exit_code::{CliError, ExitCode};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub path: String,
    pub exists: bool,
    pub config: SyncConfig,
}

pub fn run(args: ConfigArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    match args.action {
        ConfigAction::Show => show(ctx, format),
        ConfigAction::Init { force } => init(ctx, force, format),
    }
}

fn show(ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let view = ConfigView {
        path: ctx.config_path.display().to_string(),
        exists: ctx.config_path.exists(),
        config: ctx.config.clone(),
    };
    let rendered = toml::to_string_pretty(&view.config).context("failed to render config")?;
    output::print_output(format, &view, |view| {
        let origin = if view.exists { "" } else { " (not found, showing defaults)" };
        format!("# {}{origin}\n{}", view.path, rendered.trim_end())
    })?;
    Ok(ExitCode::Success)
}

fn init(ctx: &CliContext, force: bool, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.display().to_string()).into());
    }
    let config = SyncConfig::default();
    config.save_to(path).with_context(|| format!("failed to write {}", path.display()))?;

    let view = ConfigView { path: path.display().to_string(), exists: true, config };
    output::print_output(format, &view, |view| format!("Wrote default config to {}", view.path))?;
    Ok(ExitCode::Success)
}
