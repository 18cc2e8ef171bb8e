// `vaultsync pull`: pull the configured branch into the active repository.

use clap::Args;
use serde::Serialize;
use vaultsync_daemon::git::{GitOps, ShellCommandRunner, SyncOptions};

use super::{block_on, CliContext};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct PullArgs {}

#[derive(Debug, Clone, Serialize)]
pub struct PullResult {
    pub repository: String,
    pub remote: String,
    pub branch: String,
    pub output: String,
}

pub fn run(_args: PullArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let repository = ctx.active_repository()?;
    let options = SyncOptions::from_config(&ctx.config.git, repository.clone());

    let git = GitOps::new(ShellCommandRunner);
    let output = block_on(git.pull(&options))??;

    let result = PullResult {
        repository: repository.display().to_string(),
        remote: options.remote,
        branch: options.branch,
        output: output.trim().to_string(),
    };
    output::print_output(format, &result, format_human)?;
    Ok(ExitCode::Success)
}

fn format_human(result: &PullResult) -> String {
    let mut text = format!("Pulled {}/{} into {}", result.remote, result.branch, result.repository);
    if !result.output.is_empty() {
        text.push('\n');
        text.push_str(&result.output);
    }
    text
}
