// `vaultsync sync`: run one manual pull + push cycle.

use clap::Args;
use serde::Serialize;
use vaultsync_daemon::git::PushOutcome;
use vaultsync_daemon::runtime::build_scheduler;
use vaultsync_daemon::sync::{CycleOutcome, CycleReport, SyncStatus};

use super::{block_on, CliContext};
use crate::exit_code::{CliError, ExitCode};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncArgs {}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncResult {
    pub status: String,
    pub repository: String,
    pub pull: StepResult,
    pub push: StepResult,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    Ok { output: String },
    NothingToSync,
    Failed { error: String },
}

pub fn run(_args: SyncArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let (scheduler, _board) = build_scheduler(ctx.config.clone());
    let outcome = block_on(scheduler.trigger_manual())?;
    let report = completed_report(outcome, &ctx.config.repositories)?;

    let result = SyncResult {
        status: report.status.to_string(),
        repository: report.repository.display().to_string(),
        pull: match &report.pull {
            Ok(output) => StepResult::Ok { output: output.trim().to_string() },
            Err(error) => StepResult::Failed { error: error.to_string() },
        },
        push: match &report.push {
            Ok(PushOutcome::Pushed { output }) => StepResult::Ok { output: output.trim().to_string() },
            Ok(PushOutcome::NothingToSync) => StepResult::NothingToSync,
            Err(error) => StepResult::Failed { error: error.to_string() },
        },
    };
    output::print_output(format, &result, format_human)?;

    Ok(exit_code_for(&report.status))
}

fn completed_report(outcome: CycleOutcome, repositories: &str) -> anyhow::Result<Box<CycleReport>> {
    match outcome {
        CycleOutcome::Completed(report) => Ok(report),
        CycleOutcome::NotConfigured => {
            Err(CliError::NotConfigured { repositories: repositories.to_string() }.into())
        }
        CycleOutcome::Skipped(reason) => Err(CliError::Skipped(reason).into()),
    }
}

fn exit_code_for(status: &SyncStatus) -> ExitCode {
    if status.is_failure() {
        ExitCode::GitFailed
    } else {
        ExitCode::Success
    }
}

fn format_human(result: &SyncResult) -> String {
    let mut lines = vec![result.status.clone(), format!("  repository: {}", result.repository)];
    lines.push(format!("  pull: {}", describe(&result.pull)));
    lines.push(format!("  push: {}", describe(&result.push)));
    lines.join("\n")
}

fn describe(step: &StepResult) -> String {
    match step {
        StepResult::Ok { output } if output.is_empty() => "ok".to_string(),
        StepResult::Ok { output } => {
            format!("ok ({})", output.lines().last().unwrap_or_default())
        }
        StepResult::NothingToSync => "nothing to sync".to_string(),
        StepResult::Failed { error } => format!("failed: {error}"),
    }
}
