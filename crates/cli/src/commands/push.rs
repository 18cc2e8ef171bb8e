// `vaultsync push`: commit everything in the active repository and push.

use clap::Args;
use serde::Serialize;
use vaultsync_daemon::git::{GitOps, PushOutcome, ShellCommandRunner, SyncOptions};

use super::{block_on, CliContext};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Commit message (defaults to the configured message).
    #[arg(long, short)]
    message: Option<String>,

    /// Push without `--force`.
    #[arg(long)]
    no_force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushResult {
    pub repository: String,
    pub pushed: bool,
    pub forced: bool,
    pub commit_message: String,
    pub output: String,
}

pub fn run(args: PushArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let repository = ctx.active_repository()?;
    let options = apply_overrides(SyncOptions::from_config(&ctx.config.git, repository.clone()), &args);

    let git = GitOps::new(ShellCommandRunner);
    let outcome = block_on(git.push(&options))??;

    let (pushed, output) = match outcome {
        PushOutcome::Pushed { output } => (true, output.trim().to_string()),
        PushOutcome::NothingToSync => (false, String::new()),
    };
    let result = PushResult {
        repository: repository.display().to_string(),
        pushed,
        forced: options.force,
        commit_message: options.commit_message,
        output,
    };
    output::print_output(format, &result, format_human)?;
    Ok(ExitCode::Success)
}

fn apply_overrides(mut options: SyncOptions, args: &PushArgs) -> SyncOptions {
    if let Some(message) = &args.message {
        options = options.with_commit_message(message.clone());
    }
    if args.no_force {
        options = options.with_force(false);
    }
    options
}

fn format_human(result: &PushResult) -> String {
    if !result.pushed {
        return format!("Nothing to sync in {}", result.repository);
    }
    let mut text = format!("Pushed {} (\"{}\")", result.repository, result.commit_message);
    if result.forced {
        text.push_str(" with --force");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base() -> SyncOptions {
        SyncOptions::default().with_root("/vault")
    }

    #[test]
    fn overrides_message_and_force() {
        let args = PushArgs { message: Some("notes: daily".into()), no_force: true };
        let options = apply_overrides(base(), &args);
        assert_eq!(options.commit_message, "notes: daily");
        assert!(!options.force);
        assert_eq!(options.root_path, Some(PathBuf::from("/vault")));
    }

    #[test]
    fn no_overrides_keeps_config() {
        let args = PushArgs { message: None, no_force: false };
        let options = apply_overrides(base(), &args);
        assert_eq!(options.commit_message, "fix: auto sync");
        assert!(options.force);
    }

    #[test]
    fn human_output_for_clean_tree() {
        let result = PushResult {
            repository: "/vault".into(),
            pushed: false,
            forced: true,
            commit_message: "fix: auto sync".into(),
            output: String::new(),
        };
        assert_eq!(format_human(&result), "Nothing to sync in /vault");
    }
}
