// Git pull/push command composition.
//
// All shell strings for git are built here so platform differences (drive
// switching on Windows, quoting) are handled in one place.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::runner::{CommandRunner, RunnerError};
use crate::config::GitConfig;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_COMMIT_MESSAGE: &str = "fix: auto sync";

/// Exit status of `git diff --cached --quiet` when the index differs from HEAD.
const STAGED_CHANGES_EXIT: i32 = 1;

/// Shell family the composed command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Options for a single pull or push invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Working directory override; commands are prefixed with a `cd` into it.
    pub root_path: Option<PathBuf>,
    pub remote: String,
    pub branch: String,
    /// Append `--force` to `git push`.
    pub force: bool,
    pub commit_message: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            root_path: None,
            remote: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            force: true,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl SyncOptions {
    /// Options for the active repository, taking remote/branch/force/message
    /// from the git section of the configuration.
    pub fn from_config(git: &GitConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: Some(root.into()),
            remote: git.remote.clone(),
            branch: git.branch.clone(),
            force: git.force,
            commit_message: git.commit_message.clone(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = Some(root.into());
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }
}

/// Compose `git pull {remote} {branch}` with the directory prefix.
pub fn pull_command(options: &SyncOptions, platform: Platform) -> String {
    format!("{}git pull {} {}", cd_prefix(options, platform), options.remote, options.branch)
}

/// Compose `git add . && git diff --cached --quiet`: exits 0 when staging
/// everything leaves nothing to commit, 1 when there are staged changes.
pub fn stage_check_command(options: &SyncOptions, platform: Platform) -> String {
    format!("{}git add . && git diff --cached --quiet", cd_prefix(options, platform))
}

/// Compose `git add . && git commit -m "..." && git push {remote} {branch}`.
/// `--force` is always the final flag when requested.
pub fn push_command(options: &SyncOptions, platform: Platform) -> String {
    let mut command = format!(
        "{}git add . && git commit -m \"{}\" && git push {} {}",
        cd_prefix(options, platform),
        escape_double_quoted(&options.commit_message, platform),
        options.remote,
        options.branch,
    );
    if options.force {
        command.push_str(" --force");
    }
    command
}

fn cd_prefix(options: &SyncOptions, platform: Platform) -> String {
    match &options.root_path {
        None => String::new(),
        Some(root) => {
            let root = root.display();
            match platform {
                Platform::Windows => format!("cd /d \"{root}\" && "),
                Platform::Posix => format!("cd \"{root}\" && "),
            }
        }
    }
}

fn escape_double_quoted(text: &str, platform: Platform) -> String {
    match platform {
        // cmd.exe has no escape inside quotes; a stray quote would end the argument.
        Platform::Windows => text.replace('"', "'"),
        Platform::Posix => {
            let mut escaped = String::with_capacity(text.len());
            for ch in text.chars() {
                if matches!(ch, '"' | '\\' | '$' | '`') {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
            escaped
        }
    }
}

/// Result of a push attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// add, commit and push all succeeded.
    Pushed { output: String },
    /// Staging left the index identical to HEAD; no commit was attempted.
    NothingToSync,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitError {
    #[error(transparent)]
    Command(#[from] RunnerError),
}

/// Runs composed git commands through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct GitOps<R> {
    runner: R,
    platform: Platform,
}

impl<R: CommandRunner> GitOps<R> {
    pub fn new(runner: R) -> Self {
        Self { runner, platform: Platform::current() }
    }

    pub fn with_platform(runner: R, platform: Platform) -> Self {
        Self { runner, platform }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn pull(&self, options: &SyncOptions) -> Result<String, GitError> {
        let command = pull_command(options, self.platform);
        info!(command = %command, "running git pull");
        let output = self.runner.run(&command, &working_dir(options)).await?;
        Ok(output)
    }

    /// Stage everything, then commit and push only if the index has changes.
    /// Any failure of the commit/push chain is an error.
    pub async fn push(&self, options: &SyncOptions) -> Result<PushOutcome, GitError> {
        let cwd = working_dir(options);

        let check = stage_check_command(options, self.platform);
        match self.runner.run(&check, &cwd).await {
            Ok(_) => {
                debug!("nothing staged, skipping commit and push");
                return Ok(PushOutcome::NothingToSync);
            }
            Err(error) if has_staged_changes(&error) => {}
            Err(error) => return Err(error.into()),
        }

        let command = push_command(options, self.platform);
        info!(command = %command, "running git push");
        let output = self.runner.run(&command, &cwd).await?;
        Ok(PushOutcome::Pushed { output })
    }
}

fn working_dir(options: &SyncOptions) -> PathBuf {
    match &options.root_path {
        Some(root) => root.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf()),
    }
}

fn has_staged_changes(error: &RunnerError) -> bool {
    matches!(error, RunnerError::Exit { code: Some(STAGED_CHANGES_EXIT), .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Invocation {
        command: String,
        cwd: PathBuf,
    }

    #[derive(Clone)]
    struct MockRunner {
        calls: Arc<Mutex<Vec<Invocation>>>,
        responses: Arc<Mutex<VecDeque<Result<String, RunnerError>>>>,
    }

    impl MockRunner {
        fn new(responses: Vec<Result<String, RunnerError>>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            }
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().expect("mock calls lock poisoned").clone()
        }
    }

    impl CommandRunner for MockRunner {
        async fn run(&self, command: &str, cwd: &Path) -> Result<String, RunnerError> {
            self.calls
                .lock()
                .expect("mock calls lock poisoned")
                .push(Invocation { command: command.to_string(), cwd: cwd.to_path_buf() });
            self.responses
                .lock()
                .expect("mock responses lock poisoned")
                .pop_front()
                .expect("missing mock response")
        }
    }

    fn exit_error(command: &str, stdout: &str, stderr: &str) -> RunnerError {
        RunnerError::Exit {
            command: command.to_string(),
            code: Some(1),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.root_path, None);
        assert_eq!(options.remote, "origin");
        assert_eq!(options.branch, "master");
        assert!(options.force);
        assert_eq!(options.commit_message, "fix: auto sync");
    }

    #[test]
    fn overrides_merge_with_defaults() {
        let options = SyncOptions::default().with_branch("main").with_force(false);
        assert_eq!(options.remote, "origin");
        assert_eq!(options.branch, "main");
        assert!(!options.force);
    }

    #[test]
    fn pull_without_root_has_no_prefix() {
        let command = pull_command(&SyncOptions::default(), Platform::Posix);
        assert_eq!(command, "git pull origin master");
    }

    #[test]
    fn pull_with_root_changes_directory_first() {
        let options = SyncOptions::default().with_root("/home/me/notes");
        assert_eq!(
            pull_command(&options, Platform::Posix),
            "cd \"/home/me/notes\" && git pull origin master"
        );
    }

    #[test]
    fn windows_prefix_switches_drive() {
        let options = SyncOptions::default().with_root(r"D:\vault");
        assert_eq!(
            pull_command(&options, Platform::Windows),
            "cd /d \"D:\\vault\" && git pull origin master"
        );
    }

    #[test]
    fn push_composes_add_commit_push_with_force() {
        let options = SyncOptions::default().with_root("/v");
        assert_eq!(
            push_command(&options, Platform::Posix),
            "cd \"/v\" && git add . && git commit -m \"fix: auto sync\" && git push origin master --force"
        );
    }

    #[test]
    fn push_without_force_omits_flag() {
        let options = SyncOptions::default().with_force(false);
        let command = push_command(&options, Platform::Posix);
        assert!(command.ends_with("git push origin master"));
        assert!(!command.contains("--force"));
    }

    #[test]
    fn commit_message_is_escaped_for_posix() {
        let options = SyncOptions::default().with_commit_message("say \"hi\" $HOME `x`");
        let command = push_command(&options, Platform::Posix);
        assert!(command.contains(r#"git commit -m "say \"hi\" \$HOME \`x\`""#));
    }

    #[test]
    fn commit_message_quotes_are_neutralized_for_windows() {
        let options = SyncOptions::default().with_commit_message("say \"hi\"");
        let command = push_command(&options, Platform::Windows);
        assert!(command.contains("git commit -m \"say 'hi'\""));
    }

    proptest! {
        #[test]
        fn force_is_always_the_final_flag(
            remote in "[a-z]{1,10}",
            branch in "[a-z0-9/_-]{1,16}",
            message in "[ -~]{0,40}",
            windows in any::<bool>(),
        ) {
            let platform = if windows { Platform::Windows } else { Platform::Posix };
            let options = SyncOptions::default()
                .with_root("/vault")
                .with_remote(remote)
                .with_branch(branch)
                .with_commit_message(message)
                .with_force(true);
            let command = push_command(&options, platform);
            prop_assert!(command.ends_with(" --force"));
            prop_assert_eq!(command.matches("--force").count(), 1 + options.commit_message.matches("--force").count());
        }
    }

    #[tokio::test]
    async fn pull_runs_in_root_and_returns_output() {
        let mock = MockRunner::new(vec![Ok("Already up to date.\n".to_string())]);
        let git = GitOps::with_platform(mock.clone(), Platform::Posix);

        let out = git.pull(&SyncOptions::default().with_root("/vault")).await.unwrap();

        assert_eq!(out, "Already up to date.\n");
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "cd \"/vault\" && git pull origin master");
        assert_eq!(calls[0].cwd, PathBuf::from("/vault"));
    }

    #[tokio::test]
    async fn pull_failure_is_returned_unchanged() {
        let failure = exit_error("git pull", "", "fatal: couldn't find remote ref master\n");
        let mock = MockRunner::new(vec![Err(failure.clone())]);
        let git = GitOps::with_platform(mock, Platform::Posix);

        let error = git.pull(&SyncOptions::default().with_root("/vault")).await.unwrap_err();
        assert_eq!(error, GitError::Command(failure));
    }

    fn staged() -> RunnerError {
        exit_error("git diff --cached --quiet", "", "")
    }

    #[test]
    fn stage_check_stages_then_diffs_index() {
        let options = SyncOptions::default().with_root("/v");
        assert_eq!(
            stage_check_command(&options, Platform::Posix),
            "cd \"/v\" && git add . && git diff --cached --quiet"
        );
        assert_eq!(
            stage_check_command(&SyncOptions::default(), Platform::Windows),
            "git add . && git diff --cached --quiet"
        );
    }

    #[tokio::test]
    async fn push_success_reports_pushed() {
        let mock = MockRunner::new(vec![
            Err(staged()),
            Ok("[master abc123] fix: auto sync\n".to_string()),
        ]);
        let git = GitOps::with_platform(mock.clone(), Platform::Posix);

        let outcome = git.push(&SyncOptions::default().with_root("/vault")).await.unwrap();
        assert_eq!(
            outcome,
            PushOutcome::Pushed { output: "[master abc123] fix: auto sync\n".to_string() }
        );
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].command.ends_with("git add . && git diff --cached --quiet"));
        assert!(calls[1].command.ends_with("git push origin master --force"));
    }

    #[tokio::test]
    async fn clean_index_is_nothing_to_sync_without_committing() {
        let mock = MockRunner::new(vec![Ok(String::new())]);
        let git = GitOps::with_platform(mock.clone(), Platform::Posix);

        let outcome = git.push(&SyncOptions::default().with_root("/vault")).await.unwrap();
        assert_eq!(outcome, PushOutcome::NothingToSync);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn push_rejection_is_an_error() {
        let failure = exit_error("git push", "", "! [rejected] master -> master (fetch first)\n");
        let mock = MockRunner::new(vec![Err(staged()), Err(failure.clone())]);
        let git = GitOps::with_platform(mock, Platform::Posix);

        let error = git.push(&SyncOptions::default().with_root("/vault")).await.unwrap_err();
        assert_eq!(error, GitError::Command(failure));
    }

    #[tokio::test]
    async fn push_failure_after_commit_mentioning_clean_tree_is_an_error() {
        let failure = exit_error(
            "git push",
            "[master 1a2b3c4] nothing to commit\n create mode 100644 nothing to commit.md\n",
            "fatal: 'origin' does not appear to be a git repository\n",
        );
        let mock = MockRunner::new(vec![Err(staged()), Err(failure.clone())]);
        let git = GitOps::with_platform(mock, Platform::Posix);

        let options = SyncOptions::default().with_root("/vault").with_commit_message("nothing to commit");
        let error = git.push(&options).await.unwrap_err();
        assert_eq!(error, GitError::Command(failure));
    }

    #[tokio::test]
    async fn stage_check_failure_is_an_error() {
        let failure = RunnerError::Exit {
            command: "git add .".to_string(),
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: not a git repository\n".to_string(),
        };
        let mock = MockRunner::new(vec![Err(failure.clone())]);
        let git = GitOps::with_platform(mock.clone(), Platform::Posix);

        let error = git.push(&SyncOptions::default().with_root("/vault")).await.unwrap_err();
        assert_eq!(error, GitError::Command(failure));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error() {
        let failure = RunnerError::Spawn {
            command: "git".to_string(),
            message: "No such file or directory".to_string(),
        };
        let mock = MockRunner::new(vec![Err(failure.clone())]);
        let git = GitOps::with_platform(mock, Platform::Posix);

        let error = git.push(&SyncOptions::default().with_root("/vault")).await.unwrap_err();
        assert_eq!(error, GitError::Command(failure));
    }

    #[test]
    fn from_config_uses_git_section() {
        let git = GitConfig {
            remote: "upstream".into(),
            branch: "notes".into(),
            force: false,
            commit_message: "vault backup".into(),
        };
        let options = SyncOptions::from_config(&git, "/vault");
        assert_eq!(options.root_path, Some(PathBuf::from("/vault")));
        assert_eq!(options.remote, "upstream");
        assert_eq!(options.branch, "notes");
        assert!(!options.force);
        assert_eq!(options.commit_message, "vault backup");
    }
}
