// Git sync plumbing: shell command runner and pull/push composition.

pub mod ops;
pub mod runner;

pub use ops::{GitError, GitOps, Platform, PushOutcome, SyncOptions};
pub use runner::{CommandRunner, RunnerError, ShellCommandRunner};
