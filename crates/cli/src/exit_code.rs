// Consistent exit codes for the vaultsync CLI.
//
//   0  = success (including "nothing to sync")
//   1  = general error
//   2  = usage/argument error
//   10 = no active repository configured
//   11 = git pull or push failed

use vaultsync_daemon::git::GitError;
use vaultsync_daemon::config::ConfigError;
use vaultsync_daemon::sync::SkipReason;

/// Failures the CLI reports with a dedicated exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("sync not configured: no git repository found in \"{repositories}\"")]
    NotConfigured { repositories: String },
    #[error("config file already exists: {0} (use --force to overwrite)")]
    ConfigExists(String),
    #[error("sync skipped: {0}")]
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotConfigured = 10,
    GitFailed = 11,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Machine-readable label used in JSON error output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Error => "ERROR",
            Self::Usage => "USAGE",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::GitFailed => "GIT_FAILED",
        }
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(cli_err) = cause.downcast_ref::<CliError>() {
                return match cli_err {
                    CliError::NotConfigured { .. } => Self::NotConfigured,
                    CliError::ConfigExists(_) => Self::Usage,
                    CliError::Skipped(_) => Self::Error,
                };
            }
            if cause.downcast_ref::<GitError>().is_some() {
                return Self::GitFailed;
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Usage;
            }
        }
        Self::Error
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}
