// vaultsync-daemon library entry point (also used by the `vaultsync` CLI).

pub mod config;
pub mod git;
pub mod repo_select;
pub mod runtime;
pub mod sync;
pub mod watcher;
