// `vaultsync repo`: show which configured candidate is the active repository.

use clap::Args;
use serde::Serialize;
use vaultsync_daemon::repo_select::{LocalFs, PathCheck, RepositoryList};

use super::CliContext;
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RepoArgs {}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepoReport {
    pub candidates: Vec<Candidate>,
    pub active: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub is_git_repository: bool,
}

pub fn run(_args: RepoArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let report = build_report(&ctx.config.repositories, &LocalFs);
    output::print_output(format, &report, format_human)?;
    Ok(if report.active.is_some() { ExitCode::Success } else { ExitCode::NotConfigured })
}

fn build_report(raw: &str, paths: &dyn PathCheck) -> RepoReport {
    let list = RepositoryList::parse(raw);
    let candidates: Vec<Candidate> = list
        .inspect(paths)
        .into_iter()
        .map(|(path, qualifies)| Candidate {
            path: path.display().to_string(),
            is_git_repository: qualifies,
        })
        .collect();
    let active = candidates.iter().find(|c| c.is_git_repository).map(|c| c.path.clone());
    RepoReport { candidates, active }
}

fn format_human(report: &RepoReport) -> String {
    if report.candidates.is_empty() {
        return "No repositories configured (set `repositories` in the config file)".to_string();
    }
    let mut lines = Vec::with_capacity(report.candidates.len() + 1);
    for candidate in &report.candidates {
        let marker = if Some(&candidate.path) == report.active.as_ref() {
            "*"
        } else if candidate.is_git_repository {
            "+"
        } else {
            "-"
        };
        lines.push(format!("{marker} {}", candidate.path));
    }
    match &report.active {
        Some(active) => lines.push(format!("active: {active}")),
        None => lines.push("active: none (no candidate contains .git)".to_string()),
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    struct FakeFs(HashSet<PathBuf>);

    impl PathCheck for FakeFs {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    #[test]
    fn first_git_candidate_is_active() {
        let fs = FakeFs(HashSet::from([PathBuf::from("/b/.git"), PathBuf::from("/c/.git")]));
        let report = build_report(" /a ; /b;/c;", &fs);
        assert_eq!(report.candidates.len(), 3);
        assert!(!report.candidates[0].is_git_repository);
        assert_eq!(report.active.as_deref(), Some("/b"));
        assert_eq!(format_human(&report), "- /a\n* /b\n+ /c\nactive: /b");
    }

    #[test]
    fn empty_list_has_no_active() {
        let report = build_report("", &FakeFs(HashSet::new()));
        assert!(report.candidates.is_empty());
        assert!(report.active.is_none());
        assert!(format_human(&report).starts_with("No repositories configured"));
    }
}
