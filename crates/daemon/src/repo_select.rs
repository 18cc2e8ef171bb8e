// Active repository selection from a `;`-separated candidate list.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Separator between candidate directories in the configured list.
pub const REPOSITORY_SEPARATOR: char = ';';

/// Marker entry whose presence qualifies a candidate as a git repository.
pub const GIT_MARKER: &str = ".git";

/// Filesystem existence check, abstracted for tests.
pub trait PathCheck: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl PathCheck for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Ordered candidate directories parsed from the configured list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryList {
    candidates: Vec<PathBuf>,
}

impl RepositoryList {
    /// Split on `;`, trimming whitespace and dropping empty entries.
    pub fn parse(raw: &str) -> Self {
        let candidates = raw
            .split(REPOSITORY_SEPARATOR)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether each candidate qualifies, in list order.
    pub fn inspect(&self, paths: &dyn PathCheck) -> Vec<(PathBuf, bool)> {
        self.candidates
            .iter()
            .map(|candidate| (candidate.clone(), paths.exists(&candidate.join(GIT_MARKER))))
            .collect()
    }

    /// First candidate with a `.git` entry. Skipped candidates are logged.
    pub fn select_active(&self, paths: &dyn PathCheck) -> Option<PathBuf> {
        if self.candidates.is_empty() {
            debug!("repository list is empty");
            return None;
        }

        for candidate in &self.candidates {
            if paths.exists(&candidate.join(GIT_MARKER)) {
                debug!(path = %candidate.display(), "selected active repository");
                return Some(candidate.clone());
            }
            warn!(path = %candidate.display(), "skipping candidate without a .git entry");
        }

        warn!(candidates = self.candidates.len(), "no candidate is a git repository");
        None
    }
}

/// Parse `raw` and return the first candidate containing `.git`.
pub fn select_active(raw: &str, paths: &dyn PathCheck) -> Option<PathBuf> {
    RepositoryList::parse(raw).select_active(paths)
}
