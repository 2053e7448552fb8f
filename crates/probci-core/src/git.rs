//! Git integration: repository root discovery and change sets.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::commit_range::CommitRange;
use crate::error::{CiError, Result};

/// Raw `git diff --name-only` output.
///
/// Matching is substring-based over the whole text, so a problem at `a/b`
/// is also considered changed when `x/a/bc/file` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(String);

impl ChangeSet {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Whether `path` appears anywhere in the diff output.
    pub fn mentions(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Changed paths, one per line.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.lines().filter(|line| !line.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source of the files changed within a commit range.
pub trait DiffSource {
    fn changed_files(&self, range: &CommitRange) -> Result<ChangeSet>;
}

/// [`DiffSource`] backed by `git diff` in a working tree.
#[derive(Debug, Clone)]
pub struct GitDiff {
    repo_dir: PathBuf,
}

impl GitDiff {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

impl DiffSource for GitDiff {
    /// Runs `git diff --name-only --diff-filter=AMDR <range>`.
    fn changed_files(&self, range: &CommitRange) -> Result<ChangeSet> {
        info!(range = %range, "Loading git diff");
        let output = Command::new("git")
            .args(["diff", "--name-only", "--diff-filter=AMDR", range.as_str()])
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| CiError::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CiError::Git(format!("git diff {range} failed: {stderr}")));
        }

        Ok(ChangeSet(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

/// Top-level directory of the git work tree containing `dir`.
pub fn repository_root(dir: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .output()
        .map_err(|e| CiError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CiError::Git(format!(
            "git rev-parse --show-toplevel failed: {stderr}"
        )));
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        return Err(CiError::Git(
            "git rev-parse --show-toplevel returned empty output".to_string(),
        ));
    }

    Ok(PathBuf::from(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_change_set_substring_match() {
        let changes = ChangeSet::new("problems/sumas/cases/1.in\nREADME.md\n");
        assert!(changes.mentions("problems/sumas"));
        assert!(changes.mentions("problems/sum"));
        assert!(!changes.mentions("problems/restas"));
        assert_eq!(changes.paths().count(), 2);
    }

    #[test]
    fn test_git_diff_lists_changed_files() {
        let repo = make_git_repo();
        let problem_dir = repo.path().join("problems/sumas");
        std::fs::create_dir_all(&problem_dir).unwrap();
        std::fs::write(problem_dir.join("settings.json"), "{}").unwrap();
        run_git(repo.path(), &["add", "."]);
        run_git(repo.path(), &["commit", "-m", "add sumas"]);

        let changes = GitDiff::new(repo.path())
            .changed_files(&CommitRange::new("HEAD~1...HEAD"))
            .unwrap();
        assert!(changes.mentions("problems/sumas/settings.json"));
    }

    #[test]
    fn test_git_diff_bad_range_is_error() {
        let repo = make_git_repo();
        let err = GitDiff::new(repo.path())
            .changed_files(&CommitRange::new("no-such-ref...HEAD"))
            .unwrap_err();
        assert!(matches!(err, CiError::Git(_)));
    }

    #[test]
    fn test_repository_root_from_subdirectory() {
        let repo = make_git_repo();
        let nested = repo.path().join("problems");
        std::fs::create_dir_all(&nested).unwrap();
        let root = repository_root(&nested).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_repository_root_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(repository_root(dir.path()).is_err());
    }
}
