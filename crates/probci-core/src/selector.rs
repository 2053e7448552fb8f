//! Problem selection: explicit paths, the whole catalog, or only what changed.

use std::path::Path;

use tracing::info;

use crate::catalog::{Problem, ProblemCatalog};
use crate::commit_range::CommitRange;
use crate::error::Result;
use crate::git::DiffSource;

/// What the caller asked to test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Consider every enabled catalog problem instead of only changed ones.
    pub all: bool,

    /// Explicit problem paths. When non-empty, overrides everything else.
    pub paths: Vec<String>,
}

impl SelectionRequest {
    pub fn all() -> Self {
        Self {
            all: true,
            paths: Vec::new(),
        }
    }

    pub fn changed() -> Self {
        Self::default()
    }

    pub fn explicit<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all: false,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

type EnvLookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// Resolves a [`SelectionRequest`] into an ordered list of problems.
///
/// Collaborator failures (catalog, commit range, diff) are returned as-is;
/// selection is never retried.
pub struct ProblemSelector<'a> {
    root: &'a Path,
    diff: &'a dyn DiffSource,
    env: EnvLookup<'a>,
}

impl<'a> ProblemSelector<'a> {
    /// Selector reading commit range hints from the process environment.
    pub fn new(root: &'a Path, diff: &'a dyn DiffSource) -> Self {
        Self {
            root,
            diff,
            env: Box::new(|key: &str| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup used for commit range resolution.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'a,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn select(&self, request: &SelectionRequest) -> Result<Vec<Problem>> {
        if !request.paths.is_empty() {
            return Ok(request
                .paths
                .iter()
                .map(|path| Problem::from_path(path))
                .collect());
        }

        let problems = ProblemCatalog::load(self.root)?.enabled();

        if request.all {
            info!(count = problems.len(), "Loading everything as requested");
            return Ok(problems);
        }

        let range = CommitRange::from_env(&self.env)?;
        let changes = self.diff.changed_files(&range)?;

        Ok(problems
            .into_iter()
            .filter(|problem| {
                info!(problem = %problem.path, "Loading {}", problem.title);
                let changed = changes.mentions(&problem.path);
                if !changed {
                    info!(problem = %problem.path, "No changes. Skipping.");
                }
                changed
            })
            .collect())
    }
}
