//! Commit range resolution from CI-provided environment variables.

use std::fmt;

use tracing::debug;

use crate::error::{CiError, Result};

/// Travis CI: the range verbatim.
pub const TRAVIS_COMMIT_RANGE: &str = "TRAVIS_COMMIT_RANGE";

/// CircleCI: a compare URL whose seventh `/` segment is the range.
pub const CIRCLE_COMPARE_URL: &str = "CIRCLE_COMPARE_URL";

/// GitHub Actions: the base commit of the pull request.
pub const GITHUB_BASE_COMMIT: &str = "GITHUB_BASE_COMMIT";

/// Range used when no CI variable is set.
pub const DEFAULT_COMMIT_RANGE: &str = "origin/master...HEAD";

const COMPARE_URL_RANGE_SEGMENT: usize = 6;
const BASE_COMMIT_SUFFIX: &str = "...HEAD";

/// Opaque diff boundary handed to `git diff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange(String);

impl CommitRange {
    pub fn new(range: impl Into<String>) -> Self {
        Self(range.into())
    }

    /// Resolve the range with the process environment.
    pub fn from_process_env() -> Result<Self> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Resolve the range through `lookup`.
    ///
    /// Priority: `TRAVIS_COMMIT_RANGE`, then `CIRCLE_COMPARE_URL`, then
    /// `GITHUB_BASE_COMMIT` composed with `...HEAD`, then
    /// [`DEFAULT_COMMIT_RANGE`].
    pub fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(range) = lookup(TRAVIS_COMMIT_RANGE) {
            debug!(source = TRAVIS_COMMIT_RANGE, range = %range, "Resolved commit range");
            return Ok(Self(range));
        }

        if let Some(url) = lookup(CIRCLE_COMPARE_URL) {
            let range = url
                .split('/')
                .nth(COMPARE_URL_RANGE_SEGMENT)
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| CiError::CommitRange {
                    variable: CIRCLE_COMPARE_URL.to_string(),
                    reason: format!("no commit range in compare URL {url:?}"),
                })?;
            debug!(source = CIRCLE_COMPARE_URL, range = %range, "Resolved commit range");
            return Ok(Self(range.to_string()));
        }

        if let Some(base) = lookup(GITHUB_BASE_COMMIT) {
            let range = format!("{base}{BASE_COMMIT_SUFFIX}");
            debug!(source = GITHUB_BASE_COMMIT, range = %range, "Resolved commit range");
            return Ok(Self(range));
        }

        Ok(Self(DEFAULT_COMMIT_RANGE.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
