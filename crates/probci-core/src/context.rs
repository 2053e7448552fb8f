//! Run context threaded through every component.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default sandbox image repository.
pub const DEFAULT_IMAGE_NAME: &str = "omegaup/quark-ci";

/// Default sandbox image tag.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Container image reference used to run problems.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxImage {
    pub name: String,
    pub tag: String,
}

impl SandboxImage {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

impl Default for SandboxImage {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_NAME, DEFAULT_IMAGE_TAG)
    }
}

impl fmt::Display for SandboxImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Immutable per-invocation settings.
///
/// Built once by the binary and passed by reference; no component reads
/// process-wide configuration on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Repository root. Problem paths are relative to it.
    pub root: PathBuf,

    /// Directory that receives one subdirectory per tested problem.
    pub results_dir: PathBuf,

    /// Whether CI annotations should be emitted.
    pub ci: bool,

    /// Sandbox image.
    pub image: SandboxImage,
}

impl RunContext {
    /// Create a context with results under `<root>/results`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let results_dir = root.join("results");
        Self {
            root,
            results_dir,
            ci: false,
            image: SandboxImage::default(),
        }
    }

    pub fn with_results_dir(mut self, results_dir: impl Into<PathBuf>) -> Self {
        self.results_dir = results_dir.into();
        self
    }

    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    pub fn with_image(mut self, image: SandboxImage) -> Self {
        self.image = image;
        self
    }

    /// Resolve a relative root or results directory against `base`.
    ///
    /// The sandbox sees the results directory relative to the root, so both
    /// must be absolute for host and container to agree on where it is.
    pub fn anchored_at(mut self, base: &Path) -> Self {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        if self.results_dir.is_relative() {
            self.results_dir = base.join(&self.results_dir);
        }
        self
    }

    /// Results subdirectory owned by the problem at `problem_path`.
    pub fn problem_results_dir(&self, problem_path: &str) -> PathBuf {
        self.results_dir.join(problem_path)
    }

    /// Render `path` relative to the repository root when possible.
    pub fn relative_to_root<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
