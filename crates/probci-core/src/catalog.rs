//! Problem catalog (`problems.json`) and the [`Problem`] identity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CiError, Result};

/// Catalog file name, relative to the repository root.
pub const CATALOG_FILE: &str = "problems.json";

/// Settings file inside every problem directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// A problem selected for testing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Problem {
    /// Directory relative to the repository root. Unique per problem.
    pub path: String,

    /// Human-readable title. Cosmetic only.
    pub title: String,
}

impl Problem {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }

    /// Synthesize a problem from a bare path, titled after its last segment.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let title = trimmed
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(trimmed);
        Self::new(trimmed, title)
    }

    /// `settings.json` of this problem, relative to the repository root.
    pub fn settings_file(&self) -> PathBuf {
        Path::new(&self.path).join(SETTINGS_FILE)
    }

    /// File inside the problem's `tests/` directory.
    pub fn test_file(&self, filename: &str) -> PathBuf {
        Path::new(&self.path).join("tests").join(filename)
    }

    /// Validator input for `case_name` inside the problem's `cases/` directory.
    pub fn case_input(&self, case_name: &str) -> PathBuf {
        Path::new(&self.path)
            .join("cases")
            .join(format!("{case_name}.in"))
    }
}

/// One raw declaration from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub disabled: bool,
}

impl From<CatalogEntry> for Problem {
    fn from(entry: CatalogEntry) -> Self {
        Problem::new(entry.path, entry.title)
    }
}

/// Ordered list of problem declarations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProblemCatalog {
    pub problems: Vec<CatalogEntry>,
}

impl ProblemCatalog {
    /// Load `<root>/problems.json`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CATALOG_FILE);
        info!(catalog = %path.display(), "Loading problems");
        let content = std::fs::read_to_string(&path).map_err(|source| CiError::Catalog {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CiError::CatalogFormat { path, source })
    }

    /// Parse a catalog from its JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Non-disabled problems in catalog order. Each dropped entry is logged.
    pub fn enabled(self) -> Vec<Problem> {
        self.problems
            .into_iter()
            .filter(|entry| {
                if entry.disabled {
                    info!(problem = %entry.path, "Problem {} disabled. Skipping.", entry.title);
                }
                !entry.disabled
            })
            .map(Problem::from)
            .collect()
    }
}
