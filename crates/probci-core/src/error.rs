//! Error taxonomy for run-level (fatal) failures.
//!
//! Everything in here aborts the whole run. Per-problem failures live in the
//! runner crate and are accumulated instead of propagated.

use std::path::PathBuf;

/// Fatal errors produced while preparing a run.
#[derive(Debug, thiserror::Error)]
pub enum CiError {
    #[error("failed to read problem catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed problem catalog {path}: {source}")]
    CatalogFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid commit range from {variable}: {reason}")]
    CommitRange { variable: String, reason: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for run-level operations.
pub type Result<T> = std::result::Result<T, CiError>;
