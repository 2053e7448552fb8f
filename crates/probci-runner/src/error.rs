//! Per-problem invocation errors.

use std::path::PathBuf;

/// Errors produced while running one problem through the sandbox.
///
/// All variants except [`InvocationError::PullFailed`] are recorded against
/// the problem and the run moves on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("failed to prepare results directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start sandbox: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("sandbox timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("sandbox exited with code {code}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("malformed report: {0}")]
    MalformedReport(#[from] serde_json::Error),

    #[error("failed to pull image {image}: {reason}")]
    PullFailed { image: String, reason: String },
}

impl InvocationError {
    /// Diagnostic text worth showing next to the error, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            InvocationError::NonZeroExit { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
