//! Sandbox execution.
//!
//! The sandbox is an opaque container image. Given a problem path and a
//! results directory it exits 0 after a completed run (failing verdicts
//! included) and prints a JSON report on stdout. Non-zero exit means the
//! infrastructure failed, not the problem.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use probci_core::{Problem, RunContext, SandboxImage};
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::InvocationError;

/// Captured output of one sandbox run.
#[derive(Debug, Clone)]
pub struct SandboxOutput {
    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout: the JSON report.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl SandboxOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Isolated execution environment for one problem.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Make the sandbox image available locally.
    async fn pull(&self) -> Result<(), InvocationError>;

    /// Run every test of `problem`, writing artifacts under `results_dir`.
    async fn run(
        &self,
        problem: &Problem,
        results_dir: &Path,
    ) -> Result<SandboxOutput, InvocationError>;
}

/// Mount point of the repository inside the container.
pub const CONTAINER_SOURCE_DIR: &str = "/src";

/// [`Sandbox`] that runs the image through `docker run`.
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    program: String,
    root: PathBuf,
    image: SandboxImage,
    timeout_secs: u64,
}

impl DockerSandbox {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            program: "docker".to_string(),
            root: ctx.root.clone(),
            image: ctx.image.clone(),
            timeout_secs: 0,
        }
    }

    /// Kill the container after `secs` seconds. 0 waits forever.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Use a different container CLI (e.g. `podman`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the container CLI for one problem.
    ///
    /// `results_dir` is given to the container relative to the root, so it
    /// must be absolute here (as [`RunContext`] paths are once resolved).
    pub fn run_args(
        &self,
        container: &str,
        problem: &Problem,
        results_dir: &Path,
    ) -> Vec<String> {
        let results = results_dir.strip_prefix(&self.root).unwrap_or(results_dir);
        vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container.to_string(),
            "--volume".to_string(),
            format!("{}:{}", self.root.display(), CONTAINER_SOURCE_DIR),
            self.image.to_string(),
            "-oneshot=ci".to_string(),
            "-input".to_string(),
            problem.path.clone(),
            "-results".to_string(),
            results.display().to_string(),
        ]
    }

    /// Stop a running container. The daemon owns it, so killing the CLI
    /// child alone leaves it running.
    async fn kill(&self, container: &str) {
        let result = Command::new(&self.program)
            .args(["kill", container])
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                info!(container, "Killed timed out sandbox");
            }
            Ok(output) => warn!(
                container,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to kill timed out sandbox"
            ),
            Err(e) => warn!(container, error = %e, "Failed to kill timed out sandbox"),
        }
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    async fn pull(&self) -> Result<(), InvocationError> {
        let image = self.image.to_string();
        info!(image = %image, "Pulling sandbox image");

        let output = Command::new(&self.program)
            .args(["pull", image.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| InvocationError::PullFailed {
                image: image.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(InvocationError::PullFailed {
                image,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn run(
        &self,
        problem: &Problem,
        results_dir: &Path,
    ) -> Result<SandboxOutput, InvocationError> {
        let start = Instant::now();
        let container = format!("probci-{}", Uuid::new_v4());
        let args = self.run_args(&container, problem, results_dir);
        debug!(program = %self.program, args = ?args, "Starting sandbox");

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(InvocationError::Spawn)?;

        let output = if self.timeout_secs > 0 {
            let waited = tokio::time::timeout(
                Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await;
            match waited {
                Ok(output) => output.map_err(InvocationError::Spawn)?,
                Err(_) => {
                    self.kill(&container).await;
                    return Err(InvocationError::Timeout {
                        secs: self.timeout_secs,
                    });
                }
            }
        } else {
            child
                .wait_with_output()
                .await
                .map_err(InvocationError::Spawn)?
        };

        Ok(SandboxOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
