//! Runs one problem through the sandbox and parses its report.

use std::path::{Path, PathBuf};

use probci_core::{Problem, Report, RunContext};
use tracing::{debug, info};

use crate::error::InvocationError;
use crate::sandbox::Sandbox;

/// Captured sandbox stderr, relative to the problem's results directory.
pub const CI_LOG_FILE: &str = "ci.log";

/// A completed sandbox run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub report: Report,
    pub stderr: String,
    /// Results subdirectory owned by this problem.
    pub results_dir: PathBuf,
    pub duration_ms: u64,
}

/// Create `dir` and an empty `ci.log` inside it, writable by any user.
///
/// The sandbox may run under a different uid than the caller.
pub async fn prepare_results_directory(dir: &Path) -> Result<(), InvocationError> {
    let prepare_err = |source| InvocationError::Prepare {
        path: dir.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(prepare_err)?;
    let log = dir.join(CI_LOG_FILE);
    tokio::fs::write(&log, b"").await.map_err(prepare_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777))
            .await
            .map_err(prepare_err)?;
        tokio::fs::set_permissions(&log, std::fs::Permissions::from_mode(0o666))
            .await
            .map_err(prepare_err)?;
    }

    Ok(())
}

/// Execution invoker bound to a run context and a sandbox.
pub struct Invoker<'a> {
    ctx: &'a RunContext,
    sandbox: &'a dyn Sandbox,
}

impl<'a> Invoker<'a> {
    pub fn new(ctx: &'a RunContext, sandbox: &'a dyn Sandbox) -> Self {
        Self { ctx, sandbox }
    }

    /// Run `problem` once. No retries and no partial-report salvage.
    pub async fn invoke(&self, problem: &Problem) -> Result<Invocation, InvocationError> {
        let results_dir = self.ctx.problem_results_dir(&problem.path);
        prepare_results_directory(&results_dir).await?;

        let output = self.sandbox.run(problem, &results_dir).await?;
        debug!(
            problem = %problem.path,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Sandbox finished"
        );

        if !output.success() {
            return Err(InvocationError::NonZeroExit {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        // The captured stream carries more context than what the sandbox
        // wrote to the log itself.
        let log = results_dir.join(CI_LOG_FILE);
        tokio::fs::write(&log, output.stderr.as_bytes())
            .await
            .map_err(|source| InvocationError::Prepare {
                path: log.clone(),
                source,
            })?;

        let report = Report::from_json(&output.stdout)?;
        info!(problem = %problem.path, state = %report.state, tests = report.tests.len(), "Parsed report");

        Ok(Invocation {
            report,
            stderr: output.stderr,
            results_dir,
            duration_ms: output.duration_ms,
        })
    }
}
