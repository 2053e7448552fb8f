//! Driving loop: invoke, validate and report every selected problem.

use std::io::Write;
use std::path::Path;

use futures::stream::{self, StreamExt};
use probci_core::{Problem, ReportState, RunContext};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::invoker::Invoker;
use crate::reporter::{FailureMap, FailureReporter};
use crate::sandbox::Sandbox;
use crate::validator::validate;

/// How a single problem ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemStatus {
    /// The sandbox completed and produced a report in this state.
    Completed(ReportState),

    /// The sandbox could not produce a report.
    InvocationFailed(String),
}

/// Outcome of one problem.
#[derive(Debug, Clone)]
pub struct ProblemOutcome {
    pub problem: Problem,
    pub status: ProblemStatus,
    pub failed: bool,
    pub failures: FailureMap,
}

/// Aggregate of every problem in a run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub any_failure: bool,
    pub problems: Vec<ProblemOutcome>,
}

impl RunOutcome {
    pub fn record(&mut self, outcome: ProblemOutcome) {
        self.any_failure |= outcome.failed;
        self.problems.push(outcome);
    }

    /// Combine two partial runs. The failure flag is a plain OR, so merge
    /// order does not matter.
    pub fn merge(mut self, other: RunOutcome) -> RunOutcome {
        self.any_failure |= other.any_failure;
        self.problems.extend(other.problems);
        self
    }

    pub fn failed_count(&self) -> usize {
        self.problems.iter().filter(|p| p.failed).count()
    }

    pub fn passed_count(&self) -> usize {
        self.problems.len() - self.failed_count()
    }

    /// Process exit status: 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.any_failure {
            1
        } else {
            0
        }
    }
}

/// Remove and recreate the results root.
pub fn reset_results_directory(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)
}

/// A run over a list of problems.
pub struct TestRun<'a> {
    ctx: &'a RunContext,
    sandbox: &'a dyn Sandbox,
    jobs: usize,
}

impl<'a> TestRun<'a> {
    pub fn new(ctx: &'a RunContext, sandbox: &'a dyn Sandbox) -> Self {
        Self {
            ctx,
            sandbox,
            jobs: 1,
        }
    }

    /// Run up to `jobs` problems at once. 1 keeps catalog order.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Execute every problem and emit its failures through `reporter`.
    ///
    /// Problems are isolated: invocation errors are recorded and the loop
    /// continues. Outcomes are merged and reported here, one problem at a
    /// time, regardless of how many ran concurrently.
    pub async fn execute<W: Write>(
        &self,
        problems: Vec<Problem>,
        reporter: &mut FailureReporter<W>,
    ) -> anyhow::Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("probci.run", run_id = %run_id);

        async {
            info!(problems = problems.len(), jobs = self.jobs, "Starting test run");

            let mut outcomes = stream::iter(problems)
                .map(|problem| self.run_problem(problem))
                .buffer_unordered(self.jobs);

            let mut run = RunOutcome::default();
            while let Some(outcome) = outcomes.next().await {
                reporter.report(&outcome.failures)?;
                run.record(outcome);
            }

            info!(
                passed = run.passed_count(),
                failed = run.failed_count(),
                "Test run finished"
            );
            Ok::<_, anyhow::Error>(run)
        }
        .instrument(span)
        .await
    }

    async fn run_problem(&self, problem: Problem) -> ProblemOutcome {
        let span = info_span!("probci.problem", problem = %problem.path);
        async {
            info!("Testing problem: {}...", problem.title);

            let invocation = match Invoker::new(self.ctx, self.sandbox).invoke(&problem).await {
                Ok(invocation) => invocation,
                Err(e) => {
                    let mut failures = FailureMap::new();
                    let message = match e.details() {
                        Some(details) => format!("Failed to run {}: {e}\n{details}", problem.title),
                        None => format!("Failed to run {}: {e}", problem.title),
                    };
                    error!(file = %problem.settings_file().display(), "{message}");
                    failures.record(problem.settings_file(), message);
                    return ProblemOutcome {
                        status: ProblemStatus::InvocationFailed(e.to_string()),
                        problem,
                        failed: true,
                        failures,
                    };
                }
            };

            let validation = validate(
                &problem,
                &invocation.report,
                &invocation.results_dir,
                &self.ctx.root,
            );

            info!("Results for {}: {}", problem.title, invocation.report.state);
            info!(
                "    Full logs and report in {}",
                invocation.results_dir.display()
            );

            ProblemOutcome {
                status: ProblemStatus::Completed(invocation.report.state),
                problem,
                failed: validation.failed,
                failures: validation.failures,
            }
        }
        .instrument(span)
        .await
    }
}
