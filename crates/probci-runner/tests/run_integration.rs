//! Integration tests for the full run loop with a scripted sandbox.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use probci_core::{Problem, ReportState, RunContext};
use probci_runner::{
    reset_results_directory, FailureReporter, InvocationError, ProblemStatus, Sandbox,
    SandboxOutput, TestRun, CI_LOG_FILE,
};
use serde_json::{json, Value};

/// What the fake sandbox does for one problem.
struct Script {
    exit_code: i32,
    report: Value,
    /// Artifacts written relative to the problem's results directory.
    artifacts: Vec<(&'static str, &'static str)>,
}

/// Stands in for the container: writes artifacts, returns a canned report.
struct ScriptedSandbox {
    scripts: HashMap<String, Script>,
    runs: AtomicUsize,
}

impl ScriptedSandbox {
    fn new(scripts: Vec<(&str, Script)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(path, script)| (path.to_string(), script))
                .collect(),
            runs: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn pull(&self) -> Result<(), InvocationError> {
        Ok(())
    }

    async fn run(
        &self,
        problem: &Problem,
        results_dir: &Path,
    ) -> Result<SandboxOutput, InvocationError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let script = &self.scripts[&problem.path];
        for (relative, content) in &script.artifacts {
            let path = results_dir.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        Ok(SandboxOutput {
            exit_code: script.exit_code,
            stdout: script.report.to_string(),
            stderr: format!("ran {}", problem.path),
            duration_ms: 1,
        })
    }
}

fn passing() -> Script {
    Script {
        exit_code: 0,
        report: json!({
            "state": "passed",
            "tests": [{
                "type": "solutions",
                "filename": "solutions/ac.cpp",
                "index": 0,
                "state": "passed",
                "solution": {"filename": "solutions/ac.cpp"},
                "result": {"verdict": "AC", "score": 1.0, "groups": [
                    {"cases": [{"name": "1", "verdict": "AC"}]}
                ]}
            }]
        }),
        artifacts: vec![],
    }
}

fn failing_with_artifacts() -> Script {
    Script {
        exit_code: 0,
        report: json!({
            "state": "failed",
            "tests": [
                {
                    "type": "solutions",
                    "filename": "solutions/wa.cpp",
                    "index": 0,
                    "state": "failed",
                    "solution": {"filename": "solutions/wa.cpp", "verdict": "AC"},
                    "result": {"verdict": "WA", "score": 0.5, "groups": [
                        {"cases": [{"name": "case01", "verdict": "AC"}, {"name": "case07", "verdict": "WA"}]}
                    ]}
                },
                {
                    "type": "validator",
                    "filename": "validator.py",
                    "index": 1,
                    "state": "failed",
                    "result": {"verdict": "JE", "score": 0, "groups": [
                        {"cases": [{"name": "big", "verdict": "JE"}]}
                    ]}
                }
            ]
        }),
        artifacts: vec![
            ("0/case01.err", "should not be reported\n"),
            ("0/case07.err", "expected 3, got 4\n"),
            ("1/validator/big.err", "n exceeds 10^9\n"),
        ],
    }
}

fn broken_infrastructure() -> Script {
    Script {
        exit_code: 125,
        report: Value::Null,
        artifacts: vec![],
    }
}

fn skipped() -> Script {
    Script {
        exit_code: 0,
        report: json!({"state": "skipped"}),
        artifacts: vec![],
    }
}

fn context(root: &Path, ci: bool) -> RunContext {
    let ctx = RunContext::new(root).with_ci(ci);
    reset_results_directory(&ctx.results_dir).unwrap();
    ctx
}

/// Test: all problems pass, nothing is annotated, exit code is 0
#[tokio::test]
async fn test_all_passing_run() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), true);
    let sandbox = ScriptedSandbox::new(vec![("problems/a", passing()), ("problems/b", passing())]);
    let mut reporter = FailureReporter::new(true, Vec::new());

    let run = TestRun::new(&ctx, &sandbox)
        .execute(
            vec![Problem::from_path("problems/a"), Problem::from_path("problems/b")],
            &mut reporter,
        )
        .await
        .expect("run failed");

    assert!(!run.any_failure);
    assert_eq!(run.exit_code(), 0);
    assert_eq!(run.passed_count(), 2);
    assert!(reporter.into_inner().is_empty());

    let log = std::fs::read_to_string(ctx.results_dir.join("problems/a").join(CI_LOG_FILE)).unwrap();
    assert_eq!(log, "ran problems/a");
}

/// Test: failed cases are annotated against the right files
#[tokio::test]
async fn test_failures_are_annotated_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), true);
    let sandbox = ScriptedSandbox::new(vec![("problems/sumas", failing_with_artifacts())]);
    let mut reporter = FailureReporter::new(true, Vec::new());

    let run = TestRun::new(&ctx, &sandbox)
        .execute(vec![Problem::from_path("problems/sumas")], &mut reporter)
        .await
        .expect("run failed");

    assert!(run.any_failure);
    assert_eq!(
        run.problems[0].status,
        ProblemStatus::Completed(ReportState::Failed)
    );

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 2, "one annotation per associated file: {out}");
    assert_eq!(
        lines[0],
        "::error file=problems/sumas/cases/big.in::big.err:%0A    n exceeds 10^9%0A"
    );
    assert_eq!(
        lines[1],
        "::error file=problems/sumas/tests/solutions/wa.cpp::case07.err:%0A    expected 3, got 4%0A"
    );
    assert!(!out.contains("should not be reported"));
}

/// Test: infrastructure failure is isolated to its problem
#[tokio::test]
async fn test_invocation_failure_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), true);
    let sandbox = ScriptedSandbox::new(vec![
        ("problems/broken", broken_infrastructure()),
        ("problems/ok", passing()),
    ]);
    let mut reporter = FailureReporter::new(true, Vec::new());

    let run = TestRun::new(&ctx, &sandbox)
        .execute(
            vec![
                Problem::from_path("problems/broken"),
                Problem::from_path("problems/ok"),
            ],
            &mut reporter,
        )
        .await
        .expect("run failed");

    assert_eq!(sandbox.runs.load(Ordering::SeqCst), 2);
    assert!(run.any_failure);
    assert_eq!(run.failed_count(), 1);
    assert!(matches!(
        run.problems[0].status,
        ProblemStatus::InvocationFailed(_)
    ));

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(out.starts_with("::error file=problems/broken/settings.json::Failed to run broken"));
    assert!(out.contains("ran problems/broken"));
}

/// Test: a skipped report is one failure on settings.json
#[tokio::test]
async fn test_skipped_problem_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), false);
    let sandbox = ScriptedSandbox::new(vec![("problems/empty", skipped())]);
    let mut reporter = FailureReporter::new(false, Vec::new());

    let run = TestRun::new(&ctx, &sandbox)
        .execute(vec![Problem::from_path("problems/empty")], &mut reporter)
        .await
        .expect("run failed");

    assert_eq!(run.exit_code(), 1);
    let failures = &run.problems[0].failures;
    assert_eq!(failures.len(), 1);
    assert!(failures
        .messages(Path::new("problems/empty/settings.json"))
        .is_some());
    // Not in CI mode: nothing written.
    assert!(reporter.into_inner().is_empty());
}

/// Test: the worker pool runs every problem and keeps one results dir each
#[tokio::test]
async fn test_parallel_jobs_cover_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), true);
    let paths = ["problems/a", "problems/b", "problems/c", "problems/d"];
    let sandbox = ScriptedSandbox::new(vec![
        ("problems/a", passing()),
        ("problems/b", failing_with_artifacts()),
        ("problems/c", passing()),
        ("problems/d", skipped()),
    ]);
    let mut reporter = FailureReporter::new(true, Vec::new());

    let run = TestRun::new(&ctx, &sandbox)
        .with_jobs(3)
        .execute(paths.iter().map(|p| Problem::from_path(p)).collect(), &mut reporter)
        .await
        .expect("run failed");

    assert_eq!(run.problems.len(), 4);
    assert_eq!(run.failed_count(), 2);
    assert!(run.any_failure);
    for path in paths {
        assert!(ctx.results_dir.join(path).join(CI_LOG_FILE).is_file());
    }

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(out.lines().count(), 3);
}
