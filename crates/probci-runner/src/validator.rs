//! Report validation: pass/fail derivation, score precision and correlation
//! of failed cases to their `.err` artifacts.

use std::path::Path;

use probci_core::{Problem, Report, ReportState, ScaledScore, TestResult};
use tracing::{error, info, warn};

use crate::reporter::FailureMap;

/// Suffix of per-case artifacts in a test's logs directory.
pub const ARTIFACT_SUFFIX: &str = ".err";

/// Result of validating one problem's report.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Report-level failure, skip, or any score precision violation.
    pub failed: bool,

    /// Failure messages grouped by the file they are attributed to.
    pub failures: FailureMap,
}

/// Validate `report` against the artifacts in `results_dir`.
///
/// `results_dir` is the problem's own results subdirectory; `root` is only
/// used to print paths relative to the repository.
pub fn validate(problem: &Problem, report: &Report, results_dir: &Path, root: &Path) -> Validation {
    let mut validation = Validation::default();

    if report.state == ReportState::Skipped {
        let message = format!(
            "Skipped {}:\n\
             tests/tests.json, settings.json, outs, or testplan are \
             probably missing or invalid.",
            problem.title
        );
        error!(problem = %problem.path, "{message}");
        validation
            .failures
            .record(problem.settings_file(), message);
        validation.failed = true;
        return validation;
    }

    if report.state != ReportState::Passed {
        validation.failed = true;
    }

    for test in &report.tests {
        if validate_test(problem, test, results_dir, root, &mut validation.failures) {
            validation.failed = true;
        }
    }

    validation
}

/// Validate one test entry. Returns `true` on a score precision violation.
fn validate_test(
    problem: &Problem,
    test: &TestResult,
    results_dir: &Path,
    root: &Path,
    failures: &mut FailureMap,
) -> bool {
    let tested_file = test.tested_file(problem);
    let logs_dir = test.logs_directory(results_dir);
    let expected = test.expected();
    let observed = test.observed();

    let filename: String = test.filename().chars().take(40).collect();
    info!(
        "    {:10} | {:40} | {:8} | expected={} got={} | logs at {}",
        test.kind(),
        filename,
        test.state(),
        expected,
        observed,
        logs_dir.strip_prefix(root).unwrap_or(&logs_dir).display(),
    );

    let mut precision_violation = false;
    let scaled = ScaledScore::from_score(observed.score.unwrap_or(0.0));
    if !scaled.is_integral() {
        precision_violation = true;
        let message = format!("Score isn't an integer! Got: {scaled}\n");
        error!(file = %tested_file.display(), "{message}");
        failures.record(tested_file.clone(), message);
    }

    if !test.passed() {
        collect_case_artifacts(problem, test, &logs_dir, failures);
    }

    precision_violation
}

/// Attach the `.err` artifact of every non-`AC` case to its associated file.
fn collect_case_artifacts(
    problem: &Problem,
    test: &TestResult,
    logs_dir: &Path,
    failures: &mut FailureMap,
) {
    if !logs_dir.is_dir() {
        warn!("Logs directory {:?} not found.", logs_dir.display().to_string());
        return;
    }

    let failed_cases = test.failed_cases();

    let mut artifacts: Vec<String> = match std::fs::read_dir(logs_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect(),
        Err(e) => {
            warn!(error = %e, "Failed to list logs directory {}", logs_dir.display());
            return;
        }
    };
    artifacts.sort();

    for artifact in artifacts {
        let Some(case_name) = artifact.strip_suffix(ARTIFACT_SUFFIX) else {
            continue;
        };
        if !failed_cases.contains(case_name) {
            continue;
        }

        let content = match std::fs::read_to_string(logs_dir.join(&artifact)) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, artifact = %artifact, "Failed to read case artifact");
                continue;
            }
        };

        let message = format!("{artifact}:\n{}", indent(&content, "    "));
        info!("{message}");
        failures.record(test.associated_file(problem, case_name), message);
    }
}

/// Prefix every line that is not blank, keeping line endings.
fn indent(text: &str, prefix: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect()
}
