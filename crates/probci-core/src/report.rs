//! Report emitted by one sandbox run.
//!
//! The sandbox prints a single JSON object on stdout:
//!
//! ```json
//! {
//!   "state": "failed",
//!   "tests": [
//!     {
//!       "type": "solutions",
//!       "filename": "solutions/wa.cpp",
//!       "index": 0,
//!       "state": "failed",
//!       "solution": {"filename": "solutions/wa.cpp", "verdict": "WA"},
//!       "result": {"verdict": "WA", "score": 0.5, "groups": [...]}
//!     },
//!     {"type": "validator", "filename": "validator.cpp", "index": 1, ...}
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Problem;

/// Verdict of an accepted case.
pub const ACCEPTED: &str = "AC";

/// Overall state of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportState {
    Passed,
    Failed,
    Skipped,
}

impl ReportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportState::Passed => "passed",
            ReportState::Failed => "failed",
            ReportState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed sandbox report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub state: ReportState,
    #[serde(default)]
    pub tests: Vec<TestResult>,
}

impl Report {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// Test index as emitted by the sandbox; usually a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TestIndex {
    Number(u64),
    Name(String),
}

impl fmt::Display for TestIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestIndex::Number(n) => write!(f, "{n}"),
            TestIndex::Name(name) => f.write_str(name),
        }
    }
}

/// One test case inside a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseResult {
    pub name: String,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GroupResult {
    #[serde(default)]
    pub cases: Vec<CaseResult>,
}

/// Outcome of running one solution or validator over all cases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TestOutcome {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub groups: Vec<GroupResult>,
}

/// A solution declared in the problem's `tests/tests.json` together with
/// the constraints its run must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeclaredSolution {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub constraints: BTreeMap<String, Value>,
}

/// Test entry for a solution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolutionTest {
    pub filename: String,
    pub index: TestIndex,
    pub state: String,
    #[serde(default)]
    pub solution: DeclaredSolution,
    #[serde(default)]
    pub result: TestOutcome,
}

/// Test entry for the problem's validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatorTest {
    pub filename: String,
    pub index: TestIndex,
    pub state: String,
    #[serde(default)]
    pub result: TestOutcome,
}

/// One entry of [`Report::tests`], tagged by its `type` field.
///
/// Only `solutions` and `validator` are accepted. Any other `type` fails
/// deserialization of the whole [`Report`], so the problem is recorded as
/// an invocation failure instead of being validated as a validator test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestResult {
    Solutions(SolutionTest),
    Validator(ValidatorTest),
}

/// What a test is expected to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedOutcome(pub BTreeMap<String, Value>);

impl ExpectedOutcome {
    pub fn accepted() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("verdict".to_string(), Value::String(ACCEPTED.to_string()));
        Self(fields)
    }

    pub fn verdict(&self) -> Option<&str> {
        self.0.get("verdict").and_then(Value::as_str)
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// What a test actually produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedOutcome {
    pub verdict: Option<String>,
    pub score: Option<f64>,
}

impl fmt::Display for ObservedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::json!({ "verdict": self.verdict, "score": self.score });
        write!(f, "{rendered}")
    }
}

impl TestResult {
    pub fn kind(&self) -> &'static str {
        match self {
            TestResult::Solutions(_) => "solutions",
            TestResult::Validator(_) => "validator",
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            TestResult::Solutions(t) => &t.filename,
            TestResult::Validator(t) => &t.filename,
        }
    }

    pub fn index(&self) -> &TestIndex {
        match self {
            TestResult::Solutions(t) => &t.index,
            TestResult::Validator(t) => &t.index,
        }
    }

    pub fn state(&self) -> &str {
        match self {
            TestResult::Solutions(t) => &t.state,
            TestResult::Validator(t) => &t.state,
        }
    }

    pub fn outcome(&self) -> &TestOutcome {
        match self {
            TestResult::Solutions(t) => &t.result,
            TestResult::Validator(t) => &t.result,
        }
    }

    pub fn passed(&self) -> bool {
        self.state() == "passed"
    }

    /// Declared constraints for solutions (`AC` when none); always `AC` for
    /// the validator.
    pub fn expected(&self) -> ExpectedOutcome {
        match self {
            TestResult::Solutions(t) if !t.solution.constraints.is_empty() => {
                ExpectedOutcome(t.solution.constraints.clone())
            }
            TestResult::Solutions(_) | TestResult::Validator(_) => ExpectedOutcome::accepted(),
        }
    }

    pub fn observed(&self) -> ObservedOutcome {
        let outcome = self.outcome();
        ObservedOutcome {
            verdict: outcome.verdict.clone(),
            score: outcome.score,
        }
    }

    /// Names of every case whose verdict is not `AC`, across all groups.
    pub fn failed_cases(&self) -> BTreeSet<&str> {
        self.outcome()
            .groups
            .iter()
            .flat_map(|group| &group.cases)
            .filter(|case| case.verdict != ACCEPTED)
            .map(|case| case.name.as_str())
            .collect()
    }

    /// Where the sandbox leaves per-case artifacts for this test.
    pub fn logs_directory(&self, problem_results_dir: &Path) -> PathBuf {
        let dir = problem_results_dir.join(self.index().to_string());
        match self {
            TestResult::Solutions(_) => dir,
            TestResult::Validator(_) => dir.join("validator"),
        }
    }

    /// The tested file, relative to the repository root.
    pub fn tested_file(&self, problem: &Problem) -> PathBuf {
        problem.test_file(self.filename())
    }

    /// Source file a failing case is attributed to.
    pub fn associated_file(&self, problem: &Problem, case_name: &str) -> PathBuf {
        match self {
            TestResult::Solutions(_) => self.tested_file(problem),
            TestResult::Validator(_) => problem.case_input(case_name),
        }
    }
}
