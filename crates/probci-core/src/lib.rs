//! Problem CI Core Library
//!
//! Catalog loading, change-driven problem selection, the sandbox report
//! model, score precision checks and CI annotation encoding.

pub mod annotation;
pub mod catalog;
pub mod commit_range;
pub mod context;
pub mod error;
pub mod git;
pub mod report;
pub mod score;
pub mod selector;
pub mod telemetry;

pub use annotation::{escape_data, escape_property, unescape_data, Annotation, AnnotationLevel};
pub use catalog::{CatalogEntry, Problem, ProblemCatalog, CATALOG_FILE, SETTINGS_FILE};
pub use commit_range::{CommitRange, DEFAULT_COMMIT_RANGE};
pub use context::{RunContext, SandboxImage};
pub use error::{CiError, Result};
pub use git::{repository_root, ChangeSet, DiffSource, GitDiff};
pub use report::{
    CaseResult, DeclaredSolution, ExpectedOutcome, GroupResult, ObservedOutcome, Report,
    ReportState, SolutionTest, TestIndex, TestOutcome, TestResult, ValidatorTest, ACCEPTED,
};
pub use score::ScaledScore;
pub use selector::{ProblemSelector, SelectionRequest};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
