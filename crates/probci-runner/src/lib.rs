//! Problem CI runner
//!
//! Runs selected problems through the sandbox image and validates the
//! reports it produces:
//! - [`invoker`] prepares the results directory and captures the report
//! - [`validator`] derives pass/fail, checks score precision and correlates
//!   failed cases to their `.err` artifacts
//! - [`reporter`] turns the resulting failure map into CI annotations
//! - [`pipeline`] drives the loop, optionally with a bounded worker pool

pub mod error;
pub mod invoker;
pub mod pipeline;
pub mod reporter;
pub mod sandbox;
pub mod validator;

// Re-export key types
pub use error::InvocationError;
pub use invoker::{prepare_results_directory, Invocation, Invoker, CI_LOG_FILE};
pub use pipeline::{reset_results_directory, ProblemOutcome, ProblemStatus, RunOutcome, TestRun};
pub use reporter::{FailureMap, FailureReporter};
pub use sandbox::{DockerSandbox, Sandbox, SandboxOutput};
pub use validator::{validate, Validation, ARTIFACT_SUFFIX};
