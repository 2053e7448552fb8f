//! Problem CI - `runtests`
//!
//! Selects the problems to test (explicit paths, `--all`, or those touched
//! by the current commit range), runs each one in the sandbox image and
//! validates the report it emits. Exits 1 when any problem failed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use probci_core::context::{DEFAULT_IMAGE_NAME, DEFAULT_IMAGE_TAG};
use probci_core::{
    repository_root, GitDiff, ProblemSelector, RunContext, SandboxImage, SelectionRequest,
};
use probci_runner::{reset_results_directory, DockerSandbox, FailureReporter, Sandbox, TestRun};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "runtests")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run problem tests in the sandbox image", long_about = None)]
struct Cli {
    /// Signal that this is being run from the CI
    #[arg(long)]
    ci: bool,

    /// Consider all problems, instead of only those that have changed
    #[arg(long)]
    all: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Directory to store the results of the runs (default: <root>/results)
    #[arg(long)]
    results_directory: Option<PathBuf>,

    /// Don't run tests: only download the sandbox image
    #[arg(long)]
    only_pull_image: bool,

    /// Sandbox image repository
    #[arg(long, env = "PROBCI_IMAGE", default_value = DEFAULT_IMAGE_NAME)]
    image: String,

    /// Sandbox image tag
    #[arg(long, env = "PROBCI_IMAGE_TAG", default_value = DEFAULT_IMAGE_TAG)]
    image_tag: String,

    /// Number of problems to run concurrently
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Kill a sandbox run after this many seconds (0 = never)
    #[arg(long, default_value = "0")]
    timeout_secs: u64,

    /// Repository root (default: the enclosing git work tree)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Problem directories to test, relative to the repository root
    #[arg(value_name = "PROBLEM")]
    problem_paths: Vec<String>,
}

impl Cli {
    fn selection(&self) -> SelectionRequest {
        SelectionRequest {
            all: self.all,
            paths: self.problem_paths.clone(),
        }
    }

    /// Build the run context. Relative paths resolve against `cwd`.
    fn context(&self, root: PathBuf, cwd: &Path) -> RunContext {
        let results_dir = self
            .results_directory
            .clone()
            .unwrap_or_else(|| root.join("results"));
        RunContext::new(root)
            .with_results_dir(results_dir)
            .with_ci(self.ci)
            .with_image(SandboxImage::new(&self.image, &self.image_tag))
            .anchored_at(cwd)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    probci_core::init_tracing(cli.json, level);

    let code = run(cli).await?;
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let root = match &cli.root {
        Some(root) => cwd
            .join(root)
            .canonicalize()
            .with_context(|| format!("Failed to resolve repository root {}", root.display()))?,
        None => repository_root(&cwd).context("Failed to locate repository root")?,
    };
    let ctx = cli.context(root, &cwd);
    let sandbox = DockerSandbox::new(&ctx).with_timeout(cli.timeout_secs);

    if cli.only_pull_image {
        sandbox.pull().await.context("Failed to pull sandbox image")?;
        return Ok(0);
    }
    if ctx.ci {
        sandbox.pull().await.context("Failed to pull sandbox image")?;
    }

    reset_results_directory(&ctx.results_dir).with_context(|| {
        format!(
            "Failed to reset results directory {}",
            ctx.results_dir.display()
        )
    })?;

    let diff = GitDiff::new(&ctx.root);
    let problems = ProblemSelector::new(&ctx.root, &diff)
        .select(&cli.selection())
        .context("Failed to select problems")?;
    info!(count = problems.len(), "Selected problems");

    let mut reporter = FailureReporter::stdout(ctx.ci);
    let outcome = TestRun::new(&ctx, &sandbox)
        .with_jobs(cli.jobs)
        .execute(problems, &mut reporter)
        .await?;

    Ok(outcome.exit_code())
}
