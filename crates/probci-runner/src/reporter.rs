//! Failure aggregation and CI annotation output.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use probci_core::Annotation;

/// Failure messages keyed by the file they are attributed to.
///
/// Files iterate in path order; messages keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureMap(BTreeMap<PathBuf, Vec<String>>);

impl FailureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file: impl Into<PathBuf>, message: impl Into<String>) {
        self.0.entry(file.into()).or_default().push(message.into());
    }

    pub fn messages(&self, file: &Path) -> Option<&[String]> {
        self.0.get(file).map(Vec::as_slice)
    }

    /// Number of files with at least one message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[String])> {
        self.0
            .iter()
            .map(|(file, messages)| (file.as_path(), messages.as_slice()))
    }
}

/// Emits failure maps as file-level CI annotations.
///
/// Outside CI mode nothing is written: the same messages were already
/// logged while validating.
pub struct FailureReporter<W: Write> {
    ci: bool,
    out: W,
}

impl FailureReporter<io::Stdout> {
    pub fn stdout(ci: bool) -> Self {
        Self::new(ci, io::stdout())
    }
}

impl<W: Write> FailureReporter<W> {
    pub fn new(ci: bool, out: W) -> Self {
        Self { ci, out }
    }

    /// Emit one `::error file=...::` line per file.
    pub fn report(&mut self, failures: &FailureMap) -> io::Result<()> {
        if !self.ci {
            return Ok(());
        }

        for (file, messages) in failures.iter() {
            let annotation =
                Annotation::error(messages.join("\n")).with_file(file.display().to_string());
            writeln!(self.out, "{annotation}")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
