//! Where listing and extraction send their output.

use std::path::{Path, PathBuf};

use crate::error::{Error, Scope};

/// Output sink for the lister, extractor and driver.
///
/// Regular output goes to [`Reporter::line`], diagnostics to
/// [`Reporter::problem`]. Nothing in the library prints directly.
pub trait Reporter {
    /// One line of regular output.
    fn line(&mut self, text: &str);

    /// A diagnostic about `archive`.
    fn problem(&mut self, archive: &Path, error: &Error);

    /// Styling hook for archive names. Plain text by default.
    fn emphasize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// A diagnostic captured by [`MemoryReporter`].
#[derive(Debug, Clone)]
pub struct Problem {
    pub archive: PathBuf,
    pub scope: Scope,
    pub message: String,
}

/// Collects everything in memory. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub lines: Vec<String>,
    pub problems: Vec<Problem>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any diagnostic message contains `needle`.
    pub fn has_problem(&self, needle: &str) -> bool {
        self.problems.iter().any(|p| p.message.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn problem(&mut self, archive: &Path, error: &Error) {
        self.problems.push(Problem {
            archive: archive.to_path_buf(),
            scope: error.scope(),
            message: error.to_string(),
        });
    }
}
