//! Per-archive loop over everything named on the command line.
//!
//! The driver runs one archive at a time, in order. A failure in one
//! archive is reported and counted; it never stops the next one.

use std::path::Path;

use crate::error::Error;
use crate::extractor::{Extractor, Outcome};
use crate::lister::Lister;
use crate::report::Reporter;

/// What to do with each archive.
pub enum Action {
    List(Lister),
    Extract(Extractor),
}

/// How one archive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    /// Listed, or unpacked with every entry visited.
    Done,
    /// Nothing to unpack.
    SkippedEmpty,
    /// The archive could not be opened or read at all.
    FailedOpen,
    /// The destination folder could not be created.
    FailedPlan,
    /// Unpacking started but the destination root went away.
    Abandoned,
}

impl ArchiveState {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::FailedOpen | Self::FailedPlan | Self::Abandoned)
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub states: Vec<ArchiveState>,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.states.iter().filter(|s| s.is_failure()).count()
    }

    /// True when no archive failed as a whole.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs an [`Action`] over archives sequentially.
pub struct Driver {
    action: Action,
}

impl Driver {
    pub fn new(action: Action) -> Self {
        Self { action }
    }

    /// Process every archive in order and collect how each one ended.
    pub fn run<P: AsRef<Path>>(&self, archives: &[P], reporter: &mut dyn Reporter) -> Summary {
        let mut summary = Summary::default();

        for archive in archives {
            let archive = archive.as_ref();
            let _span = tracing::debug_span!("archive", path = %archive.display()).entered();

            let state = self.run_one(archive, reporter);
            tracing::debug!(?state, "archive finished");
            summary.states.push(state);
        }

        summary
    }

    fn run_one(&self, archive: &Path, reporter: &mut dyn Reporter) -> ArchiveState {
        let result = match &self.action {
            Action::List(lister) => lister.list(archive, reporter).map(|_| ArchiveState::Done),
            Action::Extract(extractor) => {
                extractor
                    .extract(archive, reporter)
                    .map(|outcome| match outcome {
                        Outcome::Done(report) if report.aborted => ArchiveState::Abandoned,
                        Outcome::Done(_) => ArchiveState::Done,
                        Outcome::SkippedEmpty => ArchiveState::SkippedEmpty,
                    })
            }
        };

        match result {
            Ok(state) => state,
            Err(e) => {
                reporter.problem(archive, &e);
                classify(&e)
            }
        }
    }
}

fn classify(error: &Error) -> ArchiveState {
    match error {
        Error::PlanFailed { .. } | Error::DestinationExists { .. } => ArchiveState::FailedPlan,
        _ => ArchiveState::FailedOpen,
    }
}
