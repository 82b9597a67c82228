//! Read-only listing of archive members.

use std::path::Path;

use crate::adapter::{ArchiveHandle, Flow};
use crate::error::Error;
use crate::format::Format;
use crate::report::Reporter;
use crate::text::count_noun;

/// Result of listing one archive.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Member names in archive order, as stored.
    pub names: Vec<String>,
    pub read_failures: usize,
}

/// Prints archive member names. Never touches the filesystem beyond
/// reading the archive.
#[derive(Debug, Clone, Default)]
pub struct Lister {
    verbose: bool,
}

impl Lister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member count to the archive header line.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// List one archive: its name, then one member per line.
    ///
    /// Names are collected first and printed once the walk is done, so a
    /// header with the count can precede them. Unreadable entries are
    /// reported and skipped; an archive where nothing could be read is an
    /// error, not an empty listing.
    pub fn list(&self, archive: &Path, reporter: &mut dyn Reporter) -> Result<Listing, Error> {
        let format = Format::detect(archive).ok_or_else(|| Error::UnknownFormat {
            archive: archive.display().to_string(),
        })?;
        let mut handle = ArchiveHandle::open(archive, format)?;

        let mut listing = Listing::default();
        let scan = handle
            .scan(|entry| {
                match entry {
                    Ok(entry) => listing.names.push(entry.name),
                    Err(e) => reporter.problem(archive, &e),
                }
                Flow::Continue
            })
            .map_err(|e| Error::open_failed(archive, e))?;
        drop(handle);

        listing.read_failures = scan.read_failures;
        if scan.truncated {
            reporter.problem(
                archive,
                &Error::read_failed(None, "archive stream unreadable; listing stopped early"),
            );
        }
        if listing.names.is_empty() && scan.read_failures > 0 {
            return Err(Error::open_failed(archive, "no member could be read"));
        }

        let shown = reporter.emphasize(&archive.display().to_string());
        if self.verbose {
            reporter.line(&format!(
                "{} ({})",
                shown,
                count_noun(listing.names.len(), "member")
            ));
        } else {
            reporter.line(&shown);
        }
        for name in &listing.names {
            reporter.line(name);
        }

        Ok(listing)
    }
}
