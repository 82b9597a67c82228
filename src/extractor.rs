use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::adapter::{ArchiveHandle, Flow};
use crate::entry::{Entry, EntryKind};
use crate::error::Error;
use crate::format::Format;
use crate::plan::{CollisionPolicy, DestinationPolicy, ExtractionPlan};
use crate::report::Reporter;
use crate::sanitize::{SafePath, Sanitizer};
use crate::text::count_noun;

/// How an archive that was opened and planned ended up.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Every entry was visited. Per-entry problems are counted in the report.
    Done(Report),
    /// The archive has no members; nothing was created.
    SkippedEmpty,
}

/// Extraction statistics for one archive.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Directory members landed under.
    pub destination: PathBuf,
    pub files_extracted: usize,
    pub dirs_created: usize,
    pub bytes_written: u64,
    /// Symlinks, hard links, devices and other unsupported entries.
    pub entries_skipped: usize,
    /// Entries whose names were absolute, escaping or unwritable.
    pub entries_rejected: usize,
    pub read_failures: usize,
    pub write_failures: usize,
    /// The destination root vanished and the rest of the archive was abandoned.
    pub aborted: bool,
}

/// Unpacks archives under a base directory.
///
/// An archive with one member is unpacked straight into the base
/// directory; an archive with more gets a folder of its own named after
/// the archive (see [`DestinationPolicy`]).
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use unz::{Extractor, MemoryReporter};
///
/// let mut reporter = MemoryReporter::new();
/// let outcome = Extractor::new(".")?
///     .verbose(true)
///     .extract(Path::new("release.tar.gz"), &mut reporter)?;
/// println!("{:?}", outcome);
/// # Ok::<(), unz::Error>(())
/// ```
pub struct Extractor {
    base: PathBuf,
    verbose: bool,
    collision: CollisionPolicy,
    flatten: bool,
}

impl Extractor {
    /// Create an extractor for the given base directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestinationNotFound`] if the directory doesn't exist.
    /// Use [`Self::new_or_create`] if you want to create it automatically.
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self, Error> {
        Self::new_impl(base.as_ref(), false)
    }

    /// Create an extractor, creating the base directory if it doesn't exist.
    pub fn new_or_create<P: AsRef<Path>>(base: P) -> Result<Self, Error> {
        Self::new_impl(base.as_ref(), true)
    }

    fn new_impl(base: &Path, create: bool) -> Result<Self, Error> {
        if !base.is_dir() {
            if create {
                fs::create_dir_all(base)?;
            } else {
                return Err(Error::DestinationNotFound {
                    path: base.to_string_lossy().to_string(),
                });
            }
        }

        Ok(Self {
            base: fs::canonicalize(base)?,
            verbose: false,
            collision: CollisionPolicy::default(),
            flatten: false,
        })
    }

    /// Report every path as it is written, plus summary counts.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn collision(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    /// Strip the directory shared by all members of a multi-member archive.
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Absolute base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Unpack one archive.
    ///
    /// Entry-level problems are sent to `reporter` and counted in the
    /// [`Report`]; they never stop the archive. Errors returned here mean
    /// the whole archive was abandoned: it could not be opened
    /// ([`Error::OpenFailed`], [`Error::UnknownFormat`]) or its folder
    /// could not be created ([`Error::PlanFailed`],
    /// [`Error::DestinationExists`]).
    ///
    /// The archive is read twice: once to count members and decide the
    /// destination, then again from a freshly opened file to write them.
    /// This costs a second decompression of tar archives but keeps memory
    /// flat; buffering contents would hold the whole archive in memory.
    pub fn extract(&self, archive: &Path, reporter: &mut dyn Reporter) -> Result<Outcome, Error> {
        let format = Format::detect(archive).ok_or_else(|| Error::UnknownFormat {
            archive: archive.display().to_string(),
        })?;

        let entries = survey(archive, format, reporter)?;
        let shown = reporter.emphasize(&archive.display().to_string());

        if entries.is_empty() {
            if self.verbose {
                reporter.line(&format!("{}: no members to unpack", shown));
            }
            return Ok(Outcome::SkippedEmpty);
        }

        let policy = DestinationPolicy::new(self.base.clone(), self.collision, self.flatten);
        let plan = policy.decide(archive, &entries)?;
        tracing::debug!(
            archive = %archive.display(),
            members = plan.member_count,
            root = %plan.destination_root.display(),
            prefix = %plan.common_prefix,
            "destination decided"
        );

        let target = match &plan.subfolder {
            Some(folder) => format!("{}/", folder),
            None => ".".to_string(),
        };
        if self.verbose {
            reporter.line(&format!(
                "{} ({}) -> {}",
                shown,
                count_noun(plan.member_count, "member"),
                target
            ));
        } else {
            reporter.line(&format!("{} -> {}", shown, target));
        }

        let report = self.unpack(archive, format, &plan, reporter)?;

        if self.verbose {
            reporter.line(&format!(
                "{}, {}, {} skipped",
                count_noun(report.files_extracted, "file"),
                count_noun(report.dirs_created, "dir"),
                report.entries_skipped + report.entries_rejected
            ));
        }

        Ok(Outcome::Done(report))
    }

    fn unpack(
        &self,
        archive: &Path,
        format: Format,
        plan: &ExtractionPlan,
        reporter: &mut dyn Reporter,
    ) -> Result<Report, Error> {
        let sanitizer = Sanitizer::new(
            &plan.destination_root,
            plan.strip_prefix().map(str::to_owned),
        )
        .map_err(|e| Error::PlanFailed {
            path: plan.destination_root.display().to_string(),
            detail: e.to_string(),
        })?;

        let mut handle = ArchiveHandle::open(archive, format)?;
        let mut report = Report {
            destination: plan.destination_root.clone(),
            ..Report::default()
        };
        let mut dir_modes: Vec<(PathBuf, u32)> = Vec::new();

        let scan = handle
            .for_each(|entry, content| {
                // Writing on would recreate the root from scratch
                if !sanitizer.root().is_dir() {
                    report.aborted = true;
                    reporter.problem(archive, &root_gone(sanitizer.root()));
                    return Flow::Stop;
                }

                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        reporter.problem(archive, &e);
                        return Flow::Continue;
                    }
                };

                let result = self.materialize(
                    &sanitizer,
                    plan,
                    &entry,
                    content,
                    &mut dir_modes,
                    &mut report,
                    reporter,
                );
                if let Err(e) = result {
                    match e {
                        Error::UnsupportedEntryType { .. } => report.entries_skipped += 1,
                        Error::PathEscape { .. } | Error::InvalidFilename { .. } => {
                            report.entries_rejected += 1
                        }
                        Error::ReadFailed { .. } => report.read_failures += 1,
                        _ => report.write_failures += 1,
                    }
                    reporter.problem(archive, &e);
                }
                Flow::Continue
            })
            .map_err(|e| Error::open_failed(archive, e))?;
        drop(handle);

        report.read_failures += scan.read_failures;
        if scan.truncated {
            reporter.problem(archive, &truncation_error());
        }

        if !report.aborted {
            apply_dir_modes(dir_modes, &mut report, archive, reporter);
        }
        Ok(report)
    }

    /// Write one entry.
    #[allow(clippy::too_many_arguments)]
    fn materialize(
        &self,
        sanitizer: &Sanitizer,
        plan: &ExtractionPlan,
        entry: &Entry,
        content: Option<&mut dyn Read>,
        dir_modes: &mut Vec<(PathBuf, u32)>,
        report: &mut Report,
        reporter: &mut dyn Reporter,
    ) -> Result<(), Error> {
        match &entry.kind {
            EntryKind::File | EntryKind::Directory => {}
            other => {
                return Err(Error::UnsupportedEntryType {
                    entry: entry.name.clone(),
                    entry_type: other.describe(),
                })
            }
        }

        let Some(target) = sanitizer.resolve(&entry.name)? else {
            if entry.kind == EntryKind::Directory {
                // The root itself (`./`, or the flattened shared directory)
                tracing::trace!(entry = %entry.name, "directory names the destination root");
                return Ok(());
            }
            return Err(Error::InvalidFilename {
                entry: entry.name.clone(),
                reason: "names the destination root, not a file".into(),
            });
        };

        match entry.kind {
            EntryKind::Directory => {
                fs::create_dir_all(&target.absolute)
                    .map_err(|e| Error::write_failed(&target.absolute, e))?;
                if let Some(mode) = entry.mode {
                    dir_modes.push((target.absolute.clone(), mode));
                }
                report.dirs_created += 1;
                if self.verbose {
                    reporter.line(&format!("  {}/", plan.display(&target.relative)));
                }
            }
            _ => {
                let written = write_file(&target, entry, content)?;
                report.files_extracted += 1;
                report.bytes_written += written;
                if self.verbose {
                    reporter.line(&format!("  {}", plan.display(&target.relative)));
                }
            }
        }

        tracing::trace!(entry = %entry.name, path = %target.absolute.display(), "materialized");
        Ok(())
    }
}

/// First pass: read every member's metadata.
///
/// Read failures seen here come back in the second pass, so they are only
/// reported now when there will be no second pass. An archive that yields
/// failures and no entries at all is unreadable, not empty.
fn survey(archive: &Path, format: Format, reporter: &mut dyn Reporter) -> Result<Vec<Entry>, Error> {
    let mut handle = ArchiveHandle::open(archive, format)?;
    let mut entries = Vec::new();
    let mut failures = Vec::new();

    let scan = handle
        .scan(|entry| {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => failures.push(e),
            }
            Flow::Continue
        })
        .map_err(|e| Error::open_failed(archive, e))?;

    if entries.is_empty() && scan.read_failures > 0 {
        for failure in &failures {
            reporter.problem(archive, failure);
        }
        if scan.truncated {
            reporter.problem(archive, &truncation_error());
        }
        return Err(Error::open_failed(archive, "no member could be read"));
    }

    Ok(entries)
}

fn root_gone(root: &Path) -> Error {
    Error::write_failed(
        root,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "destination root is gone; abandoning the rest of the archive",
        ),
    )
}

fn truncation_error() -> Error {
    Error::read_failed(
        None,
        "archive stream unreadable after consecutive bad entries; stopped early",
    )
}

/// Create or truncate the file and copy the entry's content into it.
fn write_file(target: &SafePath, entry: &Entry, content: Option<&mut dyn Read>) -> Result<u64, Error> {
    let path = &target.absolute;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::write_failed(parent, e))?;
    }

    // Never write through a symlink that is already on disk
    if let Ok(m) = fs::symlink_metadata(path) {
        if m.file_type().is_symlink() {
            fs::remove_file(path).map_err(|e| Error::write_failed(path, e))?;
        }
    }

    let mut outfile = fs::File::create(path).map_err(|e| Error::write_failed(path, e))?;
    let written = match content {
        Some(reader) => {
            let copied = copy_content(reader, &mut outfile, path, &entry.name)
                .and_then(|written| check_size(written, entry));
            match copied {
                Ok(written) => written,
                Err(e) => {
                    drop(outfile);
                    let _ = fs::remove_file(path);
                    return Err(e);
                }
            }
        }
        None => 0,
    };

    #[cfg(unix)]
    if let Some(mode) = entry.mode {
        use std::os::unix::fs::PermissionsExt;
        // Strip setuid, setgid and sticky bits
        let safe_mode = mode & 0o0777;
        fs::set_permissions(path, fs::Permissions::from_mode(safe_mode))
            .map_err(|e| Error::write_failed(path, e))?;
    }

    Ok(written)
}

/// Copy `reader` into `writer`, keeping read and write failures apart.
fn copy_content<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
    path: &Path,
    name: &str,
) -> Result<u64, Error> {
    let mut total = 0u64;
    let mut buf = [0u8; 8192];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read_failed(Some(name), e)),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| Error::write_failed(path, e))?;
        total += n as u64;
    }

    Ok(total)
}

/// A member whose content stops short of its recorded size was cut off.
fn check_size(written: u64, entry: &Entry) -> Result<u64, Error> {
    if written == entry.size {
        Ok(written)
    } else {
        Err(Error::read_failed(
            Some(&entry.name),
            format!("content ends after {} of {} bytes", written, entry.size),
        ))
    }
}

/// Directory modes go on last, deepest first, so a read-only directory
/// does not stop its own children from being written.
fn apply_dir_modes(
    mut dir_modes: Vec<(PathBuf, u32)>,
    report: &mut Report,
    archive: &Path,
    reporter: &mut dyn Reporter,
) {
    dir_modes.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));

    for (path, mode) in dir_modes {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(mode & 0o0777)) {
                report.write_failures += 1;
                reporter.problem(archive, &Error::write_failed(&path, e));
            }
        }
        #[cfg(not(unix))]
        let _ = (&path, mode, &report, archive, &reporter);
    }
}
