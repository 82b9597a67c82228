use std::fmt;

/// How much of the work an error takes down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole archive is abandoned; the run moves on to the next one.
    Archive,
    /// Only the current entry is skipped.
    Entry,
}

/// Errors that can occur while listing or unpacking an archive.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in minor versions without breaking existing code. Always include a
/// catch-all `_ =>` arm when matching.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// File name does not carry a recognized archive suffix.
    UnknownFormat { archive: String },

    /// Archive file or its decompression layer could not be opened.
    OpenFailed { archive: String, detail: String },

    /// One entry's header or content could not be decoded.
    ReadFailed { entry: Option<String>, detail: String },

    /// Path is absolute or escapes the destination root (Zip Slip).
    PathEscape { entry: String, detail: String },

    /// Filename contains characters that can never be written.
    InvalidFilename { entry: String, reason: String },

    /// Symlink, hard link, device file, fifo, etc.
    UnsupportedEntryType { entry: String, entry_type: String },

    /// Subfolder for a multi-member archive already exists.
    DestinationExists { path: String },

    /// Subfolder for a multi-member archive could not be created.
    PlanFailed { path: String, detail: String },

    /// Creating a directory or writing a file failed.
    WriteFailed { path: String, source: std::io::Error },

    /// Base directory does not exist or is not a directory.
    DestinationNotFound { path: String },

    /// Zip format error.
    Zip(zip::result::ZipError),

    /// IO error (includes TAR format errors since tar crate uses io::Error).
    Io(std::io::Error),

    /// Path jail error.
    Jail(path_jail::JailError),
}

impl Error {
    /// Whether this error abandons the archive or just the entry.
    pub fn scope(&self) -> Scope {
        match self {
            Self::UnknownFormat { .. }
            | Self::OpenFailed { .. }
            | Self::DestinationExists { .. }
            | Self::PlanFailed { .. }
            | Self::DestinationNotFound { .. }
            | Self::Zip(_)
            | Self::Io(_)
            | Self::Jail(_) => Scope::Archive,
            Self::ReadFailed { .. }
            | Self::PathEscape { .. }
            | Self::InvalidFilename { .. }
            | Self::UnsupportedEntryType { .. }
            | Self::WriteFailed { .. } => Scope::Entry,
        }
    }

    pub(crate) fn open_failed(archive: &std::path::Path, detail: impl fmt::Display) -> Self {
        Self::OpenFailed {
            archive: archive.display().to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn read_failed(entry: Option<&str>, detail: impl fmt::Display) -> Self {
        Self::ReadFailed {
            entry: entry.map(str::to_owned),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn write_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat { archive } => {
                write!(
                    f,
                    "'{}' is not a recognized archive (expected .zip, .tar, .tgz or .tar.*)",
                    archive
                )
            }
            Self::OpenFailed { archive, detail } => {
                write!(f, "cannot open '{}': {}", archive, detail)
            }
            Self::ReadFailed { entry, detail } => match entry {
                Some(entry) => write!(f, "cannot read entry '{}': {}", entry, detail),
                None => write!(f, "cannot read entry: {}", detail),
            },
            Self::PathEscape { entry, detail } => {
                write!(f, "path '{}' escapes destination: {}", entry, detail)
            }
            Self::InvalidFilename { entry, reason } => {
                write!(f, "invalid filename '{}': {}", entry.escape_debug(), reason)
            }
            Self::UnsupportedEntryType { entry, entry_type } => {
                write!(
                    f,
                    "entry '{}' has unsupported type '{}' (skipped)",
                    entry, entry_type
                )
            }
            Self::DestinationExists { path } => {
                write!(
                    f,
                    "'{}' already exists (use --on-collision reuse to unpack into it)",
                    path
                )
            }
            Self::PlanFailed { path, detail } => {
                write!(f, "cannot create folder '{}': {}", path, detail)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "cannot write '{}': {}", path, source)
            }
            Self::DestinationNotFound { path } => {
                write!(f, "destination directory '{}' does not exist", path)
            }
            Self::Zip(e) => write!(f, "zip format error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Jail(e) => write!(f, "path validation error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFailed { source, .. } => Some(source),
            Self::Zip(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Jail(e) => Some(e),
            _ => None,
        }
    }
}

// Automatic conversions for ease of use
impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e)
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<path_jail::JailError> for Error {
    fn from(e: path_jail::JailError) -> Self {
        Self::Jail(e)
    }
}
