//! Archive format detection from file names.

use std::fmt;
use std::path::Path;

/// Container and compression layer of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Zip,
    Tar,
    TarGzip,
    TarBzip2,
    TarXz,
}

impl Format {
    /// Classify an archive by its file name, case-insensitively.
    ///
    /// Only the name is looked at; no magic bytes are read. An archive whose
    /// content does not match its name fails later, while reading.
    ///
    /// Any name containing `.tar.` that is not one of the known codecs is
    /// read as a plain tar stream. This is a permissive fallback for odd
    /// extensions (`.tar.0`, `.tar.part`), not a guess about the content.
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = file_name(path.as_ref()).to_lowercase();

        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tgz") {
            Some(Self::TarGzip)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.contains(".tar.gz") {
            Some(Self::TarGzip)
        } else if name.contains(".tar.bz2") {
            Some(Self::TarBzip2)
        } else if name.contains(".tar.xz") {
            Some(Self::TarXz)
        } else if name.contains(".tar.") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGzip => "tar+gzip",
            Self::TarBzip2 => "tar+bzip2",
            Self::TarXz => "tar+xz",
        };
        f.write_str(name)
    }
}

/// Name of the folder a multi-member archive unpacks into: the file name
/// with every recognized archive suffix stripped.
///
/// Returns `None` when nothing is left (an archive literally named `.zip`).
pub fn folder_name<P: AsRef<Path>>(path: P) -> Option<String> {
    let name = file_name(path.as_ref());
    let lower = name.to_lowercase();

    let cut = if let Some(pos) = lower.find(".tar.") {
        pos
    } else if lower.ends_with(".zip") || lower.ends_with(".tgz") || lower.ends_with(".tar") {
        name.len() - 4
    } else {
        name.len()
    };

    // Lowercasing can change byte lengths outside ASCII; only cut on a boundary.
    let stem = name.get(..cut).unwrap_or(&name);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
