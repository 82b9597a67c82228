//! ZIP archive adapter.

use std::io::{Read, Seek};

use crate::adapter::{Flow, Scan};
use crate::entry::{Entry, EntryKind};
use crate::error::Error;

/// Adapter for ZIP archives.
///
/// The central directory is read eagerly when the adapter is created, so
/// a truncated or non-zip file fails here rather than mid-walk.
pub struct ZipAdapter<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipAdapter<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        Ok(Self {
            archive: zip::ZipArchive::new(reader)?,
        })
    }

    /// Walk every entry by index.
    ///
    /// Metadata comes from the raw record so that listing never needs to
    /// decompress. The decompressing reader is only opened for regular
    /// files when `want_content` is set; if that fails (encrypted entry,
    /// unsupported method) the entry is reported as a read failure.
    pub fn for_each<F>(&mut self, want_content: bool, mut callback: F) -> Result<Scan, Error>
    where
        F: FnMut(Result<Entry, Error>, Option<&mut dyn Read>) -> Flow,
    {
        let mut scan = Scan::default();

        for index in 0..self.archive.len() {
            let info = match self.archive.by_index_raw(index) {
                Ok(file) => Entry {
                    name: file.name().to_string(),
                    size: file.size(),
                    mode: file.unix_mode(),
                    kind: kind_of(file.is_dir(), file.is_symlink(), file.unix_mode()),
                },
                Err(e) => {
                    scan.read_failures += 1;
                    let detail = format!("entry #{}: {}", index, e);
                    if callback(Err(Error::read_failed(None, detail)), None) == Flow::Stop {
                        break;
                    }
                    continue;
                }
            };
            scan.entries += 1;

            let flow = if want_content && info.kind == EntryKind::File {
                match self.archive.by_index(index) {
                    Ok(mut file) => callback(Ok(info), Some(&mut file as &mut dyn Read)),
                    Err(e) => {
                        scan.read_failures += 1;
                        callback(Err(Error::read_failed(Some(&info.name), e)), None)
                    }
                }
            } else {
                callback(Ok(info), None)
            };

            if flow == Flow::Stop {
                break;
            }
        }

        Ok(scan)
    }
}

const S_IFMT: u32 = 0o170_000;
const S_IFIFO: u32 = 0o010_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFREG: u32 = 0o100_000;
const S_IFSOCK: u32 = 0o140_000;

/// Entry kind from the zip flags plus the file type bits of a Unix mode.
fn kind_of(is_dir: bool, is_symlink: bool, mode: Option<u32>) -> EntryKind {
    if is_dir {
        return EntryKind::Directory;
    }
    if is_symlink {
        // Target is stored as content; not read for a member that is skipped anyway
        return EntryKind::Symlink {
            target: String::new(),
        };
    }

    match mode.map(|m| m & S_IFMT) {
        None | Some(0) | Some(S_IFREG) => EntryKind::File,
        Some(S_IFDIR) => EntryKind::Directory,
        Some(S_IFIFO) => EntryKind::Other("fifo (named pipe)".into()),
        Some(S_IFCHR) => EntryKind::Other("character device".into()),
        Some(S_IFBLK) => EntryKind::Other("block device".into()),
        Some(S_IFSOCK) => EntryKind::Other("socket".into()),
        Some(other) => EntryKind::Other(format!("unknown (mode 0o{:o})", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_from_flags_and_mode() {
        assert_eq!(kind_of(true, false, None), EntryKind::Directory);
        assert_eq!(kind_of(false, false, None), EntryKind::File);
        assert_eq!(kind_of(false, false, Some(0o100_644)), EntryKind::File);
        // Archivers that only store permission bits
        assert_eq!(kind_of(false, false, Some(0o644)), EntryKind::File);
        assert!(matches!(
            kind_of(false, true, Some(0o120_777)),
            EntryKind::Symlink { .. }
        ));
    }

    #[test]
    fn special_files_are_not_regular() {
        assert_eq!(
            kind_of(false, false, Some(0o010_644)),
            EntryKind::Other("fifo (named pipe)".into())
        );
        assert_eq!(
            kind_of(false, false, Some(0o020_600)),
            EntryKind::Other("character device".into())
        );
        assert_eq!(
            kind_of(false, false, Some(0o060_600)),
            EntryKind::Other("block device".into())
        );
        assert_eq!(
            kind_of(false, false, Some(0o140_755)),
            EntryKind::Other("socket".into())
        );
    }
}
