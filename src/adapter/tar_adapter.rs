//! TAR archive adapter.

use std::io::{self, Cursor, Read};

use crate::adapter::{Flow, Scan};
use crate::entry::{Entry, EntryKind};
use crate::error::Error;

const BLOCK: usize = 512;

/// Adapter for TAR archives, compressed or not.
///
/// TAR is a sequential format without a central directory, so entries
/// can only be read once, in order. A second pass means a new adapter
/// over a freshly opened file.
pub struct TarAdapter<R: Read> {
    reader: R,
}

/// Why one run of `tar::Archive` over the stream ended.
enum SegmentEnd {
    Finished,
    Stopped,
    HeaderFailed,
}

impl<R: Read> TarAdapter<R> {
    /// Create a new TarAdapter from an already decompressed reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Walk every entry in archive order.
    ///
    /// The callback gets either the entry or a `ReadFailed` error for a
    /// header that could not be decoded. Content is handed over only for
    /// regular files, and only when `want_content` is set.
    ///
    /// The tar reader gives up at the first bad header, so after one the
    /// stream is scanned block by block for the next valid header and a
    /// fresh reader picks up from there. Two read failures with no good
    /// entry in between end the walk and mark the scan truncated.
    pub fn for_each<F>(&mut self, want_content: bool, mut callback: F) -> Result<Scan, Error>
    where
        F: FnMut(Result<Entry, Error>, Option<&mut dyn Read>) -> Flow,
    {
        let mut scan = Scan::default();
        let mut consecutive_failures = 0;
        let mut pending: Vec<u8> = Vec::new();

        loop {
            let head = Cursor::new(std::mem::take(&mut pending));
            let mut archive = tar::Archive::new(head.chain(&mut self.reader));
            let end = walk_segment(
                &mut archive,
                want_content,
                &mut scan,
                &mut consecutive_failures,
                &mut callback,
            )?;
            drop(archive);

            match end {
                SegmentEnd::Finished | SegmentEnd::Stopped => break,
                SegmentEnd::HeaderFailed if consecutive_failures >= 2 => {
                    scan.truncated = true;
                    break;
                }
                SegmentEnd::HeaderFailed => {}
            }

            match resync(&mut self.reader) {
                Ok(Some(block)) => {
                    tracing::debug!("resynchronized on the next tar header");
                    pending = block.to_vec();
                }
                Ok(None) => break,
                Err(e) => {
                    scan.read_failures += 1;
                    callback(Err(Error::read_failed(None, e)), None);
                    scan.truncated = true;
                    break;
                }
            }
        }

        Ok(scan)
    }
}

fn walk_segment<S, F>(
    archive: &mut tar::Archive<S>,
    want_content: bool,
    scan: &mut Scan,
    consecutive_failures: &mut usize,
    callback: &mut F,
) -> Result<SegmentEnd, Error>
where
    S: Read,
    F: FnMut(Result<Entry, Error>, Option<&mut dyn Read>) -> Flow,
{
    let entries = archive
        .entries()
        .map_err(|e| Error::read_failed(None, e))?;

    for entry_result in entries {
        let mut entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                scan.read_failures += 1;
                *consecutive_failures += 1;
                if callback(Err(Error::read_failed(None, e)), None) == Flow::Stop {
                    return Ok(SegmentEnd::Stopped);
                }
                return Ok(SegmentEnd::HeaderFailed);
            }
        };
        *consecutive_failures = 0;

        let entry_type = entry.header().entry_type();
        // pax global headers carry metadata for the whole archive, not a member
        if entry_type == tar::EntryType::XGlobalHeader {
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let kind = match entry_type {
            tar::EntryType::Regular | tar::EntryType::Continuous => EntryKind::File,
            tar::EntryType::Directory => EntryKind::Directory,
            tar::EntryType::Symlink => EntryKind::Symlink {
                target: link_target(&entry),
            },
            tar::EntryType::Link => EntryKind::Hardlink {
                target: link_target(&entry),
            },
            other => EntryKind::Other(entry_type_name(other)),
        };

        let info = Entry {
            name,
            size: entry.size(),
            mode: entry.header().mode().ok(),
            kind,
        };
        scan.entries += 1;

        let flow = if want_content && info.kind == EntryKind::File {
            callback(Ok(info), Some(&mut entry as &mut dyn Read))
        } else {
            callback(Ok(info), None)
        };

        if flow == Flow::Stop {
            return Ok(SegmentEnd::Stopped);
        }
    }

    Ok(SegmentEnd::Finished)
}

/// Skip blocks until one carries a valid header checksum.
///
/// Returns `None` at a clean end of stream. A member's content can
/// happen to look like a header; the walk then resumes from there.
fn resync<R: Read>(reader: &mut R) -> io::Result<Option<[u8; BLOCK]>> {
    let mut block = [0u8; BLOCK];
    while read_block(reader, &mut block)? {
        if is_header(&block) {
            return Ok(Some(block));
        }
    }
    Ok(None)
}

/// Fill `block`. `false` means the stream ended exactly on a block boundary.
fn read_block<R: Read>(reader: &mut R, block: &mut [u8; BLOCK]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < BLOCK {
        match reader.read(&mut block[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive ends in the middle of a block",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Non-zero block whose checksum field matches its contents. The checksum
/// field itself counts as eight spaces.
fn is_header(block: &[u8; BLOCK]) -> bool {
    if block.iter().all(|&b| b == 0) {
        return false;
    }
    let Ok(expected) = tar::Header::from_byte_slice(block).cksum() else {
        return false;
    };
    let actual: u32 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if (148..156).contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(b)
            }
        })
        .sum();
    actual == expected
}

fn link_target<R: Read>(entry: &tar::Entry<'_, R>) -> String {
    entry
        .link_name_bytes()
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}

/// Convert TAR entry type to a human-readable name.
fn entry_type_name(entry_type: tar::EntryType) -> String {
    match entry_type {
        tar::EntryType::Char => "character device".into(),
        tar::EntryType::Block => "block device".into(),
        tar::EntryType::Fifo => "fifo (named pipe)".into(),
        tar::EntryType::GNUSparse => "GNU sparse file".into(),
        tar::EntryType::XHeader => "pax header".into(),
        _ => format!("unknown (0x{:02x})", entry_type.as_byte()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_block(name: &str) -> [u8; BLOCK] {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(0);
        header.set_cksum();
        let mut block = [0u8; BLOCK];
        block.copy_from_slice(header.as_bytes());
        block
    }

    #[test]
    fn recognizes_headers() {
        let block = header_block("a.txt");
        assert!(is_header(&block));
        assert!(!is_header(&[0u8; BLOCK]));

        let mut data = [0u8; BLOCK];
        data[0] = b'x';
        assert!(!is_header(&data));

        let mut damaged = block;
        damaged[0] ^= 0xff;
        assert!(!is_header(&damaged));
    }

    #[test]
    fn resync_skips_to_next_header() {
        let mut stream = vec![b'z'; BLOCK];
        stream.extend_from_slice(&header_block("next.txt"));
        let mut reader = Cursor::new(stream);

        let block = resync(&mut reader).unwrap().unwrap();
        assert_eq!(&block[..8], b"next.txt");
    }

    #[test]
    fn resync_at_end_of_stream() {
        let mut reader = Cursor::new(vec![0u8; BLOCK * 2]);
        assert!(resync(&mut reader).unwrap().is_none());

        let mut short = Cursor::new(vec![1u8; 100]);
        assert!(resync(&mut short).is_err());
    }
}
