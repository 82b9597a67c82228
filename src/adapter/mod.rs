//! Archive format adapters.
//!
//! Adapters normalize different archive formats into one walk over
//! [`Entry`] values, so the lister and extractor never look at formats.

mod tar_adapter;
mod zip_adapter;

pub use tar_adapter::TarAdapter;
pub use zip_adapter::ZipAdapter;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::entry::Entry;
use crate::error::Error;
use crate::format::Format;

/// Returned by walk callbacks to keep going or stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Counters from one walk over an archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scan {
    /// Entries read successfully.
    pub entries: usize,
    /// Headers or contents that could not be decoded.
    pub read_failures: usize,
    /// The walk gave up early because the stream looked desynchronized.
    pub truncated: bool,
}

/// An open archive: the file plus any decompressor stacked on it.
///
/// Dropping the handle releases everything; the decompressor is dropped
/// before the file it wraps.
pub enum ArchiveHandle {
    Zip(ZipAdapter<BufReader<File>>),
    Tar(TarAdapter<Box<dyn Read>>),
}

impl ArchiveHandle {
    /// Open `path` as `format`.
    ///
    /// For compressed tars the decoder is primed by buffering its first
    /// block, so a corrupt gzip/bzip2/xz header is an open failure rather
    /// than a read failure on the first entry.
    pub fn open(path: &Path, format: Format) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::open_failed(path, e))?;
        let reader = BufReader::new(file);

        let handle = match format {
            Format::Zip => {
                let adapter = ZipAdapter::new(reader).map_err(|e| match e {
                    Error::Zip(z) => Error::open_failed(path, z),
                    other => other,
                })?;
                Self::Zip(adapter)
            }
            Format::Tar => Self::Tar(TarAdapter::new(Box::new(reader))),
            Format::TarGzip => Self::Tar(TarAdapter::new(
                prime(GzDecoder::new(reader)).map_err(|e| Error::open_failed(path, e))?,
            )),
            Format::TarBzip2 => Self::Tar(TarAdapter::new(
                prime(BzDecoder::new(reader)).map_err(|e| Error::open_failed(path, e))?,
            )),
            Format::TarXz => Self::Tar(TarAdapter::new(
                prime(XzDecoder::new(reader)).map_err(|e| Error::open_failed(path, e))?,
            )),
        };

        tracing::debug!(archive = %path.display(), %format, "opened archive");
        Ok(handle)
    }

    /// Walk entries without touching their content.
    pub fn scan<F>(&mut self, mut callback: F) -> Result<Scan, Error>
    where
        F: FnMut(Result<Entry, Error>) -> Flow,
    {
        self.walk(false, |entry, _| callback(entry))
    }

    /// Walk entries, handing each regular file's content to the callback.
    pub fn for_each<F>(&mut self, callback: F) -> Result<Scan, Error>
    where
        F: FnMut(Result<Entry, Error>, Option<&mut dyn Read>) -> Flow,
    {
        self.walk(true, callback)
    }

    fn walk<F>(&mut self, want_content: bool, callback: F) -> Result<Scan, Error>
    where
        F: FnMut(Result<Entry, Error>, Option<&mut dyn Read>) -> Flow,
    {
        match self {
            Self::Zip(adapter) => adapter.for_each(want_content, callback),
            Self::Tar(adapter) => adapter.for_each(want_content, callback),
        }
    }
}

fn prime<R: Read + 'static>(decoder: R) -> std::io::Result<Box<dyn Read>> {
    let mut buffered = BufReader::new(decoder);
    buffered.fill_buf()?;
    Ok(Box::new(buffered))
}
