//! Archive fixtures built in memory.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::FileOptions;

/// One member of a fixture archive.
pub enum Member<'a> {
    File(&'a str, &'a [u8]),
    FileMode(&'a str, &'a [u8], u32),
    Dir(&'a str),
    DirMode(&'a str, u32),
    Symlink(&'a str, &'a str),
    Hardlink(&'a str, &'a str),
    Fifo(&'a str),
    /// Regular file whose name is written straight into the header bytes,
    /// bypassing the tar crate's own path checks.
    RawName(&'a str, &'a [u8]),
}

/// Build an uncompressed tar.
pub fn tar_bytes(members: &[Member]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for member in members {
        let mut header = tar::Header::new_gnu();
        match member {
            Member::File(name, content) | Member::FileMode(name, content, _) => {
                let mode = match member {
                    Member::FileMode(_, _, mode) => *mode,
                    _ => 0o644,
                };
                header.set_path(name).unwrap();
                header.set_size(content.len() as u64);
                header.set_mode(mode);
                header.set_cksum();
                builder.append(&header, *content).unwrap();
            }
            Member::Dir(name) | Member::DirMode(name, _) => {
                let mode = match member {
                    Member::DirMode(_, mode) => *mode,
                    _ => 0o755,
                };
                header.set_path(name).unwrap();
                header.set_size(0);
                header.set_mode(mode);
                header.set_entry_type(tar::EntryType::Directory);
                header.set_cksum();
                builder.append(&header, &[][..]).unwrap();
            }
            Member::Symlink(name, target) | Member::Hardlink(name, target) => {
                let kind = match member {
                    Member::Symlink(..) => tar::EntryType::Symlink,
                    _ => tar::EntryType::Link,
                };
                header.set_path(name).unwrap();
                header.set_size(0);
                header.set_mode(0o777);
                header.set_entry_type(kind);
                header.set_link_name(target).unwrap();
                header.set_cksum();
                builder.append(&header, &[][..]).unwrap();
            }
            Member::Fifo(name) => {
                header.set_path(name).unwrap();
                header.set_size(0);
                header.set_mode(0o644);
                header.set_entry_type(tar::EntryType::Fifo);
                header.set_cksum();
                builder.append(&header, &[][..]).unwrap();
            }
            Member::RawName(name, content) => {
                header.set_path("placeholder").unwrap();
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                let raw = name.as_bytes();
                header.as_mut_bytes()[..100].fill(0);
                header.as_mut_bytes()[..raw.len()].copy_from_slice(raw);
                header.set_cksum();
                builder.append(&header, *content).unwrap();
            }
        }
    }

    builder.into_inner().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn xz(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Build a zip. Only files and directories are supported.
pub fn zip_bytes(members: &[Member]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options: FileOptions<()> = FileOptions::default();

    for member in members {
        match member {
            Member::File(name, content) | Member::RawName(name, content) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
            Member::FileMode(name, content, mode) => {
                zip.start_file(*name, options.unix_permissions(*mode)).unwrap();
                zip.write_all(content).unwrap();
            }
            Member::Dir(name) | Member::DirMode(name, _) => {
                zip.add_directory(*name, options).unwrap();
            }
            _ => panic!("zip fixtures only hold files and directories"),
        }
    }

    zip.finish().unwrap().into_inner()
}

/// Write `bytes` as `dir/name` and return the path.
pub fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Sorted names directly inside `dir`.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
