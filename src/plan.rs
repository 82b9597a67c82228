//! Deciding where an archive's members go.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::entry::{Entry, EntryKind};
use crate::error::Error;
use crate::format::folder_name;
use crate::prefix::common_prefix;
use crate::sanitize::clean_name;

/// What to do when a multi-member archive's folder name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Give up on the archive. Nothing is written.
    #[default]
    Error,
    /// Unpack into the existing directory, replacing files it holds.
    /// Anything other than a real directory is still an error.
    Reuse,
}

/// Where one archive's members are written.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub member_count: usize,
    /// Absolute directory every member lands under.
    pub destination_root: PathBuf,
    /// Folder made for a multi-member archive, relative to the base directory.
    pub subfolder: Option<String>,
    /// Directory shared by every member; empty when there is none.
    pub common_prefix: String,
    /// Strip `common_prefix` from member names.
    pub flatten: bool,
}

impl ExtractionPlan {
    /// Prefix to remove from every member, if flattening applies.
    pub fn strip_prefix(&self) -> Option<&str> {
        if self.flatten && !self.common_prefix.is_empty() {
            Some(&self.common_prefix)
        } else {
            None
        }
    }

    /// How a member's relative path is shown to the user.
    pub fn display(&self, relative: &str) -> String {
        match &self.subfolder {
            Some(folder) => format!("{}/{}", folder, relative),
            None => relative.to_string(),
        }
    }
}

/// Picks the destination root for an archive from its member count.
#[derive(Debug, Clone)]
pub struct DestinationPolicy {
    base: PathBuf,
    collision: CollisionPolicy,
    flatten: bool,
}

impl DestinationPolicy {
    /// `base` stands in for the current working directory and should be absolute.
    pub fn new(base: PathBuf, collision: CollisionPolicy, flatten: bool) -> Self {
        Self {
            base,
            collision,
            flatten,
        }
    }

    /// Build the plan for `archive` whose members are `entries`.
    ///
    /// One member goes straight into the base directory. Two or more go
    /// into a new folder named after the archive, which this creates.
    /// Callers handle the empty archive before asking for a plan.
    pub fn decide(&self, archive: &Path, entries: &[Entry]) -> Result<ExtractionPlan, Error> {
        let member_count = entries.len();

        if member_count <= 1 {
            return Ok(ExtractionPlan {
                member_count,
                destination_root: self.base.clone(),
                subfolder: None,
                common_prefix: String::new(),
                flatten: false,
            });
        }

        let folder = folder_name(archive).ok_or_else(|| Error::PlanFailed {
            path: archive.display().to_string(),
            detail: "archive name leaves nothing to name a folder after".into(),
        })?;
        let destination_root = self.base.join(&folder);
        self.create_folder(&destination_root)?;

        Ok(ExtractionPlan {
            member_count,
            destination_root,
            subfolder: Some(folder),
            common_prefix: shared_directory(entries),
            flatten: self.flatten,
        })
    }

    fn create_folder(&self, path: &Path) -> Result<(), Error> {
        match fs::create_dir(path) {
            Ok(()) => {
                tracing::debug!(folder = %path.display(), "created destination folder");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let is_real_dir = fs::symlink_metadata(path)
                    .map(|m| m.file_type().is_dir())
                    .unwrap_or(false);
                match self.collision {
                    CollisionPolicy::Reuse if is_real_dir => {
                        tracing::debug!(folder = %path.display(), "reusing existing folder");
                        Ok(())
                    }
                    CollisionPolicy::Reuse => Err(Error::PlanFailed {
                        path: path.display().to_string(),
                        detail: "exists and is not a directory".into(),
                    }),
                    CollisionPolicy::Error => Err(Error::DestinationExists {
                        path: path.display().to_string(),
                    }),
                }
            }
            Err(e) => Err(Error::PlanFailed {
                path: path.display().to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

/// Common directory of all cleanly named members.
///
/// A prefix that is the full name of a regular file is not a directory,
/// so it does not count.
fn shared_directory(entries: &[Entry]) -> String {
    let cleaned: Vec<(String, &EntryKind)> = entries
        .iter()
        .filter_map(|e| clean_name(&e.name).ok().map(|n| (n, &e.kind)))
        .collect();

    let prefix = common_prefix(cleaned.iter().map(|(n, _)| n.as_str()));
    let names_a_file = cleaned
        .iter()
        .any(|(n, kind)| **kind != EntryKind::Directory && *n == prefix);

    if names_a_file {
        String::new()
    } else {
        prefix
    }
}
