//! Format-agnostic archive members.

/// What kind of filesystem object an entry describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink { target: String },
    Hardlink { target: String },
    /// Device files, fifos and anything else; carries a human-readable type name.
    Other(String),
}

impl EntryKind {
    /// Human-readable name used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::File => "regular file".into(),
            Self::Directory => "directory".into(),
            Self::Symlink { target } if target.is_empty() => "symbolic link".into(),
            Self::Symlink { target } => format!("symbolic link -> {}", target),
            Self::Hardlink { target } => format!("hard link -> {}", target),
            Self::Other(name) => name.clone(),
        }
    }
}

/// One archive member, as read from the archive. Never mutated after reading.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Raw archive-relative name; untrusted.
    pub name: String,
    pub kind: EntryKind,
    /// Permission bits as recorded, if the archive has them.
    pub mode: Option<u32>,
    pub size: u64,
}
