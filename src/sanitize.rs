//! Turning untrusted entry names into paths under a destination root.

use std::path::{Path, PathBuf};

use path_jail::Jail;

use crate::error::Error;

/// A write location that is known to stay inside the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath {
    /// Cleaned, `/`-separated path relative to the root.
    pub relative: String,
    /// `relative` joined onto the root.
    pub absolute: PathBuf,
}

/// Normalize an entry name lexically.
///
/// Backslashes become `/`, empty and `.` segments vanish and `..` removes
/// the previous segment. Absolute names and `..` that would climb above
/// the root are rejected. The result may be empty (`./` names the root).
pub fn clean_name(name: &str) -> Result<String, Error> {
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidFilename {
            entry: name.to_string(),
            reason: "contains control characters".into(),
        });
    }

    let unified = name.replace('\\', "/");
    if is_absolute(&unified) {
        return Err(Error::PathEscape {
            entry: name.to_string(),
            detail: "absolute path".into(),
        });
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::PathEscape {
                        entry: name.to_string(),
                        detail: "'..' climbs above the destination root".into(),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}

fn is_absolute(name: &str) -> bool {
    if name.starts_with('/') {
        return true;
    }
    // Drive letters (`C:` / `C:/...`) are absolute on Windows and never valid members
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Resolves entry names against one destination root.
pub struct Sanitizer {
    root: PathBuf,
    jail: Jail,
    strip_prefix: Option<String>,
}

impl Sanitizer {
    /// `root` must exist. `strip_prefix`, when set, is a cleaned
    /// directory path removed from the front of every name that starts
    /// with it.
    pub fn new(root: &Path, strip_prefix: Option<String>) -> Result<Self, Error> {
        let jail = Jail::new(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            jail,
            strip_prefix: strip_prefix.filter(|p| !p.is_empty()),
        })
    }

    /// Compute the write location for `name`.
    ///
    /// Returns `Ok(None)` when the name resolves to the root itself.
    pub fn resolve(&self, name: &str) -> Result<Option<SafePath>, Error> {
        let cleaned = clean_name(name)?;
        let relative = match &self.strip_prefix {
            Some(prefix) => strip_segments(&cleaned, prefix).unwrap_or(&cleaned),
            None => &cleaned,
        };
        if relative.is_empty() {
            return Ok(None);
        }

        // Lexical cleaning cannot see symlinks already on disk; the jail can.
        self.jail.join(relative).map_err(|e| Error::PathEscape {
            entry: name.to_string(),
            detail: e.to_string(),
        })?;

        Ok(Some(SafePath {
            relative: relative.to_string(),
            absolute: self.root.join(relative),
        }))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `path` with the leading segments in `prefix` removed, if it starts with them.
fn strip_segments<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_dots() {
        assert_eq!(clean_name("a/../b").unwrap(), "b");
        assert_eq!(clean_name("./a//b/./c").unwrap(), "a/b/c");
        assert_eq!(clean_name("dir/").unwrap(), "dir");
        assert_eq!(clean_name("./").unwrap(), "");
        assert_eq!(clean_name("a\\b").unwrap(), "a/b");
    }

    #[test]
    fn rejects_escapes() {
        assert!(matches!(clean_name("/etc/passwd"), Err(Error::PathEscape { .. })));
        assert!(matches!(clean_name("../../evil"), Err(Error::PathEscape { .. })));
        assert!(matches!(clean_name("a/../../evil"), Err(Error::PathEscape { .. })));
        assert!(matches!(clean_name("\\windows\\x"), Err(Error::PathEscape { .. })));
        assert!(matches!(clean_name("C:/x"), Err(Error::PathEscape { .. })));
    }

    #[test]
    fn rejects_control_characters() {
        assert!(matches!(
            clean_name("bad\0name"),
            Err(Error::InvalidFilename { .. })
        ));
    }

    #[test]
    fn strips_whole_segments_only() {
        assert_eq!(strip_segments("top/a.txt", "top"), Some("a.txt"));
        assert_eq!(strip_segments("top", "top"), Some(""));
        assert_eq!(strip_segments("topper/a.txt", "top"), None);
        assert_eq!(strip_segments("other/a.txt", "top"), None);
    }
}
