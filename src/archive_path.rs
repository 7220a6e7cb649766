//! Archive path type with validation for entries added to an archive.

use std::fmt;
use std::path::{Component, Path};

use crate::{Error, Result};

/// Maximum length for archive paths (in bytes).
///
/// The file name length field of ZIP headers is 16 bits wide.
const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// A validated path for an entry written into an archive.
///
/// `ArchivePath` normalizes separators to forward slashes and validates that:
/// - No NUL bytes are present
/// - The path is not absolute (does not start with `/` or a drive letter)
/// - No empty segments exist (no `//`)
/// - No `.` or `..` segments are present (prevents path traversal)
///
/// A single trailing `/` is accepted and dropped; whether an entry is a
/// directory is decided by how it is added, not by its path.
///
/// # Examples
///
/// ```
/// use zipkit::ArchivePath;
///
/// let path = ArchivePath::new("dir\\file.txt").unwrap();
/// assert_eq!(path.as_str(), "dir/file.txt");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, normalizing and validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path:
    /// - Is empty or longer than 65535 bytes
    /// - Contains NUL bytes
    /// - Is absolute
    /// - Contains empty, `.` or `..` segments
    pub fn new(s: &str) -> Result<Self> {
        let normalized = s.replace('\\', "/");
        let normalized = normalized
            .strip_suffix('/')
            .map(str::to_string)
            .unwrap_or(normalized);
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Builds an archive path from a filesystem path relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside `root`, or if the relative
    /// path contains components that are not plain names.
    pub fn from_relative_path(path: &Path, root: &Path) -> Result<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| Error::InvalidArchivePath {
                path: path.display().to_string(),
                reason: "not inside the source root",
            })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidArchivePath {
                        path: relative.display().to_string(),
                        reason: "relative path contains a non-name component",
                    });
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    /// Validates an archive path string.
    fn validate(s: &str) -> Result<()> {
        let invalid = |reason| {
            Err(Error::InvalidArchivePath {
                path: s.to_string(),
                reason,
            })
        };

        if s.contains('\0') {
            return invalid("contains NUL byte");
        }
        if s.is_empty() {
            return invalid("empty path");
        }
        if s.len() > MAX_PATH_LENGTH {
            return invalid("path exceeds 65535 bytes");
        }
        if s.starts_with('/') || has_drive_prefix(s) {
            return invalid("absolute path not allowed");
        }

        for segment in s.split('/') {
            match segment {
                "" => return invalid("empty segment (consecutive slashes)"),
                "." => return invalid("'.' segment not allowed"),
                ".." => return invalid("'..' segment not allowed (path traversal)"),
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name stored in the archive for a directory entry (with a trailing `/`).
    pub fn to_directory_name(&self) -> String {
        format!("{}/", self.0)
    }

    /// Joins this path with another segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting path would be invalid.
    pub fn join(&self, other: &str) -> Result<Self> {
        Self::new(&format!("{}/{}", self.0, other))
    }

    /// Returns the parent directory of this path, if any.
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns an iterator over the path components (segments).
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns true if the path contains characters outside of ASCII.
    ///
    /// Such names are written with the UTF-8 general purpose flag.
    pub fn is_ascii(&self) -> bool {
        self.0.is_ascii()
    }
}

/// Returns true for paths like `C:/dir` or `c:`.
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}
