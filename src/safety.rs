//! Path validation for safe extraction.
//!
//! Entry names come from untrusted archives. Before anything is written to
//! disk, each name is resolved against the destination directory and
//! rejected if it would land outside of it.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Policy for validating extraction paths.
///
/// The default is `Strict`, which blocks any potential path traversal.
///
/// # Examples
///
/// ```rust
/// use zipkit::safety::PathSafety;
///
/// let policy = PathSafety::default();
/// assert_eq!(policy, PathSafety::Strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathSafety {
    /// Strict validation: block any potential path traversal.
    ///
    /// - Rejects names containing `..` components
    /// - Rejects absolute names (leading `/`, `\` or a drive letter)
    /// - Verifies that the resolved path stays within the destination,
    ///   following symbolic links already present on disk
    #[default]
    Strict,
    /// Rejects `..` components and absolute names without resolving links on disk.
    Relaxed,
    /// Disables all path validation (DANGEROUS).
    ///
    /// A malicious archive can then overwrite any file the process has
    /// permission to write. Only use this for archives you created yourself.
    Disabled,
}

/// Splits an entry name into its path segments.
///
/// Both `/` and `\` are treated as separators; empty and `.` segments are
/// dropped.
fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

fn is_absolute_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.starts_with('/')
        || name.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Validates an extraction path against the given safety policy.
///
/// # Arguments
///
/// * `entry_name` - The name stored in the archive
/// * `dest_root` - The destination directory for extraction
/// * `policy` - The path safety policy to enforce
/// * `entry_index` - The index of the entry being validated (for error reporting)
///
/// # Returns
///
/// The full path to extract to, or [`Error::PathTraversal`] if validation fails.
pub fn validate_extract_path(
    entry_name: &str,
    dest_root: &Path,
    policy: PathSafety,
    entry_index: usize,
) -> Result<PathBuf> {
    let traversal = || Error::PathTraversal {
        entry_index,
        path: entry_name.to_string(),
    };

    if policy == PathSafety::Disabled {
        return Ok(dest_root.join(entry_name.trim_end_matches('/')));
    }

    if is_absolute_name(entry_name) || segments(entry_name).any(|s| s == "..") {
        return Err(traversal());
    }

    let mut full_path = dest_root.to_path_buf();
    for segment in segments(entry_name) {
        full_path.push(segment);
    }

    if policy == PathSafety::Relaxed {
        return Ok(full_path);
    }

    // Resolve the deepest existing ancestor so that symlinks already on disk
    // cannot redirect the write outside the destination.
    let canonical_dest = dest_root.canonicalize()?;
    let mut ancestor = full_path.as_path();
    let mut pending = Vec::new();
    while !ancestor.exists() {
        match (ancestor.file_name(), ancestor.parent()) {
            (Some(name), Some(parent)) => {
                pending.push(name.to_os_string());
                ancestor = parent;
            }
            _ => return Err(traversal()),
        }
    }

    let mut resolved = ancestor.canonicalize()?;
    for name in pending.into_iter().rev() {
        resolved.push(name);
    }

    if resolved
        .components()
        .any(|c| matches!(c, Component::ParentDir))
        || !resolved.starts_with(&canonical_dest)
    {
        return Err(traversal());
    }

    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_simple_path_accepted() {
        let dir = TempDir::new().unwrap();
        let path =
            validate_extract_path("a/b/c.txt", dir.path(), PathSafety::Strict, 0).unwrap();
        assert_eq!(path, dir.path().join("a").join("b").join("c.txt"));
    }

    #[test]
    fn test_directory_entry_accepted() {
        let dir = TempDir::new().unwrap();
        let path = validate_extract_path("folder/", dir.path(), PathSafety::Strict, 0).unwrap();
        assert_eq!(path, dir.path().join("folder"));
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        for name in ["../evil.txt", "a/../../evil.txt", "a\\..\\..\\evil.txt"] {
            let err = validate_extract_path(name, dir.path(), PathSafety::Strict, 7).unwrap_err();
            assert!(
                matches!(err, Error::PathTraversal { entry_index: 7, ref path } if path == name)
            );
        }
    }

    #[test]
    fn test_absolute_rejected() {
        let dir = TempDir::new().unwrap();
        for name in ["/etc/passwd", "\\windows\\system32", "C:/boot.ini"] {
            assert!(validate_extract_path(name, dir.path(), PathSafety::Strict, 0).is_err());
            assert!(validate_extract_path(name, dir.path(), PathSafety::Relaxed, 0).is_err());
        }
    }

    #[test]
    fn test_disabled_allows_anything() {
        let dir = TempDir::new().unwrap();
        assert!(validate_extract_path("../x", dir.path(), PathSafety::Disabled, 0).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err =
            validate_extract_path("link/file.txt", dir.path(), PathSafety::Strict, 0).unwrap_err();
        assert!(err.is_security_error());
        assert!(validate_extract_path("link/file.txt", dir.path(), PathSafety::Relaxed, 0).is_ok());
    }
}
