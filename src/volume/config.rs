//! Configuration for split archives.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Smallest allowed split size.
pub const MIN_SPLIT_SIZE: u64 = 64 * 1024;

/// Configuration for split archives.
///
/// A split archive named `backup.zip` with three volumes is stored as
/// `backup.z01`, `backup.z02` and `backup.zip`; the last volume always
/// carries the `.zip` extension and holds the central directory.
///
/// # Example
///
/// ```rust
/// use zipkit::volume::VolumeConfig;
///
/// let config = VolumeConfig::new("archive.zip", 100 * 1024 * 1024).unwrap();
/// assert_eq!(config.volume_path(1).to_str().unwrap(), "archive.z01");
/// assert_eq!(config.volume_path(12).to_str().unwrap(), "archive.z12");
/// assert_eq!(config.final_path().to_str().unwrap(), "archive.zip");
/// ```
#[derive(Debug, Clone)]
pub struct VolumeConfig {
    split_size: u64,
    base_path: PathBuf,
}

impl VolumeConfig {
    /// Creates a new split configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the final `.zip` volume
    /// * `split_size` - Maximum size of each volume in bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSplitSize`] if `split_size` is below
    /// [`MIN_SPLIT_SIZE`].
    pub fn new(path: impl AsRef<Path>, split_size: u64) -> Result<Self> {
        if split_size < MIN_SPLIT_SIZE {
            return Err(Error::InvalidSplitSize {
                size: split_size,
                minimum: MIN_SPLIT_SIZE,
            });
        }
        Ok(Self {
            split_size,
            base_path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the path of the final volume.
    pub fn final_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path of a non-final volume (1-indexed): `name.z01`, `name.z02`, ...
    pub fn volume_path(&self, volume_number: u32) -> PathBuf {
        split_volume_path(&self.base_path, volume_number)
    }

    /// Returns the maximum volume size in bytes.
    pub fn split_size(&self) -> u64 {
        self.split_size
    }
}

/// Builds the `.zNN` path of a non-final volume.
pub(crate) fn split_volume_path(base: &Path, volume_number: u32) -> PathBuf {
    base.with_extension(format!("z{:02}", volume_number))
}

/// Returns the `.zip` path for a path naming any volume of a split archive.
pub(crate) fn final_volume_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if is_split_extension(ext) => path.with_extension("zip"),
        _ => path.to_path_buf(),
    }
}

fn is_split_extension(ext: &str) -> bool {
    let digits = ext.strip_prefix('z').or_else(|| ext.strip_prefix('Z'));
    matches!(digits, Some(d) if d.len() >= 2 && d.chars().all(|c| c.is_ascii_digit()))
}
