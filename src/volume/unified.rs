//! Unified reader that handles both single-file and split archives.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::config::final_volume_path;
use super::reader::has_split_volumes;
use super::{MultiVolumeReader, VolumeReader};
use crate::{Error, Result};

/// A reader that transparently handles both single-file and split archives.
///
/// Opening `name.zip` (or any `name.zNN`) reads a split archive when a
/// `name.z01` volume exists next to it, and a plain file otherwise.
pub enum UnifiedReader {
    /// Single-file archive reader.
    Single(BufReader<File>),
    /// Split archive reader.
    MultiVolume(MultiVolumeReader),
}

impl UnifiedReader {
    /// Opens an archive from a file path, auto-detecting split archives.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let final_path = final_volume_path(path);

        if has_split_volumes(&final_path) {
            let reader = MultiVolumeReader::open(&final_path)?;
            log::debug!(
                "opened split archive {} with {} volumes",
                final_path.display(),
                reader.volume_count()
            );
            return Ok(UnifiedReader::MultiVolume(reader));
        }

        let file = File::open(path).map_err(Error::Io)?;
        Ok(UnifiedReader::Single(BufReader::new(file)))
    }

    /// Returns true if this is a split archive.
    pub fn is_multivolume(&self) -> bool {
        matches!(self, UnifiedReader::MultiVolume(_))
    }

    /// Returns the volume count if this is a split archive.
    pub fn volume_count(&self) -> Option<u32> {
        match self {
            UnifiedReader::Single(_) => None,
            UnifiedReader::MultiVolume(r) => Some(r.volume_count()),
        }
    }

    /// Returns the size of each volume if this is a split archive.
    pub fn volume_sizes(&self) -> Option<&[u64]> {
        match self {
            UnifiedReader::Single(_) => None,
            UnifiedReader::MultiVolume(r) => Some(r.volume_sizes()),
        }
    }

    /// Returns the volume paths if this is a split archive.
    pub fn volume_paths(&self) -> Option<Vec<PathBuf>> {
        match self {
            UnifiedReader::Single(_) => None,
            UnifiedReader::MultiVolume(r) => Some(r.volume_paths().to_vec()),
        }
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            UnifiedReader::Single(r) => r.read(buf),
            UnifiedReader::MultiVolume(r) => r.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            UnifiedReader::Single(r) => r.seek(pos),
            UnifiedReader::MultiVolume(r) => r.seek(pos),
        }
    }
}

impl std::fmt::Debug for UnifiedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnifiedReader::Single(_) => f.debug_struct("UnifiedReader::Single").finish(),
            UnifiedReader::MultiVolume(r) => f
                .debug_struct("UnifiedReader::MultiVolume")
                .field("volume_count", &r.volume_count())
                .finish(),
        }
    }
}
