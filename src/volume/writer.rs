//! Split archive writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::{ArchiveSink, VolumeConfig};
use crate::format::SPLIT_ARCHIVE_SIGNATURE;
use crate::{Error, Result};

/// A writer that splits output across `.z01`, `.z02`, ... volume files.
///
/// A new volume starts when the current one reaches the configured size.
/// The first volume begins with the split archive marker. When the writer
/// is finished the last volume is renamed to the configured `.zip` path.
///
/// # Example
///
/// ```rust,no_run
/// use std::io::Write;
/// use zipkit::volume::{ArchiveSink, MultiVolumeWriter, VolumeConfig};
///
/// # fn main() -> zipkit::Result<()> {
/// let config = VolumeConfig::new("archive.zip", 64 * 1024)?;
/// let mut writer = MultiVolumeWriter::create(config)?;
/// writer.write_all(&vec![0u8; 200_000])?;
/// let sizes = writer.finish_volumes()?;
/// println!("Created {} volumes", sizes.len());
/// # Ok(())
/// # }
/// ```
pub struct MultiVolumeWriter {
    config: VolumeConfig,
    current_file: Option<BufWriter<File>>,
    /// Current volume number (1-indexed).
    current_volume: u32,
    current_volume_written: u64,
    completed_sizes: Vec<u64>,
    finished: bool,
}

impl MultiVolumeWriter {
    /// Creates the first volume and writes the split archive marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the first volume file cannot be created.
    pub fn create(config: VolumeConfig) -> Result<Self> {
        let path = config.volume_path(1);
        let file = create_volume(&path)?;

        let mut writer = Self {
            config,
            current_file: Some(BufWriter::new(file)),
            current_volume: 1,
            current_volume_written: 0,
            completed_sizes: Vec::new(),
            finished: false,
        };
        writer.write_record(&SPLIT_ARCHIVE_SIGNATURE.to_le_bytes())?;
        Ok(writer)
    }

    fn open_next_volume(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current_file.take() {
            file.flush()?;
            self.completed_sizes.push(self.current_volume_written);
        }

        self.current_volume += 1;
        let path = self.config.volume_path(self.current_volume);
        log::debug!("starting volume {}", path.display());
        let file = create_volume(&path).map_err(io::Error::from)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_volume_written = 0;
        Ok(())
    }

    fn file(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.current_file
            .as_mut()
            .ok_or_else(|| io::Error::from(Error::WriterClosed))
    }

    /// Returns the current volume number (1-indexed).
    pub fn current_volume(&self) -> u32 {
        self.current_volume
    }

    /// Returns the remaining space in the current volume.
    pub fn remaining_in_volume(&self) -> u64 {
        self.config
            .split_size()
            .saturating_sub(self.current_volume_written)
    }

    /// Returns the path the current volume is being written to.
    pub fn current_volume_path(&self) -> PathBuf {
        self.config.volume_path(self.current_volume)
    }
}

fn create_volume(path: &std::path::Path) -> Result<File> {
    File::create(path).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("Failed to create volume {}: {}", path.display(), e),
        ))
    })
}

impl Write for MultiVolumeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.finished {
            return Err(Error::WriterClosed.into());
        }

        if self.remaining_in_volume() == 0 {
            self.open_next_volume()?;
        }

        let to_write = buf.len().min(self.remaining_in_volume() as usize);
        let n = self.file()?.write(&buf[..to_write])?;
        self.current_volume_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current_file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl ArchiveSink for MultiVolumeWriter {
    type Inner = ();

    fn position(&self) -> (u32, u64) {
        (self.current_volume - 1, self.current_volume_written)
    }

    fn reserve(&mut self, len: u64) -> io::Result<(u32, u64)> {
        if self.finished {
            return Err(Error::WriterClosed.into());
        }
        // Records larger than a whole volume still go out in one piece.
        if len > self.remaining_in_volume() && self.current_volume_written > 0 {
            self.open_next_volume()?;
        }
        Ok(self.position())
    }

    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        if self.finished {
            return Err(Error::WriterClosed.into());
        }
        self.file()?.write_all(record)?;
        self.current_volume_written += record.len() as u64;
        Ok(())
    }

    fn finish_volumes(&mut self) -> io::Result<Vec<u64>> {
        if self.finished {
            return Ok(self.completed_sizes.clone());
        }
        if let Some(mut file) = self.current_file.take() {
            file.flush()?;
            self.completed_sizes.push(self.current_volume_written);
        }
        self.finished = true;

        let last = self.config.volume_path(self.current_volume);
        std::fs::rename(&last, self.config.final_path())?;
        log::debug!(
            "finished split archive {} with {} volumes",
            self.config.final_path().display(),
            self.completed_sizes.len()
        );
        Ok(self.completed_sizes.clone())
    }

    fn into_inner(self) {}
}

impl std::fmt::Debug for MultiVolumeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiVolumeWriter")
            .field("config", &self.config)
            .field("current_volume", &self.current_volume)
            .field("current_volume_written", &self.current_volume_written)
            .finish_non_exhaustive()
    }
}
