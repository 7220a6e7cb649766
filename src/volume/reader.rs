//! Split archive reader.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::config::{final_volume_path, split_volume_path};
use crate::format::eocd::find_eocd;
use crate::{Error, Result};

/// Trait for readers that can report volume information.
pub trait VolumeReader: Read + Seek {
    /// Returns the total number of volumes.
    fn volume_count(&self) -> u32;

    /// Returns the sizes of all volumes in bytes.
    fn volume_sizes(&self) -> &[u64];

    /// Returns the current volume number (1-indexed).
    fn current_volume(&self) -> u32;

    /// Returns the total logical size across all volumes.
    fn total_size(&self) -> u64;
}

/// A reader that presents the volumes of a split archive as one stream.
///
/// The logical stream is `name.z01`, `name.z02`, ... followed by `name.zip`.
/// Volume files are opened lazily as reads cross into them.
///
/// # Example
///
/// ```rust,no_run
/// use std::io::Read;
/// use zipkit::volume::{MultiVolumeReader, VolumeReader};
///
/// # fn main() -> zipkit::Result<()> {
/// let mut reader = MultiVolumeReader::open("archive.zip")?;
/// println!("Archive spans {} volumes", reader.volume_count());
///
/// let mut buffer = vec![0u8; 1024];
/// reader.read_exact(&mut buffer)?;
/// # Ok(())
/// # }
/// ```
pub struct MultiVolumeReader {
    /// Volume file handles (opened lazily).
    volumes: Vec<Option<BufReader<File>>>,
    volume_paths: Vec<PathBuf>,
    volume_sizes: Vec<u64>,
    /// Current position in the logical stream.
    position: u64,
    /// Current volume index (0-based).
    current_volume: usize,
    volume_position: u64,
    total_size: u64,
}

impl MultiVolumeReader {
    /// Opens a split archive.
    ///
    /// Accepts the path of the final `.zip` volume or of any `.zNN` volume.
    /// Sibling volumes are detected automatically and checked against the
    /// disk count recorded in the end of central directory record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeMissing`] if a volume the archive refers to
    /// does not exist, or [`Error::NotAZip`] if the final volume carries no
    /// end of central directory record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_volume_path(path.as_ref());
        let (mut volume_paths, mut volume_sizes) = detect_split_volumes(&final_path)?;

        let final_size = match std::fs::metadata(&final_path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Err(Error::VolumeMissing {
                    volume: volume_paths.len() as u32 + 1,
                    path: final_path.to_string_lossy().to_string(),
                    source: e,
                });
            }
        };

        let expected = expected_volume_count(&final_path)?;
        let found = volume_paths.len() as u32 + 1;
        if found < expected {
            let missing = found;
            let path = split_volume_path(&final_path, missing);
            return Err(Error::VolumeMissing {
                volume: missing,
                path: path.to_string_lossy().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "Volume file not found"),
            });
        }
        if found > expected {
            log::warn!(
                "found {} volumes but the archive records {}; ignoring the extra volumes",
                found,
                expected
            );
            volume_paths.truncate(expected as usize - 1);
            volume_sizes.truncate(expected as usize - 1);
        }

        volume_paths.push(final_path);
        volume_sizes.push(final_size);
        Ok(Self::from_volumes(volume_paths, volume_sizes))
    }

    fn from_volumes(volume_paths: Vec<PathBuf>, volume_sizes: Vec<u64>) -> Self {
        let total_size = volume_sizes.iter().sum();
        Self {
            volumes: volume_paths.iter().map(|_| None).collect(),
            volume_paths,
            volume_sizes,
            position: 0,
            current_volume: 0,
            volume_position: 0,
            total_size,
        }
    }

    /// Opens a volume file lazily.
    fn open_volume(&mut self, index: usize) -> Result<&mut BufReader<File>> {
        let slot = &mut self.volumes[index];
        if slot.is_none() {
            let path = &self.volume_paths[index];
            let file = File::open(path).map_err(|e| Error::VolumeMissing {
                volume: (index + 1) as u32,
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            *slot = Some(BufReader::new(file));
        }
        match slot {
            Some(reader) => Ok(reader),
            None => Err(Error::Io(io::Error::other("volume not open"))),
        }
    }

    /// Calculates volume index and offset for a logical position.
    fn position_to_volume(&self, pos: u64) -> (usize, u64) {
        let mut remaining = pos;
        for (i, &size) in self.volume_sizes.iter().enumerate() {
            if remaining < size {
                return (i, remaining);
            }
            remaining -= size;
        }
        let last = self.volume_sizes.len().saturating_sub(1);
        (last, self.volume_sizes.get(last).copied().unwrap_or(0))
    }

    /// Returns the paths of all volumes in logical order.
    pub fn volume_paths(&self) -> &[PathBuf] {
        &self.volume_paths
    }
}

/// Returns the `.zNN` volumes that exist next to `final_path`, in order.
fn detect_split_volumes(final_path: &Path) -> Result<(Vec<PathBuf>, Vec<u64>)> {
    let mut paths = Vec::new();
    let mut sizes = Vec::new();
    let mut volume_num = 1u32;

    loop {
        let volume_path = split_volume_path(final_path, volume_num);
        match std::fs::metadata(&volume_path) {
            Ok(meta) => {
                sizes.push(meta.len());
                paths.push(volume_path);
                volume_num += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(Error::Io(e)),
        }
    }

    Ok((paths, sizes))
}

/// Reads the disk count recorded at the end of the final volume.
fn expected_volume_count(final_path: &Path) -> Result<u32> {
    let mut file = BufReader::new(File::open(final_path)?);
    let location = find_eocd(&mut file)?;
    Ok(match location.zip64_locator {
        Some(locator) if location.eocd.needs_zip64() => locator.total_disks.max(1),
        _ => location.eocd.disk_number as u32 + 1,
    })
}

/// Returns true if `final_path` has a `.z01` sibling.
pub(crate) fn has_split_volumes(final_path: &Path) -> bool {
    split_volume_path(final_path, 1).exists()
}

impl Read for MultiVolumeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.total_size {
            return Ok(0);
        }

        let mut total_read = 0;

        while total_read < buf.len() && self.position < self.total_size {
            let remaining_in_volume =
                self.volume_sizes[self.current_volume] - self.volume_position;

            if remaining_in_volume == 0 {
                self.current_volume += 1;
                self.volume_position = 0;
                if self.current_volume >= self.volumes.len() {
                    break;
                }
                continue;
            }

            let to_read = (buf.len() - total_read).min(remaining_in_volume as usize);
            let seek_pos = self.volume_position;
            let current_vol = self.current_volume;

            let volume = self.open_volume(current_vol).map_err(io::Error::from)?;
            volume.seek(SeekFrom::Start(seek_pos))?;
            let n = volume.read(&mut buf[total_read..total_read + to_read])?;
            if n == 0 {
                // Volume shrank since it was measured
                break;
            }

            total_read += n;
            self.position += n as u64;
            self.volume_position += n as u64;
        }

        Ok(total_read)
    }
}

impl Seek for MultiVolumeReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(p) => self.total_size as i64 + p,
            SeekFrom::Current(p) => self.position as i64 + p,
        };

        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot seek before start of stream",
            ));
        }

        self.position = (new_pos as u64).min(self.total_size);
        let (vol_idx, vol_pos) = self.position_to_volume(self.position);
        self.current_volume = vol_idx;
        self.volume_position = vol_pos;

        Ok(self.position)
    }
}

impl VolumeReader for MultiVolumeReader {
    fn volume_count(&self) -> u32 {
        self.volume_sizes.len() as u32
    }

    fn volume_sizes(&self) -> &[u64] {
        &self.volume_sizes
    }

    fn current_volume(&self) -> u32 {
        (self.current_volume + 1) as u32
    }

    fn total_size(&self) -> u64 {
        self.total_size
    }
}

impl std::fmt::Debug for MultiVolumeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiVolumeReader")
            .field("volume_count", &self.volume_sizes.len())
            .field("total_size", &self.total_size)
            .field("position", &self.position)
            .field("current_volume", &(self.current_volume + 1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::eocd::EndOfCentralDirectory;
    use std::io::Write;
    use tempfile::TempDir;

    /// Writes `sizes.len() - 1` split volumes plus a final `.zip` whose
    /// tail is an EOCD record naming the last disk.
    fn create_test_volumes(dir: &Path, sizes: &[usize]) -> PathBuf {
        let final_path = dir.join("test.zip");
        let last = sizes.len() - 1;
        for (i, &size) in sizes[..last].iter().enumerate() {
            let mut file = File::create(split_volume_path(&final_path, i as u32 + 1)).unwrap();
            let data: Vec<u8> = (0..size).map(|j| ((i * 100 + j) % 256) as u8).collect();
            file.write_all(&data).unwrap();
        }

        let mut tail = vec![0xAAu8; sizes[last]];
        EndOfCentralDirectory {
            disk_number: last as u16,
            cd_start_disk: last as u16,
            ..Default::default()
        }
        .encode_into(&mut tail);
        std::fs::write(&final_path, tail).unwrap();
        final_path
    }

    #[test]
    fn test_open_split_archive() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[100, 100, 50]);

        let reader = MultiVolumeReader::open(&final_path).unwrap();
        assert_eq!(reader.volume_count(), 3);
        assert_eq!(reader.volume_sizes(), &[100, 100, 72]);
        assert_eq!(reader.total_size(), 272);
        assert_eq!(reader.volume_paths()[2], final_path);
    }

    #[test]
    fn test_open_by_split_volume_path() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[100, 10]);
        let reader = MultiVolumeReader::open(split_volume_path(&final_path, 1)).unwrap();
        assert_eq!(reader.volume_count(), 2);
    }

    #[test]
    fn test_read_across_volumes() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[10, 10, 0]);

        let mut reader = MultiVolumeReader::open(&final_path).unwrap();
        let mut buf = vec![0u8; 15];
        reader.read_exact(&mut buf).unwrap();

        let expected: Vec<u8> = (0..10)
            .map(|j| j as u8)
            .chain((0..5).map(|j| (100 + j) as u8))
            .collect();
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_seek_operations() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[100, 100, 0]);
        let mut reader = MultiVolumeReader::open(&final_path).unwrap();

        reader.seek(SeekFrom::Start(150)).unwrap();
        assert_eq!(reader.current_volume(), 2);
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], 150);

        reader.seek(SeekFrom::Start(99)).unwrap();
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [99, 100]);

        let end = reader.seek(SeekFrom::End(0)).unwrap();
        assert_eq!(end, 222);
        assert!(reader.seek(SeekFrom::Current(-1000)).is_err());
    }

    #[test]
    fn test_missing_volume() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[100, 100, 100, 10]);
        std::fs::remove_file(split_volume_path(&final_path, 2)).unwrap();
        std::fs::remove_file(split_volume_path(&final_path, 3)).unwrap();

        match MultiVolumeReader::open(&final_path) {
            Err(Error::VolumeMissing { volume, path, .. }) => {
                assert_eq!(volume, 2);
                assert!(path.ends_with("test.z02"));
            }
            other => panic!("expected VolumeMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_final_volume() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = create_test_volumes(temp_dir.path(), &[100, 10]);
        std::fs::remove_file(&final_path).unwrap();
        assert!(matches!(
            MultiVolumeReader::open(&final_path),
            Err(Error::VolumeMissing { volume: 2, .. })
        ));
    }

    #[test]
    fn test_position_to_volume() {
        let reader = MultiVolumeReader::from_volumes(
            vec!["a".into(), "b".into(), "c".into()],
            vec![100, 100, 100],
        );
        assert_eq!(reader.position_to_volume(0), (0, 0));
        assert_eq!(reader.position_to_volume(99), (0, 99));
        assert_eq!(reader.position_to_volume(100), (1, 0));
        assert_eq!(reader.position_to_volume(250), (2, 50));
        assert_eq!(reader.position_to_volume(300), (2, 100));
    }
}
