//! Archive opening and central directory parsing.

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::eocd::{Zip64EndOfCentralDirectory, find_eocd};
use crate::format::header::CentralDirectoryHeader;
use crate::format::name::decode_name;
use crate::format::reader::{read_u32_le, read_vec};
use crate::format::{
    CENTRAL_DIRECTORY_HEADER_SIGNATURE, CENTRAL_DIRECTORY_HEADER_SIZE, ZIP64_EOCD_SIZE,
};
use crate::model::{ArchiveModel, EntryRecord, SplitInfo};
use crate::volume::UnifiedReader;
use crate::{Error, Password, Result};

use super::Archive;

impl Archive<UnifiedReader> {
    /// Opens an archive from a file path.
    ///
    /// Split archives are detected automatically: when `name.z01` exists next
    /// to `name.zip`, all volumes are read as one logical stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAZip`] if no end of central directory record is
    /// found, or [`Error::VolumeMissing`] if a volume of a split archive is
    /// missing.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_inner(path.as_ref(), None)
    }

    /// Opens an archive from a file path with a password for encrypted entries.
    pub fn open_path_with_password(
        path: impl AsRef<Path>,
        password: impl Into<Password>,
    ) -> Result<Self> {
        Self::open_path_inner(path.as_ref(), Some(password.into()))
    }

    fn open_path_inner(path: &Path, password: Option<Password>) -> Result<Self> {
        let reader = UnifiedReader::open(path)?;
        let split = reader.volume_sizes().map(|sizes| SplitInfo {
            volume_sizes: sizes.to_vec(),
        });
        let archive = Self::from_parts(reader, split, password)?;
        log::debug!(
            "opened {} ({} entries, zip64: {}, volumes: {})",
            path.display(),
            archive.model.len(),
            archive.model.zip64,
            archive.model.split.as_ref().map_or(1, |s| s.volume_count())
        );
        Ok(archive)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an archive from a seekable reader.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::io::Cursor;
    /// use zipkit::Archive;
    ///
    /// # fn main() -> zipkit::Result<()> {
    /// let data = std::fs::read("archive.zip")?;
    /// let archive = Archive::open(Cursor::new(data))?;
    /// println!("{} entries", archive.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(reader: R) -> Result<Self> {
        Self::from_parts(reader, None, None)
    }

    /// Opens an archive from a seekable reader with a password for encrypted entries.
    pub fn open_with_password(reader: R, password: impl Into<Password>) -> Result<Self> {
        Self::from_parts(reader, None, Some(password.into()))
    }

    pub(crate) fn from_parts(
        mut reader: R,
        split: Option<SplitInfo>,
        password: Option<Password>,
    ) -> Result<Self> {
        let (model, base_offset) = read_model(&mut reader, split)?;
        Ok(Self {
            reader,
            model,
            password,
            base_offset,
        })
    }
}

/// End-of-archive values after Zip64 resolution.
struct DirectoryLocation {
    disk_number: u32,
    cd_disk: u32,
    total_entries: u64,
    cd_size: u64,
    cd_offset: u64,
    zip64: bool,
}

/// Reads the archive model.
///
/// Returns the model and the number of bytes found in front of the first
/// volume's archive data (non-zero for archives with a prepended stub).
pub(crate) fn read_model<R: Read + Seek + ?Sized>(
    reader: &mut R,
    split: Option<SplitInfo>,
) -> Result<(ArchiveModel, u64)> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    let location = find_eocd(reader)?;
    let eocd = &location.eocd;

    let mut model = ArchiveModel {
        split,
        comment: decode_name(&eocd.comment, 0, None),
        ..Default::default()
    };

    // The Zip64 records are only consulted when a field holds a sentinel.
    let zip64_locator = location.zip64_locator.filter(|_| eocd.needs_zip64());
    if location.zip64_locator.is_some() && zip64_locator.is_none() {
        log::debug!("ignoring zip64 locator; the end record holds no sentinels");
    }

    let dir = match zip64_locator {
        Some(locator) => {
            let offset = model
                .logical_offset(locator.eocd_disk, locator.eocd_offset)
                .ok_or_else(|| missing_volume(locator.eocd_disk))?;
            if offset
                .checked_add(ZIP64_EOCD_SIZE as u64)
                .is_none_or(|end| end > location.offset)
            {
                return Err(Error::Truncated(format!(
                    "zip64 end of central directory at {:#x} overlaps the end record",
                    offset
                )));
            }
            reader.seek(SeekFrom::Start(offset))?;
            let z64 = Zip64EndOfCentralDirectory::parse(reader, offset)?;
            DirectoryLocation {
                disk_number: z64.disk_number,
                cd_disk: z64.cd_start_disk,
                total_entries: z64.total_entries,
                cd_size: z64.cd_size,
                cd_offset: z64.cd_offset,
                zip64: true,
            }
        }
        None if eocd.needs_zip64() => {
            return Err(Error::Truncated(
                "end of central directory uses zip64 sentinels but no zip64 locator precedes it"
                    .into(),
            ));
        }
        None => DirectoryLocation {
            disk_number: eocd.disk_number as u32,
            cd_disk: eocd.cd_start_disk as u32,
            total_entries: eocd.total_entries as u64,
            cd_size: eocd.cd_size as u64,
            cd_offset: eocd.cd_offset as u64,
            zip64: false,
        },
    };

    if model.split.is_none() && dir.disk_number > 0 {
        return Err(missing_volume(0));
    }

    let mut cd_start = model
        .logical_offset(dir.cd_disk, dir.cd_offset)
        .ok_or_else(|| missing_volume(dir.cd_disk))?;

    // Data prepended to a single-file archive shifts every recorded offset.
    let mut base_offset = 0u64;
    if model.split.is_none() && !dir.zip64 {
        let expected_end = dir.cd_offset + dir.cd_size;
        if location.offset > expected_end && !has_signature_at(reader, cd_start)? {
            let shift = location.offset - expected_end;
            if has_signature_at(reader, cd_start + shift)? {
                log::debug!("archive data starts {} bytes into the stream", shift);
                base_offset = shift;
                cd_start += shift;
            }
        }
    }

    if cd_start
        .checked_add(dir.cd_size)
        .is_none_or(|end| end > stream_len)
    {
        return Err(Error::Truncated(format!(
            "central directory of {} bytes at {:#x} runs past the end of the {}-byte stream",
            dir.cd_size, cd_start, stream_len
        )));
    }
    if dir.total_entries > dir.cd_size / CENTRAL_DIRECTORY_HEADER_SIZE as u64 {
        return Err(Error::Truncated(format!(
            "{} entries cannot fit in a {}-byte central directory",
            dir.total_entries, dir.cd_size
        )));
    }

    reader.seek(SeekFrom::Start(cd_start))?;
    let cd = read_vec(reader, dir.cd_size as usize, "central directory")?;
    let mut cursor = Cursor::new(&cd[..]);

    let mut entries = Vec::with_capacity(dir.total_entries.min(65_536) as usize);
    for index in 0..dir.total_entries {
        let offset = cd_start + cursor.position();
        let header = CentralDirectoryHeader::parse(&mut cursor, offset)?;
        let record = EntryRecord::from_central_header(index as usize, &header)?;
        log::trace!(
            "entry {} '{}' at disk {} offset {:#x}",
            index,
            record.name,
            record.disk_number,
            record.local_header_offset
        );
        entries.push(record);
    }

    model.entries = entries;
    model.cd_offset = dir.cd_offset;
    model.cd_size = dir.cd_size;
    model.cd_disk = dir.cd_disk;
    model.zip64 = dir.zip64;
    Ok((model, base_offset))
}

fn has_signature_at<R: Read + Seek + ?Sized>(reader: &mut R, offset: u64) -> Result<bool> {
    reader.seek(SeekFrom::Start(offset))?;
    match read_u32_le(reader) {
        Ok(signature) => Ok(signature == CENTRAL_DIRECTORY_HEADER_SIGNATURE),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

fn missing_volume(disk: u32) -> Error {
    Error::VolumeMissing {
        volume: disk + 1,
        path: format!("volume {}", disk + 1),
        source: io::Error::new(io::ErrorKind::NotFound, "archive refers to a volume that was not supplied"),
    }
}
