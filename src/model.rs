//! In-memory archive metadata.
//!
//! An [`ArchiveModel`] is built either by parsing the central directory of an
//! existing archive or incrementally by a [`Writer`](crate::Writer). Both
//! paths produce the same model for the same archive.

use crate::codec::CompressionMethod;
use crate::crypto::{AesVendorVersion, EncryptionMethod, zip_crypto_check_byte};
use crate::format::extra::{AesExtraField, ExtraFields};
use crate::format::header::CentralDirectoryHeader;
use crate::format::name::decode_name;
use crate::format::{AES_METHOD_ID, ZIP64_SENTINEL_U16, ZIP64_SENTINEL_U32, flags};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// Unix `S_IFMT` mask.
const UNIX_FILE_TYPE_MASK: u32 = 0o170000;
/// Unix `S_IFDIR`.
const UNIX_DIRECTORY: u32 = 0o040000;
/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;

/// One entry of an archive, as described by its central directory record.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct EntryRecord {
    /// Position in central directory order.
    pub index: usize,
    /// The decoded path, forward-slash separated. Directories end with `/`.
    pub name: String,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Stored size in bytes, including any encryption overhead.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed data (0 for AE-2 entries).
    pub crc32: u32,
    /// The real compression method, taken from the AES extra field for AES entries.
    pub compression: CompressionMethod,
    /// The encryption method.
    pub encryption: EncryptionMethod,
    /// The AES extra field, for AES entries.
    pub aes: Option<AesExtraField>,
    /// Last modification time.
    pub modified: DosDateTime,
    /// External file attributes (Unix mode in the high 16 bits for Unix hosts).
    pub external_attributes: u32,
    /// "Version made by" field.
    pub version_made_by: u16,
    /// "Version needed to extract" field.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Volume (0-based) holding the local header.
    pub disk_number: u32,
    /// Offset of the local header, relative to its volume.
    pub local_header_offset: u64,
    /// Entry comment.
    pub comment: String,
}

impl EntryRecord {
    /// Returns true if this is a file (not a directory).
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// Returns the last path component.
    pub fn file_name(&self) -> &str {
        let trimmed = self.name.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Returns true if the entry is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_encrypted()
    }

    /// Returns the modification time as a `SystemTime`.
    pub fn modified_time(&self) -> std::time::SystemTime {
        self.modified.as_system_time()
    }

    /// Returns the Unix permission and type bits, if recorded.
    pub fn unix_mode(&self) -> Option<u32> {
        let mode = self.external_attributes >> 16;
        (mode != 0).then_some(mode)
    }

    /// Returns true if the CRC-32 must be verified on extraction.
    ///
    /// AE-2 entries store 0 and rely on the authentication code instead.
    pub fn crc_checked(&self) -> bool {
        !matches!(
            self.aes,
            Some(AesExtraField {
                vendor_version: AesVendorVersion::Ae2,
                ..
            })
        )
    }

    /// Returns the byte a ZipCrypto header of this entry must end with.
    pub(crate) fn check_byte(&self) -> u8 {
        zip_crypto_check_byte(self.flags, self.crc32, self.modified.raw_time())
    }

    /// Builds the record for a central directory header.
    ///
    /// The writer goes through the same conversion for the headers it emits,
    /// so a written model and its parsed counterpart compare equal.
    pub(crate) fn from_central_header(index: usize, header: &CentralDirectoryHeader) -> Result<Self> {
        let raw_name = String::from_utf8_lossy(&header.file_name).into_owned();
        let extras = ExtraFields::parse(&header.extra, header.zip64_needs(), &raw_name)?;
        let name = decode_name(&header.file_name, header.flags, extras.unicode_path.as_ref());
        let zip64 = extras.zip64.unwrap_or_default();

        let missing = |field: &str| {
            Error::corrupt_data(&name, format!("zip64 extra field lacks the {}", field))
        };
        let uncompressed_size = match header.uncompressed_size {
            ZIP64_SENTINEL_U32 => zip64
                .uncompressed_size
                .ok_or_else(|| missing("uncompressed size"))?,
            size => size as u64,
        };
        let compressed_size = match header.compressed_size {
            ZIP64_SENTINEL_U32 => zip64
                .compressed_size
                .ok_or_else(|| missing("compressed size"))?,
            size => size as u64,
        };
        let local_header_offset = match header.local_header_offset {
            ZIP64_SENTINEL_U32 => zip64
                .local_header_offset
                .ok_or_else(|| missing("local header offset"))?,
            offset => offset as u64,
        };
        let disk_number = match header.disk_number_start {
            ZIP64_SENTINEL_U16 => zip64.disk_number.ok_or_else(|| missing("disk number"))?,
            disk => disk as u32,
        };

        let (encryption, compression) = if header.method == AES_METHOD_ID {
            let aes = extras.aes.ok_or_else(|| {
                Error::corrupt_data(&name, "AES method without an AES extra field")
            })?;
            (
                EncryptionMethod::Aes(aes.strength),
                CompressionMethod::from_u16(aes.compression_method),
            )
        } else {
            let encryption = if header.flags & flags::STRONG_ENCRYPTION != 0 {
                EncryptionMethod::Unsupported
            } else if header.flags & flags::ENCRYPTED != 0 {
                EncryptionMethod::ZipCrypto
            } else {
                EncryptionMethod::None
            };
            (encryption, CompressionMethod::from_u16(header.method))
        };

        let is_directory = is_directory_entry(&name, header.external_attributes);
        let comment = decode_name(&header.comment, header.flags, None);

        Ok(Self {
            index,
            name,
            is_directory,
            uncompressed_size,
            compressed_size,
            crc32: header.crc32,
            compression,
            encryption,
            aes: extras.aes,
            modified: DosDateTime::from_raw(header.last_mod_time, header.last_mod_date),
            external_attributes: header.external_attributes,
            version_made_by: header.version_made_by,
            version_needed: header.version_needed,
            flags: header.flags,
            disk_number,
            local_header_offset,
            comment,
        })
    }
}

/// Returns true if the name or attributes mark a directory.
pub(crate) fn is_directory_entry(name: &str, external_attributes: u32) -> bool {
    name.ends_with('/')
        || external_attributes & DOS_DIRECTORY != 0
        || (external_attributes >> 16) & UNIX_FILE_TYPE_MASK == UNIX_DIRECTORY
}

/// Volume layout of a split archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitInfo {
    /// Size of every volume in order; the last one is the `.zip` file.
    pub volume_sizes: Vec<u64>,
}

impl SplitInfo {
    /// Converts a volume-relative offset into an offset in the concatenated stream.
    ///
    /// Returns `None` if `disk` does not exist. Offsets past `u64::MAX`
    /// saturate.
    pub fn logical_offset(&self, disk: u32, offset: u64) -> Option<u64> {
        let disk = disk as usize;
        if disk >= self.volume_sizes.len() {
            return None;
        }
        let start = self.volume_sizes[..disk]
            .iter()
            .fold(0u64, |sum, &size| sum.saturating_add(size));
        Some(start.saturating_add(offset))
    }

    /// Converts a logical offset into `(volume index, offset in volume)`.
    pub fn physical_offset(&self, logical: u64) -> Option<(u32, u64)> {
        let mut remaining = logical;
        for (i, &size) in self.volume_sizes.iter().enumerate() {
            if remaining < size {
                return Some((i as u32, remaining));
            }
            remaining -= size;
        }
        None
    }

    /// Number of volumes.
    pub fn volume_count(&self) -> u32 {
        self.volume_sizes.len() as u32
    }
}

/// Metadata of one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveModel {
    /// Entries in central directory order. Duplicate names are kept.
    pub entries: Vec<EntryRecord>,
    /// Offset of the central directory, relative to `cd_disk`.
    pub cd_offset: u64,
    /// Size of the central directory in bytes.
    pub cd_size: u64,
    /// Volume holding the start of the central directory.
    pub cd_disk: u32,
    /// Whether the Zip64 end records are present.
    pub zip64: bool,
    /// Volume layout for split archives.
    pub split: Option<SplitInfo>,
    /// Archive comment.
    pub comment: String,
}

impl ArchiveModel {
    /// Returns the first entry whose name equals `name`.
    pub fn find(&self, name: &str) -> Option<&EntryRecord> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the uncompressed sizes of all entries, saturating at `u64::MAX`.
    pub fn total_uncompressed_size(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |sum, e| sum.saturating_add(e.uncompressed_size))
    }

    /// Maps a volume-relative offset to the logical stream.
    pub(crate) fn logical_offset(&self, disk: u32, offset: u64) -> Option<u64> {
        match &self.split {
            Some(split) => split.logical_offset(disk, offset),
            None if disk == 0 => Some(offset),
            None => None,
        }
    }
}
