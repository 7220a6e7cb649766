//! Header construction for new entries and the trailing directory block.
//!
//! Every entry is written with a data descriptor, so the local header
//! carries zero CRC and sizes. The central header built after the payload
//! holds the real values, moving them into a Zip64 extra field when they do
//! not fit.

use crate::codec::CompressionMethod;
use crate::crypto::{AesVendorVersion, EncryptionMethod};
use crate::format::eocd::{EndOfCentralDirectory, Zip64EndOfCentralDirectory, Zip64Locator};
use crate::format::extra::{AesExtraField, UnicodePathExtraField, Zip64ExtraField};
use crate::format::header::{CentralDirectoryHeader, LocalFileHeader};
use crate::format::name::needs_utf8_flag;
use crate::format::writer::{u16_or_sentinel, u32_or_sentinel};
use crate::format::{
    AES_METHOD_ID, EOCD_SIZE, ZIP64_BYTES_THRESHOLD, ZIP64_ENTRY_THRESHOLD,
    ZIP64_EOCD_LOCATOR_SIZE, ZIP64_EOCD_SIZE, ZIP64_SENTINEL_U16, ZIP64_SENTINEL_U32, flags,
    version,
};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

use super::options::{EntryMeta, WriteOptions, Zip64Mode};

/// Headroom kept below the 4 GiB limit when judging a size hint, covering
/// Deflate expansion of incompressible data and encryption overhead.
fn zip64_headroom(size: u64) -> u64 {
    size / 64 + 1024
}

/// Largest Zip64 extra block a central header can carry: both sizes, the
/// local header offset and the disk number.
const MAX_ZIP64_EXTRA_LEN: usize = 4 + 8 + 8 + 8 + 4;

/// Everything about an entry's headers that is known before its payload.
#[derive(Debug, Clone)]
pub(crate) struct EntryLayout {
    pub(crate) name: String,
    pub(crate) flags: u16,
    pub(crate) compression: CompressionMethod,
    pub(crate) encryption: EncryptionMethod,
    pub(crate) version_needed: u16,
    pub(crate) modified: DosDateTime,
    pub(crate) external_attributes: u32,
    pub(crate) aes: Option<AesExtraField>,
    pub(crate) unicode_path: Option<UnicodePathExtraField>,
    /// Local header and data descriptor use Zip64 layouts.
    pub(crate) local_zip64: bool,
    /// Central header fields always go through the Zip64 extra field.
    pub(crate) force_zip64: bool,
}

impl EntryLayout {
    /// Plans the headers of entry `name`. Directories are stored
    /// uncompressed and unencrypted.
    pub(crate) fn new(name: String, meta: &EntryMeta, options: &WriteOptions) -> Self {
        let (compression, encryption) = if meta.is_directory {
            (CompressionMethod::Stored, EncryptionMethod::None)
        } else {
            (options.method, options.encryption)
        };

        let mut flags = flags::DATA_DESCRIPTOR;
        if encryption.is_encrypted() {
            flags |= flags::ENCRYPTED;
        }
        if needs_utf8_flag(&name) {
            flags |= flags::UTF8;
        }

        let aes = match encryption {
            EncryptionMethod::Aes(strength) => Some(AesExtraField {
                vendor_version: options.aes_version,
                strength,
                compression_method: compression.as_u16(),
            }),
            _ => None,
        };
        let unicode_path = (options.unicode_extra && !name.is_ascii())
            .then(|| UnicodePathExtraField::new(&name));

        let force_zip64 = options.zip64 == Zip64Mode::Always;
        let local_zip64 = force_zip64
            || meta
                .size_hint
                .is_some_and(|size| size.saturating_add(zip64_headroom(size)) >= ZIP64_BYTES_THRESHOLD);

        let version_needed = if aes.is_some() {
            version::AES
        } else if local_zip64 {
            version::ZIP64
        } else {
            version::DEFAULT
        };

        Self {
            name,
            flags,
            compression,
            encryption,
            version_needed,
            modified: meta.modified.unwrap_or_else(DosDateTime::now),
            external_attributes: meta.external_attributes(),
            aes,
            unicode_path,
            local_zip64,
            force_zip64,
        }
    }

    /// Fails if the name, or the largest extra field the entry may need,
    /// does not fit a 16-bit length field.
    pub(crate) fn check_lengths(&self) -> Result<()> {
        let max = u16::MAX as usize;
        if self.name.len() > max {
            return Err(Error::InvalidArchivePath {
                path: self.name.clone(),
                reason: "name is longer than 65535 bytes",
            });
        }
        let mut extra = Vec::new();
        self.encode_common_extra(&mut extra);
        if extra.len() + MAX_ZIP64_EXTRA_LEN > max {
            return Err(Error::InvalidArchivePath {
                path: self.name.clone(),
                reason: "name is too long for its extra fields",
            });
        }
        Ok(())
    }

    /// The method field as stored: 99 for AES entries.
    fn stored_method(&self) -> u16 {
        match self.aes {
            Some(_) => AES_METHOD_ID,
            None => self.compression.as_u16(),
        }
    }

    /// Returns true if the real CRC is written. AE-2 entries store zero.
    pub(crate) fn stores_crc(&self) -> bool {
        !matches!(
            self.aes,
            Some(AesExtraField {
                vendor_version: AesVendorVersion::Ae2,
                ..
            })
        )
    }

    fn encode_common_extra(&self, extra: &mut Vec<u8>) {
        if let Some(aes) = &self.aes {
            aes.encode(extra);
        }
        if let Some(unicode) = &self.unicode_path {
            unicode.encode(extra);
        }
    }

    /// Builds the local header.
    pub(crate) fn local_header(&self) -> LocalFileHeader {
        let mut extra = Vec::new();
        let size_field = if self.local_zip64 {
            // Real sizes follow in the Zip64 data descriptor.
            Zip64ExtraField {
                uncompressed_size: Some(0),
                compressed_size: Some(0),
                ..Default::default()
            }
            .encode(&mut extra);
            ZIP64_SENTINEL_U32
        } else {
            0
        };
        self.encode_common_extra(&mut extra);

        LocalFileHeader {
            version_needed: self.version_needed,
            flags: self.flags,
            method: self.stored_method(),
            last_mod_time: self.modified.raw_time(),
            last_mod_date: self.modified.raw_date(),
            crc32: 0,
            compressed_size: size_field,
            uncompressed_size: size_field,
            file_name: self.name.as_bytes().to_vec(),
            extra,
        }
    }

    /// Builds the central header once the payload is written.
    pub(crate) fn central_header(&self, written: &WrittenEntry) -> CentralDirectoryHeader {
        let force = self.force_zip64;
        let uncompressed_size = u32_or_sentinel(written.uncompressed_size, force);
        let compressed_size = u32_or_sentinel(written.compressed_size, force);
        let local_header_offset = u32_or_sentinel(written.offset, force);
        let disk_number_start = u16_or_sentinel(written.disk as u64, false);

        let zip64 = Zip64ExtraField {
            uncompressed_size: (uncompressed_size == ZIP64_SENTINEL_U32)
                .then_some(written.uncompressed_size),
            compressed_size: (compressed_size == ZIP64_SENTINEL_U32)
                .then_some(written.compressed_size),
            local_header_offset: (local_header_offset == ZIP64_SENTINEL_U32)
                .then_some(written.offset),
            disk_number: (disk_number_start == ZIP64_SENTINEL_U16).then_some(written.disk),
        };
        let mut extra = Vec::new();
        zip64.encode(&mut extra);
        self.encode_common_extra(&mut extra);

        let version_needed = if zip64.is_empty() {
            self.version_needed
        } else {
            self.version_needed.max(version::ZIP64)
        };

        CentralDirectoryHeader {
            version_made_by: version::MADE_BY,
            version_needed,
            flags: self.flags,
            method: self.stored_method(),
            last_mod_time: self.modified.raw_time(),
            last_mod_date: self.modified.raw_date(),
            crc32: written.crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_attributes: 0,
            external_attributes: self.external_attributes,
            local_header_offset,
            file_name: self.name.as_bytes().to_vec(),
            extra,
            comment: Vec::new(),
        }
    }
}

/// Where and how large an entry turned out to be.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WrittenEntry {
    pub(crate) disk: u32,
    pub(crate) offset: u64,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
}

/// The end records that follow the central directory.
#[derive(Debug, Clone)]
pub(crate) struct EndRecords {
    pub(crate) entries: u64,
    pub(crate) cd_size: u64,
    pub(crate) zip64: bool,
    pub(crate) force_zip64: bool,
    pub(crate) comment: Vec<u8>,
}

impl EndRecords {
    /// Decides whether the Zip64 records are needed. `disk` and `offset`
    /// are the position before the block is reserved; reserving can only
    /// move it to offset 0 of the next volume.
    pub(crate) fn new(
        entries: u64,
        cd_size: u64,
        disk: u32,
        offset: u64,
        force_zip64: bool,
        comment: Vec<u8>,
    ) -> Self {
        let zip64 = force_zip64
            || entries >= ZIP64_ENTRY_THRESHOLD as u64
            || cd_size >= ZIP64_BYTES_THRESHOLD
            || offset >= ZIP64_BYTES_THRESHOLD
            || disk as u64 >= ZIP64_SENTINEL_U16 as u64;
        Self {
            entries,
            cd_size,
            zip64,
            force_zip64,
            comment,
        }
    }

    /// Encoded length of the records.
    pub(crate) fn encoded_len(&self) -> usize {
        let zip64 = if self.zip64 {
            ZIP64_EOCD_SIZE + ZIP64_EOCD_LOCATOR_SIZE
        } else {
            0
        };
        zip64 + EOCD_SIZE + self.comment.len()
    }

    /// Appends the records for a central directory starting at
    /// `cd_offset` of volume `disk`. The records share that volume.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>, disk: u32, cd_offset: u64) {
        let force = self.force_zip64;
        if self.zip64 {
            let z64_offset = cd_offset + self.cd_size;
            Zip64EndOfCentralDirectory {
                version_made_by: version::MADE_BY,
                version_needed: version::ZIP64,
                disk_number: disk,
                cd_start_disk: disk,
                entries_on_disk: self.entries,
                total_entries: self.entries,
                cd_size: self.cd_size,
                cd_offset,
            }
            .encode_into(out);
            Zip64Locator {
                eocd_disk: disk,
                eocd_offset: z64_offset,
                total_disks: disk + 1,
            }
            .encode_into(out);
        }

        EndOfCentralDirectory {
            disk_number: u16_or_sentinel(disk as u64, force),
            cd_start_disk: u16_or_sentinel(disk as u64, force),
            entries_on_disk: u16_or_sentinel(self.entries, force),
            total_entries: u16_or_sentinel(self.entries, force),
            cd_size: u32_or_sentinel(self.cd_size, force),
            cd_offset: u32_or_sentinel(cd_offset, force),
            comment: self.comment.clone(),
        }
        .encode_into(out);
    }
}
