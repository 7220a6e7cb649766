//! Local file header, central directory header and data descriptor records.

use std::io::Read;

use super::reader::{ByteReader, read_record, read_vec};
use super::writer::LeWrite;
use super::{
    CENTRAL_DIRECTORY_HEADER_SIGNATURE, CENTRAL_DIRECTORY_HEADER_SIZE, DATA_DESCRIPTOR_SIGNATURE,
    LOCAL_FILE_HEADER_SIGNATURE, LOCAL_FILE_HEADER_SIZE, ZIP64_SENTINEL_U16, ZIP64_SENTINEL_U32,
};
use crate::format::extra::Zip64Needs;
use crate::{Error, RecordKind, Result};

fn check_signature(found: u32, expected: u32, record: RecordKind, offset: u64) -> Result<()> {
    if found != expected {
        return Err(Error::BadSignature {
            record,
            offset,
            found,
        });
    }
    Ok(())
}

/// A local file header (`PK\x03\x04`), written immediately before each
/// entry's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method as stored (99 for AES).
    pub method: u16,
    /// DOS time.
    pub last_mod_time: u16,
    /// DOS date.
    pub last_mod_date: u16,
    /// CRC-32, zero when a data descriptor follows.
    pub crc32: u32,
    /// Compressed size, zero (or the Zip64 sentinel) when a data descriptor follows.
    pub compressed_size: u32,
    /// Uncompressed size, zero (or the Zip64 sentinel) when a data descriptor follows.
    pub uncompressed_size: u32,
    /// Raw file name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field bytes.
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    /// Reads a local file header located at logical offset `offset`.
    pub fn parse<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let mut fixed = [0u8; LOCAL_FILE_HEADER_SIZE];
        read_record(r, &mut fixed, "local file header")?;
        let mut b = ByteReader::new(&fixed, "local file header");
        check_signature(
            b.u32()?,
            LOCAL_FILE_HEADER_SIGNATURE,
            RecordKind::LocalFileHeader,
            offset,
        )?;

        let version_needed = b.u16()?;
        let flags = b.u16()?;
        let method = b.u16()?;
        let last_mod_time = b.u16()?;
        let last_mod_date = b.u16()?;
        let crc32 = b.u32()?;
        let compressed_size = b.u32()?;
        let uncompressed_size = b.u32()?;
        let name_len = b.u16()? as usize;
        let extra_len = b.u16()? as usize;

        let file_name = read_vec(r, name_len, "local file name")?;
        let extra = read_vec(r, extra_len, "local extra field")?;

        Ok(Self {
            version_needed,
            flags,
            method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name,
            extra,
        })
    }

    /// Total encoded length of the header.
    pub fn encoded_len(&self) -> usize {
        LOCAL_FILE_HEADER_SIZE + self.file_name.len() + self.extra.len()
    }

    /// Encodes the header.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.put_u32(LOCAL_FILE_HEADER_SIGNATURE);
        out.put_u16(self.version_needed);
        out.put_u16(self.flags);
        out.put_u16(self.method);
        out.put_u16(self.last_mod_time);
        out.put_u16(self.last_mod_date);
        out.put_u32(self.crc32);
        out.put_u32(self.compressed_size);
        out.put_u32(self.uncompressed_size);
        out.put_u16(self.file_name.len() as u16);
        out.put_u16(self.extra.len() as u16);
        out.put_bytes(&self.file_name);
        out.put_bytes(&self.extra);
        out
    }
}

/// A central directory file header (`PK\x01\x02`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by (host system in the high byte).
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method as stored (99 for AES).
    pub method: u16,
    /// DOS time.
    pub last_mod_time: u16,
    /// DOS date.
    pub last_mod_date: u16,
    /// CRC-32 of the plaintext (zero for AE-2 entries).
    pub crc32: u32,
    /// Compressed size or the Zip64 sentinel.
    pub compressed_size: u32,
    /// Uncompressed size or the Zip64 sentinel.
    pub uncompressed_size: u32,
    /// Disk on which the entry starts, or the Zip64 sentinel.
    pub disk_number_start: u16,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External file attributes (host dependent).
    pub external_attributes: u32,
    /// Offset of the local header within its disk, or the Zip64 sentinel.
    pub local_header_offset: u32,
    /// Raw file name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field bytes.
    pub extra: Vec<u8>,
    /// Raw file comment bytes.
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// Reads a central directory header located at logical offset `offset`.
    pub fn parse<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let mut fixed = [0u8; CENTRAL_DIRECTORY_HEADER_SIZE];
        read_record(r, &mut fixed, "central directory header")?;
        let mut b = ByteReader::new(&fixed, "central directory header");
        check_signature(
            b.u32()?,
            CENTRAL_DIRECTORY_HEADER_SIGNATURE,
            RecordKind::CentralDirectoryHeader,
            offset,
        )?;

        let version_made_by = b.u16()?;
        let version_needed = b.u16()?;
        let flags = b.u16()?;
        let method = b.u16()?;
        let last_mod_time = b.u16()?;
        let last_mod_date = b.u16()?;
        let crc32 = b.u32()?;
        let compressed_size = b.u32()?;
        let uncompressed_size = b.u32()?;
        let name_len = b.u16()? as usize;
        let extra_len = b.u16()? as usize;
        let comment_len = b.u16()? as usize;
        let disk_number_start = b.u16()?;
        let internal_attributes = b.u16()?;
        let external_attributes = b.u32()?;
        let local_header_offset = b.u32()?;

        let file_name = read_vec(r, name_len, "central directory file name")?;
        let extra = read_vec(r, extra_len, "central directory extra field")?;
        let comment = read_vec(r, comment_len, "central directory file comment")?;

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_attributes,
            external_attributes,
            local_header_offset,
            file_name,
            extra,
            comment,
        })
    }

    /// Which fields hold a Zip64 sentinel.
    pub fn zip64_needs(&self) -> Zip64Needs {
        Zip64Needs {
            uncompressed_size: self.uncompressed_size == ZIP64_SENTINEL_U32,
            compressed_size: self.compressed_size == ZIP64_SENTINEL_U32,
            local_header_offset: self.local_header_offset == ZIP64_SENTINEL_U32,
            disk_number: self.disk_number_start == ZIP64_SENTINEL_U16,
        }
    }

    /// Total encoded length of the header.
    pub fn encoded_len(&self) -> usize {
        CENTRAL_DIRECTORY_HEADER_SIZE + self.file_name.len() + self.extra.len() + self.comment.len()
    }

    /// Appends the encoded header to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.put_u32(CENTRAL_DIRECTORY_HEADER_SIGNATURE);
        out.put_u16(self.version_made_by);
        out.put_u16(self.version_needed);
        out.put_u16(self.flags);
        out.put_u16(self.method);
        out.put_u16(self.last_mod_time);
        out.put_u16(self.last_mod_date);
        out.put_u32(self.crc32);
        out.put_u32(self.compressed_size);
        out.put_u32(self.uncompressed_size);
        out.put_u16(self.file_name.len() as u16);
        out.put_u16(self.extra.len() as u16);
        out.put_u16(self.comment.len() as u16);
        out.put_u16(self.disk_number_start);
        out.put_u16(self.internal_attributes);
        out.put_u32(self.external_attributes);
        out.put_u32(self.local_header_offset);
        out.put_bytes(&self.file_name);
        out.put_bytes(&self.extra);
        out.put_bytes(&self.comment);
    }
}

/// A data descriptor (`PK\x07\x08`), written after an entry's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataDescriptor {
    /// CRC-32 of the plaintext (zero for AE-2 entries).
    pub crc32: u32,
    /// Stored payload size.
    pub compressed_size: u64,
    /// Plaintext size.
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Encoded length with signature.
    pub fn encoded_len(zip64: bool) -> usize {
        if zip64 { 24 } else { 16 }
    }

    /// Encodes the descriptor with its signature. Sizes are 8 bytes each
    /// when `zip64` is set.
    pub fn encode(&self, zip64: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(zip64));
        out.put_u32(DATA_DESCRIPTOR_SIGNATURE);
        out.put_u32(self.crc32);
        if zip64 {
            out.put_u64(self.compressed_size);
            out.put_u64(self.uncompressed_size);
        } else {
            out.put_u32(self.compressed_size as u32);
            out.put_u32(self.uncompressed_size as u32);
        }
        out
    }

    /// Reads a descriptor. The signature is optional in the format; when
    /// the first word is not the signature it is taken as the CRC.
    pub fn parse<R: Read + ?Sized>(r: &mut R, zip64: bool) -> Result<Self> {
        let mut first = [0u8; 4];
        read_record(r, &mut first, "data descriptor")?;
        let first = u32::from_le_bytes(first);

        let size_len = if zip64 { 16 } else { 8 };
        let crc_len = if first == DATA_DESCRIPTOR_SIGNATURE { 4 } else { 0 };
        let rest = read_vec(r, crc_len + size_len, "data descriptor")?;
        let mut b = ByteReader::new(&rest, "data descriptor");

        let crc32 = if crc_len == 4 { b.u32()? } else { first };
        let (compressed_size, uncompressed_size) = if zip64 {
            (b.u64()?, b.u64()?)
        } else {
            (b.u32()? as u64, b.u32()? as u64)
        };
        Ok(Self {
            crc32,
            compressed_size,
            uncompressed_size,
        })
    }
}
