//! Extra field parsing and encoding.
//!
//! The extra field is a sequence of `(id: u16, len: u16, data)` blocks.
//! Blocks this crate does not understand are skipped; a block whose
//! declared length runs past the end of the field is [`Error::Truncated`].

use super::reader::ByteReader;
use super::writer::LeWrite;
use super::extra_id;
use crate::crypto::{AesKeyStrength, AesVendorVersion};
use crate::{Error, Result};

/// Vendor ID stored in the AES extra field (`"AE"` little-endian).
const AES_VENDOR_ID: u16 = 0x4541;

/// Size of the AES extra field body.
const AES_EXTRA_SIZE: u16 = 7;

/// Which header fields hold the Zip64 sentinel, and therefore which values
/// are present in the Zip64 extra field, in this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Needs {
    /// Uncompressed size is `0xFFFFFFFF`.
    pub uncompressed_size: bool,
    /// Compressed size is `0xFFFFFFFF`.
    pub compressed_size: bool,
    /// Local header offset is `0xFFFFFFFF`.
    pub local_header_offset: bool,
    /// Disk number is `0xFFFF`.
    pub disk_number: bool,
}

impl Zip64Needs {
    /// Returns true if any value must come from the Zip64 extra field.
    pub fn any(&self) -> bool {
        self.uncompressed_size || self.compressed_size || self.local_header_offset || self.disk_number
    }
}

/// The Zip64 extended information extra field (`0x0001`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    /// Real uncompressed size.
    pub uncompressed_size: Option<u64>,
    /// Real compressed size.
    pub compressed_size: Option<u64>,
    /// Real local header offset.
    pub local_header_offset: Option<u64>,
    /// Real disk number.
    pub disk_number: Option<u32>,
}

impl Zip64ExtraField {
    /// Parses the field body, reading only the values flagged in `needs`.
    pub fn parse(data: &[u8], needs: Zip64Needs) -> Result<Self> {
        let mut r = ByteReader::new(data, "zip64 extra field");
        let mut field = Self::default();
        if needs.uncompressed_size {
            field.uncompressed_size = Some(r.u64()?);
        }
        if needs.compressed_size {
            field.compressed_size = Some(r.u64()?);
        }
        if needs.local_header_offset {
            field.local_header_offset = Some(r.u64()?);
        }
        if needs.disk_number {
            field.disk_number = Some(r.u32()?);
        }
        Ok(field)
    }

    /// Returns true if no value is present.
    pub fn is_empty(&self) -> bool {
        self.uncompressed_size.is_none()
            && self.compressed_size.is_none()
            && self.local_header_offset.is_none()
            && self.disk_number.is_none()
    }

    /// Appends the complete block (header and body) to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        if self.is_empty() {
            return;
        }
        let mut body = Vec::with_capacity(28);
        if let Some(v) = self.uncompressed_size {
            body.put_u64(v);
        }
        if let Some(v) = self.compressed_size {
            body.put_u64(v);
        }
        if let Some(v) = self.local_header_offset {
            body.put_u64(v);
        }
        if let Some(v) = self.disk_number {
            body.put_u32(v);
        }
        encode_block(out, extra_id::ZIP64, &body);
    }
}

/// The WinZip AES extra field (`0x9901`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesExtraField {
    /// AE-1 or AE-2.
    pub vendor_version: AesVendorVersion,
    /// Key strength.
    pub strength: AesKeyStrength,
    /// Compression method applied before encryption.
    pub compression_method: u16,
}

impl AesExtraField {
    /// Parses the field body.
    pub fn parse(data: &[u8], entry_name: &str) -> Result<Self> {
        if data.len() != AES_EXTRA_SIZE as usize {
            return Err(Error::corrupt_data(
                entry_name,
                format!("AES extra field has length {}, expected 7", data.len()),
            ));
        }
        let mut r = ByteReader::new(data, "AES extra field");
        let version = r.u16()?;
        let vendor = r.u16()?;
        let strength = r.u8()?;
        let compression_method = r.u16()?;

        if vendor != AES_VENDOR_ID {
            return Err(Error::corrupt_data(
                entry_name,
                format!("unknown AES vendor id {:#06x}", vendor),
            ));
        }
        let vendor_version = AesVendorVersion::from_u16(version).ok_or_else(|| {
            Error::unsupported_method(entry_name, format!("AES vendor version {}", version))
        })?;
        let strength = AesKeyStrength::from_code(strength).ok_or_else(|| {
            Error::unsupported_method(entry_name, format!("AES key strength code {}", strength))
        })?;

        Ok(Self {
            vendor_version,
            strength,
            compression_method,
        })
    }

    /// Appends the complete block (header and body) to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut body = Vec::with_capacity(AES_EXTRA_SIZE as usize);
        body.put_u16(self.vendor_version.as_u16());
        body.put_u16(AES_VENDOR_ID);
        body.put_u8(self.strength.code());
        body.put_u16(self.compression_method);
        encode_block(out, extra_id::AES, &body);
    }
}

/// The Info-ZIP Unicode path extra field (`0x7075`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodePathExtraField {
    /// CRC-32 of the raw name stored in the header.
    pub name_crc32: u32,
    /// The UTF-8 name.
    pub name: String,
}

impl UnicodePathExtraField {
    /// Builds the field for a name stored as UTF-8 in the header.
    pub fn new(name: &str) -> Self {
        Self {
            name_crc32: crate::checksum::Crc32::compute(name.as_bytes()),
            name: name.to_string(),
        }
    }

    /// Parses the field body. Returns `None` for unknown versions or names
    /// that are not valid UTF-8.
    pub fn parse(data: &[u8]) -> Result<Option<Self>> {
        let mut r = ByteReader::new(data, "unicode path extra field");
        if r.u8()? != 1 {
            return Ok(None);
        }
        let name_crc32 = r.u32()?;
        let name = r.bytes(r.remaining())?;
        Ok(std::str::from_utf8(name).ok().map(|name| Self {
            name_crc32,
            name: name.to_string(),
        }))
    }

    /// Appends the complete block (header and body) to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut body = Vec::with_capacity(5 + self.name.len());
        body.put_u8(1);
        body.put_u32(self.name_crc32);
        body.put_bytes(self.name.as_bytes());
        encode_block(out, extra_id::UNICODE_PATH, &body);
    }
}

/// Extra field blocks understood by this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    /// Zip64 extended information.
    pub zip64: Option<Zip64ExtraField>,
    /// WinZip AES parameters.
    pub aes: Option<AesExtraField>,
    /// Info-ZIP Unicode path.
    pub unicode_path: Option<UnicodePathExtraField>,
}

impl ExtraFields {
    /// Parses a complete extra field.
    ///
    /// `needs` lists the header fields holding a Zip64 sentinel. The Zip64
    /// block is only decoded when at least one is set.
    pub fn parse(data: &[u8], needs: Zip64Needs, entry_name: &str) -> Result<Self> {
        let mut fields = Self::default();
        let mut r = ByteReader::new(data, "extra field");
        // A few tools pad the field with fewer than 4 trailing bytes.
        while r.remaining() >= 4 {
            let id = r.u16()?;
            let len = r.u16()? as usize;
            let body = r.bytes(len)?;
            match id {
                extra_id::ZIP64 if needs.any() => {
                    fields.zip64 = Some(Zip64ExtraField::parse(body, needs)?);
                }
                extra_id::AES => {
                    fields.aes = Some(AesExtraField::parse(body, entry_name)?);
                }
                extra_id::UNICODE_PATH => {
                    fields.unicode_path = UnicodePathExtraField::parse(body)?;
                }
                _ => log::trace!("skipping extra field {:#06x} ({} bytes)", id, len),
            }
        }
        if needs.any() && fields.zip64.is_none() {
            return Err(Error::corrupt_data(
                entry_name,
                "header uses zip64 sentinels but has no zip64 extra field",
            ));
        }
        Ok(fields)
    }
}

/// Appends one `(id, len, body)` block to `out`.
pub fn encode_block(out: &mut Vec<u8>, id: u16, body: &[u8]) {
    out.put_u16(id);
    out.put_u16(body.len() as u16);
    out.put_bytes(body);
}
