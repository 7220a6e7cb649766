//! ZIP format constants, record definitions, and low-level parsing utilities.
//!
//! All multi-byte integers in the ZIP format are little-endian. Records are
//! identified by a 4-byte signature; the constants below follow the naming of
//! PKWARE's APPNOTE.TXT.

pub mod eocd;
pub mod extra;
pub mod header;
pub mod name;
pub mod reader;
pub mod writer;

/// Local file header signature (`PK\x03\x04`).
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Central directory file header signature (`PK\x01\x02`).
pub const CENTRAL_DIRECTORY_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// Data descriptor signature (`PK\x07\x08`).
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Marker written at the start of the first volume of a split archive.
///
/// Shares its value with the data descriptor signature.
pub const SPLIT_ARCHIVE_SIGNATURE: u32 = DATA_DESCRIPTOR_SIGNATURE;

/// End of central directory signature (`PK\x05\x06`).
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;

/// Zip64 end of central directory signature (`PK\x06\x06`).
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;

/// Zip64 end of central directory locator signature (`PK\x06\x07`).
pub const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;

/// Fixed part of a local file header.
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Fixed part of a central directory header.
pub const CENTRAL_DIRECTORY_HEADER_SIZE: usize = 46;

/// Fixed part of the end of central directory record.
pub const EOCD_SIZE: usize = 22;

/// Fixed part of the Zip64 end of central directory record.
pub const ZIP64_EOCD_SIZE: usize = 56;

/// Size of the Zip64 end of central directory locator.
pub const ZIP64_EOCD_LOCATOR_SIZE: usize = 20;

/// Maximum archive comment length; bounds the backward EOCD scan.
pub const MAX_COMMENT_LENGTH: usize = u16::MAX as usize;

/// Value of a 32-bit size or offset field whose real value lives in the Zip64 extra field.
pub const ZIP64_SENTINEL_U32: u32 = u32::MAX;

/// Value of a 16-bit count or disk field whose real value lives in a Zip64 record.
pub const ZIP64_SENTINEL_U16: u16 = u16::MAX;

/// Largest size or offset that fits a 32-bit field without Zip64.
pub const ZIP64_BYTES_THRESHOLD: u64 = ZIP64_SENTINEL_U32 as u64;

/// Largest entry count that fits the 16-bit EOCD fields without Zip64.
pub const ZIP64_ENTRY_THRESHOLD: usize = ZIP64_SENTINEL_U16 as usize;

/// Compression method value stored in headers of WinZip AES entries.
pub const AES_METHOD_ID: u16 = 99;

/// General purpose bit flags.
pub mod flags {
    /// Bit 0: the entry is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// Bit 3: CRC and sizes follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Bit 6: PKWARE strong encryption (not supported).
    pub const STRONG_ENCRYPTION: u16 = 1 << 6;
    /// Bit 11: file name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
}

/// "Version needed to extract" values.
pub mod version {
    /// Deflate, folders, ZipCrypto.
    pub const DEFAULT: u16 = 20;
    /// Zip64 format extensions.
    pub const ZIP64: u16 = 45;
    /// WinZip AES encryption.
    pub const AES: u16 = 51;
    /// "Version made by": Unix host (3), APPNOTE 6.3.
    pub const MADE_BY: u16 = (3 << 8) | 63;
}

/// Extra field header IDs.
pub mod extra_id {
    /// Zip64 extended information.
    pub const ZIP64: u16 = 0x0001;
    /// WinZip AES encryption.
    pub const AES: u16 = 0x9901;
    /// Info-ZIP Unicode path.
    pub const UNICODE_PATH: u16 = 0x7075;
}
