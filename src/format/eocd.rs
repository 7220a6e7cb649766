//! End of central directory records and the EOCD search.

use std::io::{Read, Seek, SeekFrom};

use super::reader::{ByteReader, read_record, read_vec};
use super::writer::LeWrite;
use super::{
    EOCD_SIGNATURE, EOCD_SIZE, MAX_COMMENT_LENGTH, ZIP64_EOCD_LOCATOR_SIGNATURE,
    ZIP64_EOCD_LOCATOR_SIZE, ZIP64_EOCD_SIGNATURE, ZIP64_EOCD_SIZE, ZIP64_SENTINEL_U16,
    ZIP64_SENTINEL_U32, version,
};
use crate::{Error, RecordKind, Result};

/// The end of central directory record (`PK\x05\x06`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    /// Number of this disk (0-based).
    pub disk_number: u16,
    /// Disk on which the central directory starts.
    pub cd_start_disk: u16,
    /// Central directory entries on this disk.
    pub entries_on_disk: u16,
    /// Total central directory entries.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub cd_size: u32,
    /// Offset of the central directory within its start disk.
    pub cd_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Parses the record from a buffer starting at its signature.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut b = ByteReader::new(data, "end of central directory record");
        let found = b.u32()?;
        if found != EOCD_SIGNATURE {
            return Err(Error::BadSignature {
                record: RecordKind::EndOfCentralDirectory,
                offset,
                found,
            });
        }
        let disk_number = b.u16()?;
        let cd_start_disk = b.u16()?;
        let entries_on_disk = b.u16()?;
        let total_entries = b.u16()?;
        let cd_size = b.u32()?;
        let cd_offset = b.u32()?;
        let comment_len = b.u16()? as usize;
        let comment = b.bytes(comment_len)?.to_vec();
        Ok(Self {
            disk_number,
            cd_start_disk,
            entries_on_disk,
            total_entries,
            cd_size,
            cd_offset,
            comment,
        })
    }

    /// Returns true if any field holds a Zip64 sentinel.
    pub fn needs_zip64(&self) -> bool {
        self.disk_number == ZIP64_SENTINEL_U16
            || self.cd_start_disk == ZIP64_SENTINEL_U16
            || self.entries_on_disk == ZIP64_SENTINEL_U16
            || self.total_entries == ZIP64_SENTINEL_U16
            || self.cd_size == ZIP64_SENTINEL_U32
            || self.cd_offset == ZIP64_SENTINEL_U32
    }

    /// Appends the encoded record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.put_u32(EOCD_SIGNATURE);
        out.put_u16(self.disk_number);
        out.put_u16(self.cd_start_disk);
        out.put_u16(self.entries_on_disk);
        out.put_u16(self.total_entries);
        out.put_u32(self.cd_size);
        out.put_u32(self.cd_offset);
        out.put_u16(self.comment.len() as u16);
        out.put_bytes(&self.comment);
    }
}

/// The Zip64 end of central directory record (`PK\x06\x06`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Zip64EndOfCentralDirectory {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk on which the central directory starts.
    pub cd_start_disk: u32,
    /// Central directory entries on this disk.
    pub entries_on_disk: u64,
    /// Total central directory entries.
    pub total_entries: u64,
    /// Size of the central directory in bytes.
    pub cd_size: u64,
    /// Offset of the central directory within its start disk.
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// Reads the record at logical offset `offset`. The extensible data
    /// sector, if any, is skipped.
    pub fn parse<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let mut fixed = [0u8; ZIP64_EOCD_SIZE];
        read_record(r, &mut fixed, "zip64 end of central directory record")?;
        let mut b = ByteReader::new(&fixed, "zip64 end of central directory record");
        let found = b.u32()?;
        if found != ZIP64_EOCD_SIGNATURE {
            return Err(Error::BadSignature {
                record: RecordKind::Zip64EndOfCentralDirectory,
                offset,
                found,
            });
        }
        let _record_size = b.u64()?;
        Ok(Self {
            version_made_by: b.u16()?,
            version_needed: b.u16()?,
            disk_number: b.u32()?,
            cd_start_disk: b.u32()?,
            entries_on_disk: b.u64()?,
            total_entries: b.u64()?,
            cd_size: b.u64()?,
            cd_offset: b.u64()?,
        })
    }

    /// Appends the encoded record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.put_u32(ZIP64_EOCD_SIGNATURE);
        // Size of the remaining record, excluding signature and this field
        out.put_u64((ZIP64_EOCD_SIZE - 12) as u64);
        out.put_u16(self.version_made_by);
        out.put_u16(self.version_needed.max(version::ZIP64));
        out.put_u32(self.disk_number);
        out.put_u32(self.cd_start_disk);
        out.put_u64(self.entries_on_disk);
        out.put_u64(self.total_entries);
        out.put_u64(self.cd_size);
        out.put_u64(self.cd_offset);
    }
}

/// The Zip64 end of central directory locator (`PK\x06\x07`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Zip64Locator {
    /// Disk holding the Zip64 EOCD record.
    pub eocd_disk: u32,
    /// Offset of the Zip64 EOCD record within that disk.
    pub eocd_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64Locator {
    /// Parses the locator from exactly [`ZIP64_EOCD_LOCATOR_SIZE`] bytes.
    ///
    /// Returns `Ok(None)` if the bytes do not carry the locator signature.
    pub fn parse(data: &[u8]) -> Result<Option<Self>> {
        let mut b = ByteReader::new(data, "zip64 end of central directory locator");
        if b.u32()? != ZIP64_EOCD_LOCATOR_SIGNATURE {
            return Ok(None);
        }
        Ok(Some(Self {
            eocd_disk: b.u32()?,
            eocd_offset: b.u64()?,
            total_disks: b.u32()?,
        }))
    }

    /// Appends the encoded locator to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.put_u32(ZIP64_EOCD_LOCATOR_SIGNATURE);
        out.put_u32(self.eocd_disk);
        out.put_u64(self.eocd_offset);
        out.put_u32(self.total_disks);
    }
}

/// The located end-of-archive records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EocdLocation {
    /// Logical offset of the EOCD record.
    pub offset: u64,
    /// The EOCD record.
    pub eocd: EndOfCentralDirectory,
    /// The Zip64 locator immediately preceding the EOCD, if present.
    pub zip64_locator: Option<Zip64Locator>,
}

/// Finds the EOCD record by scanning backwards from the end of the stream.
///
/// The scan is bounded by the EOCD size plus the maximum comment length.
/// A candidate is accepted only if its comment length fits in the bytes
/// that follow it. Returns [`Error::NotAZip`] if nothing is found.
pub fn find_eocd<R: Read + Seek + ?Sized>(r: &mut R) -> Result<EocdLocation> {
    let len = r.seek(SeekFrom::End(0))?;
    if len < EOCD_SIZE as u64 {
        return Err(Error::NotAZip(format!(
            "stream is {} bytes, smaller than an end of central directory record",
            len
        )));
    }

    let window = len.min((EOCD_SIZE + MAX_COMMENT_LENGTH + ZIP64_EOCD_LOCATOR_SIZE) as u64);
    let window_start = len - window;
    r.seek(SeekFrom::Start(window_start))?;
    let tail = read_vec(r, window as usize, "archive tail")?;

    let signature = EOCD_SIGNATURE.to_le_bytes();
    let mut pos = tail.len() - EOCD_SIZE;
    loop {
        if tail[pos..pos + 4] == signature {
            let comment_len = u16::from_le_bytes([tail[pos + 20], tail[pos + 21]]) as usize;
            if pos + EOCD_SIZE + comment_len <= tail.len() {
                let offset = window_start + pos as u64;
                let eocd = EndOfCentralDirectory::parse(&tail[pos..], offset)?;
                let zip64_locator = if pos >= ZIP64_EOCD_LOCATOR_SIZE {
                    Zip64Locator::parse(&tail[pos - ZIP64_EOCD_LOCATOR_SIZE..pos])?
                } else {
                    None
                };
                log::trace!(
                    "found end of central directory at {:#x} (zip64 locator: {})",
                    offset,
                    zip64_locator.is_some()
                );
                return Ok(EocdLocation {
                    offset,
                    eocd,
                    zip64_locator,
                });
            }
        }
        if pos == 0 {
            break;
        }
        pos -= 1;
    }

    Err(Error::NotAZip(
        "end of central directory record not found".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn eocd_bytes(comment: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        EndOfCentralDirectory {
            total_entries: 3,
            entries_on_disk: 3,
            cd_size: 150,
            cd_offset: 1000,
            comment: comment.to_vec(),
            ..Default::default()
        }
        .encode_into(&mut out);
        out
    }

    #[test]
    fn test_find_eocd_without_comment() {
        let mut data = vec![0u8; 100];
        data.extend(eocd_bytes(b""));
        let found = find_eocd(&mut Cursor::new(data)).unwrap();
        assert_eq!(found.offset, 100);
        assert_eq!(found.eocd.total_entries, 3);
        assert_eq!(found.eocd.cd_offset, 1000);
        assert!(found.zip64_locator.is_none());
    }

    #[test]
    fn test_find_eocd_with_max_comment() {
        let comment = vec![b'c'; MAX_COMMENT_LENGTH];
        let mut data = vec![0u8; 10];
        data.extend(eocd_bytes(&comment));
        let found = find_eocd(&mut Cursor::new(data)).unwrap();
        assert_eq!(found.offset, 10);
        assert_eq!(found.eocd.comment.len(), MAX_COMMENT_LENGTH);
    }

    #[test]
    fn test_signature_inside_comment_is_ignored() {
        // A fake signature near the end whose comment length overruns the stream
        let mut comment = b"PK\x05\x06".to_vec();
        comment.extend([0u8; 16]);
        comment.extend([0xff, 0xff]);
        let mut data = vec![0u8; 4];
        data.extend(eocd_bytes(&comment));
        let found = find_eocd(&mut Cursor::new(data)).unwrap();
        assert_eq!(found.offset, 4);
    }

    #[test]
    fn test_empty_stream_is_not_a_zip() {
        let err = find_eocd(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::NotAZip(_)));
    }

    #[test]
    fn test_garbage_is_not_a_zip() {
        let err = find_eocd(&mut Cursor::new(vec![0x42u8; 4096])).unwrap_err();
        assert!(matches!(err, Error::NotAZip(_)));
    }

    #[test]
    fn test_zip64_records() {
        let z64 = Zip64EndOfCentralDirectory {
            version_made_by: version::MADE_BY,
            version_needed: version::ZIP64,
            total_entries: 70_000,
            entries_on_disk: 70_000,
            cd_size: 5_000_000,
            cd_offset: 0x1_0000_0000,
            ..Default::default()
        };
        let mut data = Vec::new();
        z64.encode_into(&mut data);
        assert_eq!(data.len(), ZIP64_EOCD_SIZE);
        let locator = Zip64Locator {
            eocd_disk: 0,
            eocd_offset: 0,
            total_disks: 1,
        };
        locator.encode_into(&mut data);
        let mut eocd = Vec::new();
        EndOfCentralDirectory {
            disk_number: 0,
            cd_start_disk: 0,
            entries_on_disk: ZIP64_SENTINEL_U16,
            total_entries: ZIP64_SENTINEL_U16,
            cd_size: ZIP64_SENTINEL_U32,
            cd_offset: ZIP64_SENTINEL_U32,
            comment: Vec::new(),
        }
        .encode_into(&mut eocd);
        data.extend(eocd);

        let mut cursor = Cursor::new(data);
        let found = find_eocd(&mut cursor).unwrap();
        assert!(found.eocd.needs_zip64());
        assert_eq!(found.zip64_locator, Some(locator));

        cursor.set_position(0);
        assert_eq!(
            Zip64EndOfCentralDirectory::parse(&mut cursor, 0).unwrap(),
            z64
        );
    }
}
