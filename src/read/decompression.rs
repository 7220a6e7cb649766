//! The per-entry read pipeline.
//!
//! ```text
//! archive bytes -> Take(stored size) -> DecryptReader -> EntryDecoder -> sink
//! ```
//!
//! The CRC-32 is computed over the decoded output. Once the decoder reports
//! end of stream, any ciphertext left over is drained so the AES
//! authentication code is always checked, and the sizes and CRC are compared
//! with the central directory.

use std::io::{self, Read, Seek, SeekFrom, Take, Write};

use crate::checksum::Crc32;
use crate::codec::EntryDecoder;
use crate::crypto::DecryptReader;
use crate::format::header::LocalFileHeader;
use crate::format::LOCAL_FILE_HEADER_SIZE;
use crate::model::{ArchiveModel, EntryRecord};
use crate::progress::ProgressTracker;
use crate::{Error, Password, READ_BUFFER_SIZE, Result};

/// Returns the logical offset of an entry's stored payload.
pub(crate) fn payload_offset<R: Read + Seek + ?Sized>(
    reader: &mut R,
    model: &ArchiveModel,
    base_offset: u64,
    entry: &EntryRecord,
) -> Result<u64> {
    let header_offset = model
        .logical_offset(entry.disk_number, entry.local_header_offset)
        .ok_or_else(|| Error::VolumeMissing {
            volume: entry.disk_number + 1,
            path: format!("volume {}", entry.disk_number + 1),
            source: io::Error::new(io::ErrorKind::NotFound, "volume holding the entry is missing"),
        })?
        .saturating_add(base_offset);

    reader.seek(SeekFrom::Start(header_offset))?;
    let header = LocalFileHeader::parse(reader, header_offset)?;
    // The local extra field may differ from the central one.
    Ok(header_offset
        .saturating_add(LOCAL_FILE_HEADER_SIZE as u64)
        .saturating_add(header.file_name.len() as u64)
        .saturating_add(header.extra.len() as u64))
}

/// A decoding stream over one entry.
pub(crate) struct EntryStream<'a, R: Read> {
    decoder: EntryDecoder<DecryptReader<Take<&'a mut R>>>,
    entry: &'a EntryRecord,
}

impl<'a, R: Read + Seek> EntryStream<'a, R> {
    /// Positions `reader` at the payload and checks the password.
    ///
    /// Wrong passwords and unsupported methods are reported here, before
    /// any output exists.
    pub(crate) fn open(
        reader: &'a mut R,
        data_offset: u64,
        entry: &'a EntryRecord,
        password: Option<&Password>,
    ) -> Result<Self> {
        if !entry.compression.is_supported() {
            return Err(Error::unsupported_method(&entry.name, entry.compression.name()));
        }
        reader.seek(SeekFrom::Start(data_offset))?;
        let source = reader.take(entry.compressed_size);
        let decrypt = DecryptReader::new(
            source,
            entry.encryption,
            password,
            entry.check_byte(),
            entry.compressed_size,
            &entry.name,
        )?;
        let decoder = EntryDecoder::new(decrypt, entry.compression, &entry.name)?;
        Ok(Self { decoder, entry })
    }

    /// Copies the decoded entry into `out`, verifying it as it goes.
    ///
    /// Returns the number of bytes written.
    pub(crate) fn copy_to<W: Write + ?Sized>(
        mut self,
        out: &mut W,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<u64> {
        let entry = self.entry;
        let mut crc = Crc32::new();
        let mut written = 0u64;
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            tracker.check_cancelled()?;
            let n = match self.decoder.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.decode_failure(e)),
            };
            written += n as u64;
            if written > entry.uncompressed_size {
                let err = Error::corrupt_data(
                    &entry.name,
                    format!(
                        "decoded data exceeds the declared size of {} bytes",
                        entry.uncompressed_size
                    ),
                );
                return Err(self.authenticate_or(err));
            }
            crc.update(&buf[..n]);
            out.write_all(&buf[..n])?;
            tracker.advance(n)?;
        }

        let (mut decrypt, leftover) = self.decoder.into_source();
        let trailing = leftover as u64 + decrypt.drain()?;
        if trailing > 0 {
            return Err(Error::corrupt_data(
                &entry.name,
                format!("{} bytes follow the end of the compressed stream", trailing),
            ));
        }

        if written != entry.uncompressed_size {
            return Err(Error::corrupt_data(
                &entry.name,
                format!(
                    "decoded {} bytes, expected {}",
                    written, entry.uncompressed_size
                ),
            ));
        }

        if entry.crc_checked() {
            let actual = crc.finalize();
            if actual != entry.crc32 {
                return Err(Error::CrcMismatch {
                    entry_name: entry.name.clone(),
                    expected: entry.crc32,
                    actual,
                });
            }
        }

        Ok(written)
    }

    /// Turns a read error into the most specific crate error.
    ///
    /// For AES entries the remaining ciphertext is drained first, so a
    /// tampered entry reports [`Error::AuthenticationFailed`] rather than a
    /// decoding error.
    fn decode_failure(self, err: io::Error) -> Error {
        let io_err = match Error::from_io(err) {
            Error::Io(e) => e,
            other => return other,
        };
        if !matches!(
            io_err.kind(),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
        ) {
            return Error::Io(io_err);
        }

        let err = Error::corrupt_data(&self.entry.name, io_err.to_string());
        self.authenticate_or(err)
    }

    /// Drains the remaining ciphertext of an encrypted entry and returns
    /// [`Error::AuthenticationFailed`] if the AES code does not match,
    /// otherwise `err`.
    fn authenticate_or(self, err: Error) -> Error {
        if self.entry.encryption.is_encrypted() {
            let (mut decrypt, _) = self.decoder.into_source();
            if let Err(auth @ Error::AuthenticationFailed { .. }) = decrypt.drain() {
                return auth;
            }
        }
        err
    }
}

/// Decodes and verifies one entry into `out`.
pub(crate) fn stream_entry<R: Read + Seek, W: Write + ?Sized>(
    reader: &mut R,
    model: &ArchiveModel,
    base_offset: u64,
    entry: &EntryRecord,
    password: Option<&Password>,
    out: &mut W,
    tracker: &mut ProgressTracker<'_>,
) -> Result<u64> {
    let data_offset = payload_offset(reader, model, base_offset, entry)?;
    EntryStream::open(reader, data_offset, entry, password)?.copy_to(out, tracker)
}
