//! The per-entry write pipeline.
//!
//! ```text
//! source -> CRC-32 -> EntryEncoder -> EncryptWriter -> sink
//! ```
//!
//! The local header goes out first with the data descriptor flag set, the
//! payload follows, and the descriptor closes the entry with the CRC and
//! sizes. Headers and descriptors are never split across volumes; the
//! payload may be.

use std::io::{self, Read, Write};

use crate::checksum::Crc32;
use crate::codec::EntryEncoder;
use crate::crypto::{EncryptWriter, zip_crypto_check_byte};
use crate::format::ZIP64_BYTES_THRESHOLD;
use crate::format::header::DataDescriptor;
use crate::model::EntryRecord;
use crate::progress::ProgressTracker;
use crate::volume::ArchiveSink;
use crate::{Error, READ_BUFFER_SIZE, Result};

use super::Writer;
use super::header_encode::{EntryLayout, WrittenEntry};
use super::options::{EntryMeta, WriteOptions};

impl<S: ArchiveSink> Writer<S> {
    /// Writes one entry and records it for the central directory.
    ///
    /// `source` is `None` for directories. If the entry fails, nothing is
    /// recorded and the writer stays usable; bytes already written remain
    /// in the stream as unreferenced data.
    pub(crate) fn write_entry(
        &mut self,
        name: String,
        source: Option<&mut dyn Read>,
        meta: &EntryMeta,
    ) -> Result<()> {
        if !meta.is_directory {
            self.options.validate(&name)?;
        }
        if self.entries.iter().any(|e| e.name == name) {
            log::warn!("archive already has an entry named '{}'", name);
        }

        let layout = EntryLayout::new(name, meta, &self.options);
        layout.check_lengths()?;
        let mut tracker =
            ProgressTracker::new(self.progress.as_deref(), meta.size_hint.unwrap_or(0));
        tracker.check_cancelled()?;
        tracker.entry_start(&layout.name, meta.size_hint.unwrap_or(0));

        let outcome = write_payload(&mut self.sink, &layout, source, &self.options, &mut tracker);
        tracker.entry_complete(&layout.name, outcome.is_ok());
        let written = outcome?;

        let header = layout.central_header(&written);
        let record = EntryRecord::from_central_header(self.entries.len(), &header)?;
        log::trace!(
            "wrote '{}' at disk {} offset {:#x} ({} -> {} bytes)",
            record.name,
            written.disk,
            written.offset,
            written.uncompressed_size,
            written.compressed_size
        );

        if record.is_directory {
            self.stats.directories_written += 1;
        } else {
            self.stats.entries_written += 1;
        }
        self.stats.total_size += written.uncompressed_size;
        self.stats.compressed_size += written.compressed_size;
        self.headers.push(header);
        self.entries.push(record);
        Ok(())
    }
}

/// Streams one entry into `sink`: local header, payload, data descriptor.
fn write_payload<S: ArchiveSink>(
    sink: &mut S,
    layout: &EntryLayout,
    source: Option<&mut dyn Read>,
    options: &WriteOptions,
    tracker: &mut ProgressTracker<'_>,
) -> Result<WrittenEntry> {
    let local = layout.local_header().encode();
    let (disk, offset) = sink.reserve(local.len() as u64).map_err(Error::from_io)?;
    sink.write_record(&local).map_err(Error::from_io)?;

    let check_byte = zip_crypto_check_byte(layout.flags, 0, layout.modified.raw_time());
    let encrypt = EncryptWriter::new(
        &mut *sink,
        layout.encryption,
        options.password.as_ref(),
        check_byte,
        &layout.name,
    )?;
    let mut encoder = EntryEncoder::new(encrypt, layout.compression, options.level, &layout.name)?;

    let mut crc = Crc32::new();
    let mut uncompressed_size = 0u64;
    if let Some(source) = source {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            tracker.check_cancelled()?;
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from_io(e)),
            };
            crc.update(&buf[..n]);
            encoder.write_all(&buf[..n]).map_err(Error::from_io)?;
            uncompressed_size += n as u64;
            tracker.advance(n)?;
        }
    }

    let encrypt = encoder.finish().map_err(Error::from_io)?;
    let (_, compressed_size) = encrypt.finish().map_err(Error::from_io)?;

    if !layout.local_zip64
        && (compressed_size >= ZIP64_BYTES_THRESHOLD || uncompressed_size >= ZIP64_BYTES_THRESHOLD)
    {
        return Err(Error::Zip64Required {
            entry_name: layout.name.clone(),
        });
    }

    let crc32 = if layout.stores_crc() { crc.finalize() } else { 0 };
    let descriptor = DataDescriptor {
        crc32,
        compressed_size,
        uncompressed_size,
    }
    .encode(layout.local_zip64);
    sink.reserve(descriptor.len() as u64).map_err(Error::from_io)?;
    sink.write_record(&descriptor).map_err(Error::from_io)?;

    Ok(WrittenEntry {
        disk,
        offset,
        crc32,
        compressed_size,
        uncompressed_size,
    })
}
