//! Output targets for the archive writer.

use std::io::{self, Write};

/// Where an archive writer sends its bytes.
///
/// Besides plain [`Write`], a sink reports the volume-relative position of
/// the next byte and can keep a record (header, data descriptor or the
/// trailing directory block) from being split across volumes.
pub trait ArchiveSink: Write {
    /// What [`into_inner`](ArchiveSink::into_inner) hands back.
    type Inner;

    /// Returns `(volume index, offset within volume)` of the next byte.
    fn position(&self) -> (u32, u64);

    /// Makes room for a `len`-byte record in the current volume, starting a
    /// new volume if it does not fit. Returns where the record will start.
    fn reserve(&mut self, len: u64) -> io::Result<(u32, u64)>;

    /// Writes a record previously announced with [`reserve`](ArchiveSink::reserve)
    /// without splitting it.
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    /// Flushes all data and closes the last volume. Returns the size of every
    /// volume for split archives, or an empty list for a single stream.
    fn finish_volumes(&mut self) -> io::Result<Vec<u64>>;

    /// Consumes the sink, returning the underlying output.
    fn into_inner(self) -> Self::Inner;
}

/// A single, unsplit output stream.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
    offset: u64,
}

impl<W: Write> StreamSink<W> {
    /// Wraps `inner`, whose next byte is at archive offset 0.
    pub fn new(inner: W) -> Self {
        Self::with_offset(inner, 0)
    }

    /// Wraps `inner`, whose next byte is at archive offset `offset`.
    pub fn with_offset(inner: W, offset: u64) -> Self {
        Self { inner, offset }
    }
}

impl<W: Write> Write for StreamSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> ArchiveSink for StreamSink<W> {
    type Inner = W;

    fn position(&self) -> (u32, u64) {
        (0, self.offset)
    }

    fn reserve(&mut self, _len: u64) -> io::Result<(u32, u64)> {
        Ok(self.position())
    }

    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.write_all(record)
    }

    fn finish_volumes(&mut self) -> io::Result<Vec<u64>> {
        self.inner.flush()?;
        Ok(Vec::new())
    }

    fn into_inner(self) -> W {
        self.inner
    }
}
