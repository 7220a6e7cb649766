//! Deflate codec implementation.

use std::io::{self, BufReader, Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder as FlateDecoder;
use flate2::write::DeflateEncoder as FlateEncoder;

/// Deflate decoder.
///
/// Wraps its source in a [`BufReader`] so that the bytes read past the end
/// of the deflate stream can be reported by [`into_inner`](Self::into_inner).
pub struct DeflateDecoder<R> {
    inner: FlateDecoder<BufReader<R>>,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> DeflateDecoder<R> {
    /// Creates a new Deflate decoder.
    pub fn new(input: R) -> Self {
        Self::with_capacity(crate::READ_BUFFER_SIZE, input)
    }

    /// Creates a decoder with a custom input buffer size.
    pub fn with_capacity(capacity: usize, input: R) -> Self {
        Self {
            inner: FlateDecoder::new(BufReader::with_capacity(capacity, input)),
        }
    }

    /// Returns the source and the number of buffered bytes that were read
    /// from it but not consumed by the deflate stream.
    pub fn into_inner(self) -> (R, usize) {
        let reader = self.inner.into_inner();
        let leftover = reader.buffer().len();
        (reader.into_inner(), leftover)
    }
}

impl<R: Read> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Deflate encoder.
pub struct DeflateEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for DeflateEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> DeflateEncoder<W> {
    /// Creates a new Deflate encoder at the given level (0-9).
    pub fn new(output: W, level: u32) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(level.min(9))),
        }
    }

    /// Finishes encoding and returns the output.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
