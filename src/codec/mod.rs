//! Compression methods for entry data.
//!
//! ZIP entries are either stored verbatim (method 0) or compressed with
//! Deflate (method 8). The decoder and encoder enums here dispatch between
//! the two so the read and write pipelines can stay method-agnostic.

#[cfg(feature = "deflate")]
pub mod deflate;

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// Compression method IDs as stored in ZIP headers.
pub mod method {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Deflate compression.
    pub const DEFLATED: u16 = 8;
}

/// Compression method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// Data stored without compression.
    Stored,
    /// Deflate compression.
    #[default]
    Deflated,
    /// Any other method; recognized but not decodable.
    Unsupported(u16),
}

impl CompressionMethod {
    /// Maps a header method ID.
    pub fn from_u16(id: u16) -> Self {
        match id {
            method::STORED => Self::Stored,
            method::DEFLATED => Self::Deflated,
            other => Self::Unsupported(other),
        }
    }

    /// Returns the header method ID.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflated => method::DEFLATED,
            Self::Unsupported(id) => id,
        }
    }

    /// Returns a human-readable name.
    pub fn name(self) -> String {
        match self {
            Self::Stored => "Store".into(),
            Self::Deflated => "Deflate".into(),
            Self::Unsupported(id) => format!("method {}", id),
        }
    }

    /// Returns true if this build can decode the method.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Stored => true,
            Self::Deflated => cfg!(feature = "deflate"),
            Self::Unsupported(_) => false,
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Deflate compression level.
///
/// # Example
///
/// ```rust
/// use zipkit::CompressionLevel;
///
/// assert_eq!(CompressionLevel::High.level().unwrap(), 9);
/// assert!(CompressionLevel::Level(12).level().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Fastest compression (level 1).
    Low,
    /// Balanced compression (level 6).
    #[default]
    Normal,
    /// Best compression (level 9).
    High,
    /// An explicit level from 0 to 9.
    Level(u32),
}

impl CompressionLevel {
    /// Returns the numeric level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] for levels above 9.
    pub fn level(self) -> Result<u32> {
        match self {
            Self::Low => Ok(1),
            Self::Normal => Ok(6),
            Self::High => Ok(9),
            Self::Level(n) if n <= 9 => Ok(n),
            Self::Level(n) => Err(Error::InvalidCompressionLevel(n)),
        }
    }
}

/// Decoder for one entry's compressed payload.
pub(crate) enum EntryDecoder<R: Read> {
    Stored(R),
    #[cfg(feature = "deflate")]
    Deflated(deflate::DeflateDecoder<R>),
}

impl<R: Read> EntryDecoder<R> {
    /// Creates the decoder for `method`.
    pub(crate) fn new(source: R, method: CompressionMethod, entry_name: &str) -> Result<Self> {
        match method {
            CompressionMethod::Stored => Ok(Self::Stored(source)),
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflated => Ok(Self::Deflated(deflate::DeflateDecoder::new(source))),
            other => Err(Error::unsupported_method(entry_name, other.name())),
        }
    }

    /// Returns the source and how many bytes were read from it without
    /// being consumed by the decoder.
    pub(crate) fn into_source(self) -> (R, usize) {
        match self {
            Self::Stored(r) => (r, 0),
            #[cfg(feature = "deflate")]
            Self::Deflated(d) => d.into_inner(),
        }
    }
}

impl<R: Read> Read for EntryDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stored(r) => r.read(buf),
            #[cfg(feature = "deflate")]
            Self::Deflated(d) => d.read(buf),
        }
    }
}

impl<R: Read> std::fmt::Debug for EntryDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored(_) => f.write_str("EntryDecoder::Stored"),
            #[cfg(feature = "deflate")]
            Self::Deflated(d) => d.fmt(f),
        }
    }
}

/// Encoder for one entry's payload.
pub(crate) enum EntryEncoder<W: Write> {
    Stored(W),
    #[cfg(feature = "deflate")]
    Deflated(deflate::DeflateEncoder<W>),
}

impl<W: Write> EntryEncoder<W> {
    /// Creates the encoder for `method`.
    pub(crate) fn new(
        sink: W,
        method: CompressionMethod,
        level: CompressionLevel,
        entry_name: &str,
    ) -> Result<Self> {
        match method {
            CompressionMethod::Stored => Ok(Self::Stored(sink)),
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflated => Ok(Self::Deflated(deflate::DeflateEncoder::new(
                sink,
                level.level()?,
            ))),
            other => {
                let _ = level;
                Err(Error::unsupported_method(entry_name, other.name()))
            }
        }
    }

    /// Flushes any pending compressed data and returns the sink.
    pub(crate) fn finish(self) -> io::Result<W> {
        match self {
            Self::Stored(w) => Ok(w),
            #[cfg(feature = "deflate")]
            Self::Deflated(e) => e.try_finish(),
        }
    }
}

impl<W: Write> Write for EntryEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stored(w) => w.write(buf),
            #[cfg(feature = "deflate")]
            Self::Deflated(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stored(w) => w.flush(),
            #[cfg(feature = "deflate")]
            Self::Deflated(e) => e.flush(),
        }
    }
}
