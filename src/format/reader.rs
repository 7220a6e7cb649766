//! Low-level binary reading utilities for ZIP record parsing.

use std::io::{self, Read};

use crate::{Error, Result};

/// A little-endian cursor over an in-memory record.
///
/// Every accessor fails with [`Error::Truncated`] instead of panicking when
/// the record is shorter than its fields claim.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader over `data`. `context` names the record in error messages.
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns the current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads `count` bytes.
    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::Truncated(format!(
                "{}: need {} bytes at offset {}, only {} available",
                self.context,
                count,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Reads a u8.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    /// Reads a little-endian u16.
    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a little-endian u32.
    pub fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a little-endian u64.
    pub fn u64(&mut self) -> Result<u64> {
        let b = self.bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }
}

/// Reads exactly `buf.len()` bytes, reporting a short read as [`Error::Truncated`].
pub fn read_record<R: Read + ?Sized>(r: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated(format!("unexpected end of stream while reading {}", what))
        } else {
            Error::Io(e)
        }
    })
}

/// Reads `len` bytes into a new vector, reporting a short read as [`Error::Truncated`].
pub fn read_vec<R: Read + ?Sized>(r: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_record(r, &mut buf, what)?;
    Ok(buf)
}

/// Reads a little-endian u32 from a stream.
pub fn read_u32_le<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
