//! Low-level binary writing utilities for ZIP record encoding.

/// Little-endian append helpers for building records in memory.
pub trait LeWrite {
    /// Appends a u8.
    fn put_u8(&mut self, value: u8);
    /// Appends a little-endian u16.
    fn put_u16(&mut self, value: u16);
    /// Appends a little-endian u32.
    fn put_u32(&mut self, value: u32);
    /// Appends a little-endian u64.
    fn put_u64(&mut self, value: u64);
    /// Appends raw bytes.
    fn put_bytes(&mut self, bytes: &[u8]);
}

impl LeWrite for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Clamps a value to a 32-bit field, writing the Zip64 sentinel if it does not fit.
pub fn u32_or_sentinel(value: u64, force_sentinel: bool) -> u32 {
    if force_sentinel || value >= super::ZIP64_BYTES_THRESHOLD {
        super::ZIP64_SENTINEL_U32
    } else {
        value as u32
    }
}

/// Clamps a value to a 16-bit field, writing the Zip64 sentinel if it does not fit.
pub fn u16_or_sentinel(value: u64, force_sentinel: bool) -> u16 {
    if force_sentinel || value >= super::ZIP64_SENTINEL_U16 as u64 {
        super::ZIP64_SENTINEL_U16
    } else {
        value as u16
    }
}
