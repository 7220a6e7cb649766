//! Traditional PKWARE encryption ("ZipCrypto").
//!
//! Three 32-bit keys are initialised from the password and then advanced
//! once per plaintext byte. The keystream byte for position `n` depends on
//! every plaintext byte before it, so data must be processed strictly in
//! order.
//!
//! The scheme is cryptographically weak. It is supported for compatibility
//! with archives produced by legacy tools.

use zeroize::Zeroize;

use super::Password;
use crate::{Error, PasswordDetectionMethod, Result};

/// Length of the encryption header that precedes ZipCrypto ciphertext.
pub const ENCRYPTION_HEADER_SIZE: usize = 12;

/// CRC-32 lookup table used by the key schedule.
///
/// The key schedule needs the raw one-byte CRC step without the usual
/// pre/post inversion, so it cannot reuse a streaming CRC hasher.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

#[inline]
fn crc32_step(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
}

/// The three-key ZipCrypto state for one entry.
#[derive(Clone)]
pub struct ZipCryptoKeys {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl std::fmt::Debug for ZipCryptoKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCryptoKeys").finish_non_exhaustive()
    }
}

impl ZipCryptoKeys {
    /// Initialises the keys from a password.
    pub fn new(password: &Password) -> Self {
        let mut keys = Self {
            key0: 0x1234_5678,
            key1: 0x2345_6789,
            key2: 0x3456_7890,
        };
        for &byte in password.as_bytes() {
            keys.update(byte);
        }
        keys
    }

    #[inline]
    fn update(&mut self, byte: u8) {
        self.key0 = crc32_step(self.key0, byte);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xFF)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        self.key2 = crc32_step(self.key2, (self.key1 >> 24) as u8);
    }

    #[inline]
    fn stream_byte(&self) -> u8 {
        let temp = (self.key2 | 2) as u16;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    /// Decrypts `buf` in place.
    pub fn decrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            let plain = *byte ^ self.stream_byte();
            self.update(plain);
            *byte = plain;
        }
    }

    /// Encrypts `buf` in place.
    pub fn encrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            let plain = *byte;
            *byte = plain ^ self.stream_byte();
            self.update(plain);
        }
    }

    /// Builds and encrypts a fresh 12-byte encryption header.
    ///
    /// The first 11 bytes are random; the last one is `check_byte`, which
    /// readers compare to detect a wrong password.
    pub fn encryption_header(&mut self, check_byte: u8) -> Result<[u8; ENCRYPTION_HEADER_SIZE]> {
        let mut header = [0u8; ENCRYPTION_HEADER_SIZE];
        getrandom::getrandom(&mut header[..ENCRYPTION_HEADER_SIZE - 1])
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        header[ENCRYPTION_HEADER_SIZE - 1] = check_byte;
        self.encrypt(&mut header);
        Ok(header)
    }

    /// Decrypts an encryption header and verifies its check byte.
    pub fn check_header(
        &mut self,
        mut header: [u8; ENCRYPTION_HEADER_SIZE],
        check_byte: u8,
        entry_name: &str,
    ) -> Result<()> {
        self.decrypt(&mut header);
        if header[ENCRYPTION_HEADER_SIZE - 1] != check_byte {
            return Err(Error::WrongPassword {
                entry_name: entry_name.to_string(),
                detection_method: PasswordDetectionMethod::EncryptionHeaderCheck,
            });
        }
        Ok(())
    }
}

impl Drop for ZipCryptoKeys {
    fn drop(&mut self) {
        self.key0.zeroize();
        self.key1.zeroize();
        self.key2.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Payload of "test.txt" from an archive made by a reference tool with
    // password "test": 12-byte header followed by 35 stored bytes. The
    // entry's CRC is 0x55792f20, so the check byte is 0x55.
    const REFERENCE_PAYLOAD: [u8; 47] = [
        0xca, 0x2d, 0x1d, 0x27, 0x19, 0x19, 0x63, 0x43, 0x77, 0x9a, 0x71, 0x76, 0xc9, 0xec, 0xd1,
        0x6f, 0xd9, 0xf5, 0x22, 0x67, 0xb3, 0x8f, 0x52, 0xb5, 0x41, 0xbc, 0x5c, 0x36, 0xf2, 0x1d,
        0x84, 0xc3, 0xc0, 0x28, 0x3b, 0xfd, 0xe1, 0x70, 0xc2, 0xcc, 0x0c, 0x11, 0x0c, 0xc5, 0x95,
        0x2f, 0xa4,
    ];

    fn split_reference() -> ([u8; 12], Vec<u8>) {
        let mut header = [0u8; 12];
        header.copy_from_slice(&REFERENCE_PAYLOAD[..12]);
        (header, REFERENCE_PAYLOAD[12..].to_vec())
    }

    #[test]
    fn test_crc_table() {
        assert_eq!(CRC32_TABLE[0], 0);
        assert_eq!(CRC32_TABLE[1], 0x7707_3096);
        assert_eq!(CRC32_TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn test_decrypt_reference_payload() {
        let (header, mut body) = split_reference();
        let mut keys = ZipCryptoKeys::new(&Password::new("test"));
        keys.check_header(header, 0x55, "test.txt").unwrap();
        keys.decrypt(&mut body);
        assert_eq!(body, b"abcdefghijklmnopqrstuvwxyz123456789");
    }

    #[test]
    fn test_wrong_password_detected_by_header() {
        let (header, _) = split_reference();
        let mut keys = ZipCryptoKeys::new(&Password::new("wrong password"));
        // A wrong password passes the single-byte check with probability 1/256;
        // this particular password is known to fail it.
        let err = keys.check_header(header, 0x55, "test.txt").unwrap_err();
        assert!(matches!(
            err,
            Error::WrongPassword {
                detection_method: PasswordDetectionMethod::EncryptionHeaderCheck,
                ..
            }
        ));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let password = Password::new("secret");
        let mut writer_keys = ZipCryptoKeys::new(&password);
        let header = writer_keys.encryption_header(0xAB).unwrap();
        let mut data = b"The quick brown fox jumps over the lazy dog".to_vec();
        writer_keys.encrypt(&mut data);
        assert_ne!(&data[..], b"The quick brown fox jumps over the lazy dog");

        let mut reader_keys = ZipCryptoKeys::new(&password);
        reader_keys.check_header(header, 0xAB, "fox.txt").unwrap();
        reader_keys.decrypt(&mut data);
        assert_eq!(&data[..], b"The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_chunked_processing_matches_whole() {
        let password = Password::new("pw");
        let plain: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut whole = plain.clone();
        ZipCryptoKeys::new(&password).encrypt(&mut whole);

        let mut chunked = plain.clone();
        let mut keys = ZipCryptoKeys::new(&password);
        for chunk in chunked.chunks_mut(7) {
            keys.encrypt(chunk);
        }
        assert_eq!(whole, chunked);
    }
}
