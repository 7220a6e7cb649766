//! Entry encryption: traditional ZipCrypto and WinZip AES.
//!
//! Both schemes are exposed as streaming adapters:
//!
//! - [`DecryptReader`] consumes the encryption header, verifies the password
//!   before any plaintext is produced, and, for AES, checks the
//!   authentication code once the last ciphertext byte has been read.
//! - [`EncryptWriter`] emits the encryption header, encrypts everything
//!   written to it, and appends the authentication code on
//!   [`finish`](EncryptWriter::finish).
//!
//! Without the `aes` feature, AES entries are still recognised but fail with
//! [`Error::UnsupportedMethod`].

mod password;
#[cfg(feature = "aes")]
mod winzip_aes;
mod zip_crypto;

use std::io::{self, Read, Write};

use crate::format::flags;
use crate::{Error, Result};

#[cfg(feature = "aes")]
pub use winzip_aes::{AUTH_CODE_SIZE, AesCipher, PASSWORD_VERIFIER_SIZE};
pub use password::Password;
pub use zip_crypto::{ENCRYPTION_HEADER_SIZE, ZipCryptoKeys};

#[cfg(not(feature = "aes"))]
const PASSWORD_VERIFIER_SIZE: usize = 2;
#[cfg(not(feature = "aes"))]
const AUTH_CODE_SIZE: usize = 10;

/// AES key strength, as stored in the AES extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AesKeyStrength {
    /// 128-bit key, 8-byte salt.
    Aes128,
    /// 192-bit key, 12-byte salt. Readable; rarely produced by other tools.
    Aes192,
    /// 256-bit key, 16-byte salt.
    #[default]
    Aes256,
}

impl AesKeyStrength {
    /// Parses the strength code from the AES extra field.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Aes128),
            2 => Some(Self::Aes192),
            3 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Returns the strength code stored in the AES extra field.
    pub fn code(self) -> u8 {
        match self {
            Self::Aes128 => 1,
            Self::Aes192 => 2,
            Self::Aes256 => 3,
        }
    }

    /// Returns the key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Returns the salt length in bytes.
    pub fn salt_len(self) -> usize {
        self.key_len() / 2
    }
}

/// WinZip AES vendor version.
///
/// AE-1 stores the real CRC of the plaintext; AE-2 stores zero and relies on
/// the authentication code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AesVendorVersion {
    /// AE-1: CRC is stored and checked.
    Ae1,
    /// AE-2: CRC is zero and not checked.
    #[default]
    Ae2,
}

impl AesVendorVersion {
    /// Parses the vendor version from the AES extra field.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Ae1),
            2 => Some(Self::Ae2),
            _ => None,
        }
    }

    /// Returns the numeric vendor version.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ae1 => 1,
            Self::Ae2 => 2,
        }
    }
}

/// How an entry's payload is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncryptionMethod {
    /// Not encrypted.
    #[default]
    None,
    /// Traditional PKWARE encryption.
    ZipCrypto,
    /// WinZip AES with the given key strength.
    Aes(AesKeyStrength),
    /// An encryption scheme this crate cannot decrypt, such as PKWARE
    /// strong encryption.
    Unsupported,
}

impl EncryptionMethod {
    /// AES-128, as a convenience constant.
    pub const AES_128: Self = Self::Aes(AesKeyStrength::Aes128);
    /// AES-256, as a convenience constant.
    pub const AES_256: Self = Self::Aes(AesKeyStrength::Aes256);

    /// Returns true unless the method is [`EncryptionMethod::None`].
    pub fn is_encrypted(self) -> bool {
        self != Self::None
    }

    /// Bytes the scheme adds around the ciphertext.
    pub fn overhead(self) -> u64 {
        match self {
            Self::None | Self::Unsupported => 0,
            Self::ZipCrypto => ENCRYPTION_HEADER_SIZE as u64,
            Self::Aes(strength) => {
                (strength.salt_len() + PASSWORD_VERIFIER_SIZE + AUTH_CODE_SIZE) as u64
            }
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ZipCrypto => "ZipCrypto",
            Self::Aes(AesKeyStrength::Aes128) => "AES-128",
            Self::Aes(AesKeyStrength::Aes192) => "AES-192",
            Self::Aes(AesKeyStrength::Aes256) => "AES-256",
            Self::Unsupported => "unsupported encryption",
        }
    }
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the byte a ZipCrypto header must end with.
///
/// When CRC and sizes are deferred to a data descriptor the CRC is unknown
/// while the header is written, so the high byte of the DOS time is used.
pub(crate) fn zip_crypto_check_byte(general_flags: u16, crc32: u32, dos_time: u16) -> u8 {
    if general_flags & flags::DATA_DESCRIPTOR != 0 {
        (dos_time >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    }
}

enum EntryCipher {
    None,
    ZipCrypto(ZipCryptoKeys),
    #[cfg(feature = "aes")]
    Aes(Box<AesCipher>),
}

impl EntryCipher {
    fn decrypt(&mut self, buf: &mut [u8]) {
        match self {
            Self::None => {}
            Self::ZipCrypto(keys) => keys.decrypt(buf),
            #[cfg(feature = "aes")]
            Self::Aes(cipher) => cipher.decrypt(buf),
        }
    }

    fn encrypt(&mut self, buf: &mut [u8]) {
        match self {
            Self::None => {}
            Self::ZipCrypto(keys) => keys.encrypt(buf),
            #[cfg(feature = "aes")]
            Self::Aes(cipher) => cipher.encrypt(buf),
        }
    }
}

fn require_password<'a>(password: Option<&'a Password>, entry_name: &str) -> Result<&'a Password> {
    password.ok_or_else(|| Error::PasswordRequired {
        entry_name: entry_name.to_string(),
    })
}

#[cfg(not(feature = "aes"))]
fn aes_disabled(entry_name: &str, method: EncryptionMethod) -> Error {
    Error::unsupported_method(entry_name, format!("{} (feature `aes` disabled)", method))
}

/// Reads and decrypts the payload of one entry.
///
/// The reader is bounded to the entry's ciphertext; the encryption header
/// is consumed in [`DecryptReader::new`] and the AES authentication code is
/// consumed and verified when the last ciphertext byte is returned. An
/// authentication failure surfaces as an `io::Error` wrapping
/// [`Error::AuthenticationFailed`].
pub struct DecryptReader<R> {
    inner: R,
    cipher: EntryCipher,
    remaining: u64,
    entry_name: String,
    finished: bool,
}

impl<R> std::fmt::Debug for DecryptReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptReader")
            .field("entry_name", &self.entry_name)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<R: Read> DecryptReader<R> {
    /// Prepares decryption of an entry payload of `stored_size` bytes.
    ///
    /// `check_byte` is only used for ZipCrypto. Fails with
    /// [`Error::PasswordRequired`] or [`Error::WrongPassword`] before any
    /// plaintext is produced.
    pub fn new(
        mut inner: R,
        method: EncryptionMethod,
        password: Option<&Password>,
        check_byte: u8,
        stored_size: u64,
        entry_name: &str,
    ) -> Result<Self> {
        let truncated = || {
            Error::Truncated(format!(
                "payload of '{}' is shorter than its encryption overhead",
                entry_name
            ))
        };
        let remaining = stored_size
            .checked_sub(method.overhead())
            .ok_or_else(truncated)?;

        let cipher = match method {
            EncryptionMethod::None => EntryCipher::None,
            EncryptionMethod::Unsupported => {
                return Err(Error::unsupported_method(entry_name, method.name()));
            }
            EncryptionMethod::ZipCrypto => {
                let password = require_password(password, entry_name)?;
                let mut header = [0u8; ENCRYPTION_HEADER_SIZE];
                crate::format::reader::read_record(&mut inner, &mut header, "encryption header")?;
                let mut keys = ZipCryptoKeys::new(password);
                keys.check_header(header, check_byte, entry_name)?;
                EntryCipher::ZipCrypto(keys)
            }
            #[cfg(feature = "aes")]
            EncryptionMethod::Aes(strength) => {
                let password = require_password(password, entry_name)?;
                let mut salt = vec![0u8; strength.salt_len()];
                crate::format::reader::read_record(&mut inner, &mut salt, "AES salt")?;
                let mut verifier = [0u8; PASSWORD_VERIFIER_SIZE];
                crate::format::reader::read_record(&mut inner, &mut verifier, "AES verifier")?;
                let cipher =
                    AesCipher::for_decryption(strength, password, &salt, verifier, entry_name)?;
                EntryCipher::Aes(Box::new(cipher))
            }
            #[cfg(not(feature = "aes"))]
            EncryptionMethod::Aes(_) => {
                require_password(password, entry_name)?;
                return Err(aes_disabled(entry_name, method));
            }
        };

        Ok(Self {
            inner,
            cipher,
            remaining,
            entry_name: entry_name.to_string(),
            finished: false,
        })
    }

    /// Consumes the trailer once all ciphertext has been read.
    fn finish_payload(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        #[cfg(feature = "aes")]
        if let EntryCipher::Aes(cipher) = &self.cipher {
            let mut stored = [0u8; AUTH_CODE_SIZE];
            crate::format::reader::read_record(&mut self.inner, &mut stored, "authentication code")?;
            if !cipher.verify(&stored) {
                return Err(Error::AuthenticationFailed {
                    entry_name: self.entry_name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Reads and discards whatever is left of the payload, verifying the
    /// trailer. Returns the number of ciphertext bytes that were skipped.
    pub fn drain(&mut self) -> Result<u64> {
        let skipped = self.remaining;
        let mut buf = [0u8; crate::READ_BUFFER_SIZE];
        loop {
            match self.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::from_io(e)),
            }
        }
        Ok(skipped)
    }

    /// Returns the name of the entry being decrypted.
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }
}

impl<R: Read> Read for DecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            self.finish_payload()?;
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let max = self.remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(Error::Truncated(format!(
                "payload of '{}' ends {} bytes early",
                self.entry_name, self.remaining
            ))
            .into());
        }

        self.cipher.decrypt(&mut buf[..n]);
        self.remaining -= n as u64;
        if self.remaining == 0 {
            self.finish_payload()?;
        }
        Ok(n)
    }
}

/// Encrypts an entry payload on its way to the archive.
pub struct EncryptWriter<W: Write> {
    inner: W,
    cipher: EntryCipher,
    scratch: Vec<u8>,
    bytes_written: u64,
}

impl<W: Write> std::fmt::Debug for EncryptWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptWriter")
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl<W: Write> EncryptWriter<W> {
    /// Writes the encryption header for `method` and returns the adapter.
    ///
    /// `check_byte` is only used for ZipCrypto.
    pub fn new(
        mut inner: W,
        method: EncryptionMethod,
        password: Option<&Password>,
        check_byte: u8,
        entry_name: &str,
    ) -> Result<Self> {
        let mut bytes_written = 0u64;
        let cipher = match method {
            EncryptionMethod::None => EntryCipher::None,
            EncryptionMethod::Unsupported => {
                return Err(Error::unsupported_method(entry_name, method.name()));
            }
            EncryptionMethod::ZipCrypto => {
                let password = require_password(password, entry_name)?;
                let mut keys = ZipCryptoKeys::new(password);
                let header = keys.encryption_header(check_byte)?;
                inner.write_all(&header)?;
                bytes_written += header.len() as u64;
                EntryCipher::ZipCrypto(keys)
            }
            #[cfg(feature = "aes")]
            EncryptionMethod::Aes(strength) => {
                let password = require_password(password, entry_name)?;
                let salt = winzip_aes::generate_salt(strength)?;
                let (cipher, verifier) = AesCipher::new(strength, password, &salt)?;
                inner.write_all(&salt)?;
                inner.write_all(&verifier)?;
                bytes_written += (salt.len() + verifier.len()) as u64;
                EntryCipher::Aes(Box::new(cipher))
            }
            #[cfg(not(feature = "aes"))]
            EncryptionMethod::Aes(_) => {
                require_password(password, entry_name)?;
                return Err(aes_disabled(entry_name, method));
            }
        };

        Ok(Self {
            inner,
            cipher,
            scratch: Vec::new(),
            bytes_written,
        })
    }

    /// Writes the AES authentication code, if any, and returns the inner
    /// writer with the total number of bytes emitted.
    pub fn finish(mut self) -> io::Result<(W, u64)> {
        #[cfg(feature = "aes")]
        if let EntryCipher::Aes(cipher) = &self.cipher {
            let code = cipher.auth_code();
            self.inner.write_all(&code)?;
            self.bytes_written += code.len() as u64;
        }
        Ok((self.inner, self.bytes_written))
    }

    /// Returns a mutable reference to the inner writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: Write> Write for EncryptWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let EntryCipher::None = self.cipher {
            let n = self.inner.write(buf)?;
            self.bytes_written += n as u64;
            return Ok(n);
        }
        // Keystreams advance per byte, so the whole chunk must reach the
        // inner writer once it has been encrypted.
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.cipher.encrypt(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        self.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
