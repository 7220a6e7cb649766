//! WinZip AES encryption (AE-1 / AE-2).
//!
//! Payload layout of an AES entry:
//!
//! ```text
//! salt (8/12/16) | verifier (2) | ciphertext | authentication code (10)
//! ```
//!
//! Keys are derived with PBKDF2-HMAC-SHA1 over 1000 iterations. The derived
//! block is split into the AES key, the HMAC key and the two-byte password
//! verifier. Data is encrypted with AES in CTR mode using a little-endian
//! counter that starts at 1, and authenticated with HMAC-SHA1 over the
//! ciphertext, truncated to 10 bytes.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::{Zeroize, Zeroizing};

use super::{AesKeyStrength, Password};
use crate::{Error, PasswordDetectionMethod, Result};

/// Length of the password verification value.
pub const PASSWORD_VERIFIER_SIZE: usize = 2;

/// Length of the truncated HMAC-SHA1 authentication code.
pub const AUTH_CODE_SIZE: usize = 10;

/// PBKDF2 iteration count fixed by the WinZip format.
const ITERATION_COUNT: u32 = 1000;

const BLOCK_SIZE: usize = 16;

enum BlockCipher {
    Aes128(Box<Aes128>),
    Aes192(Box<Aes192>),
    Aes256(Box<Aes256>),
}

impl BlockCipher {
    fn new(strength: AesKeyStrength, key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::Io(std::io::Error::other("invalid AES key length"));
        Ok(match strength {
            AesKeyStrength::Aes128 => Self::Aes128(Box::new(
                Aes128::new_from_slice(key).map_err(invalid)?,
            )),
            AesKeyStrength::Aes192 => Self::Aes192(Box::new(
                Aes192::new_from_slice(key).map_err(invalid)?,
            )),
            AesKeyStrength::Aes256 => Self::Aes256(Box::new(
                Aes256::new_from_slice(key).map_err(invalid)?,
            )),
        })
    }

    fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let block = aes::Block::from_mut_slice(block);
        match self {
            Self::Aes128(cipher) => cipher.encrypt_block(block),
            Self::Aes192(cipher) => cipher.encrypt_block(block),
            Self::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }
}

/// Streaming AES-CTR + HMAC-SHA1 state for one entry.
pub struct AesCipher {
    cipher: BlockCipher,
    hmac: Hmac<Sha1>,
    counter: u128,
    keystream: [u8; BLOCK_SIZE],
    used: usize,
}

impl std::fmt::Debug for AesCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCipher").finish_non_exhaustive()
    }
}

impl AesCipher {
    /// Derives the entry keys from `password` and `salt`.
    ///
    /// Returns the cipher together with the password verification value
    /// that belongs in the payload right after the salt.
    pub fn new(
        strength: AesKeyStrength,
        password: &Password,
        salt: &[u8],
    ) -> Result<(Self, [u8; PASSWORD_VERIFIER_SIZE])> {
        let key_len = strength.key_len();
        let mut derived = Zeroizing::new(vec![0u8; 2 * key_len + PASSWORD_VERIFIER_SIZE]);
        pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, ITERATION_COUNT, &mut derived);

        let cipher = BlockCipher::new(strength, &derived[..key_len])?;
        let hmac = <Hmac<Sha1> as Mac>::new_from_slice(&derived[key_len..2 * key_len])
            .map_err(|_| Error::Io(std::io::Error::other("invalid HMAC key length")))?;
        let verifier = [derived[2 * key_len], derived[2 * key_len + 1]];

        Ok((
            Self {
                cipher,
                hmac,
                counter: 0,
                keystream: [0u8; BLOCK_SIZE],
                used: BLOCK_SIZE,
            },
            verifier,
        ))
    }

    /// Derives the keys for reading and checks the stored verifier.
    pub fn for_decryption(
        strength: AesKeyStrength,
        password: &Password,
        salt: &[u8],
        stored_verifier: [u8; PASSWORD_VERIFIER_SIZE],
        entry_name: &str,
    ) -> Result<Self> {
        let (cipher, verifier) = Self::new(strength, password, salt)?;
        if verifier != stored_verifier {
            return Err(Error::WrongPassword {
                entry_name: entry_name.to_string(),
                detection_method: PasswordDetectionMethod::PasswordVerifier,
            });
        }
        Ok(cipher)
    }

    fn apply_keystream(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            if self.used == BLOCK_SIZE {
                self.counter = self.counter.wrapping_add(1);
                self.keystream = self.counter.to_le_bytes();
                self.cipher.encrypt_block(&mut self.keystream);
                self.used = 0;
            }
            *byte ^= self.keystream[self.used];
            self.used += 1;
        }
    }

    /// Encrypts `buf` in place and feeds the ciphertext to the HMAC.
    pub fn encrypt(&mut self, buf: &mut [u8]) {
        self.apply_keystream(buf);
        self.hmac.update(buf);
    }

    /// Feeds the ciphertext to the HMAC and decrypts `buf` in place.
    pub fn decrypt(&mut self, buf: &mut [u8]) {
        self.hmac.update(buf);
        self.apply_keystream(buf);
    }

    /// Returns the authentication code over all ciphertext seen so far.
    pub fn auth_code(&self) -> [u8; AUTH_CODE_SIZE] {
        let full = self.hmac.clone().finalize().into_bytes();
        let mut code = [0u8; AUTH_CODE_SIZE];
        code.copy_from_slice(&full[..AUTH_CODE_SIZE]);
        code
    }

    /// Compares a stored authentication code in constant time.
    pub fn verify(&self, stored: &[u8]) -> bool {
        constant_time_eq(&self.auth_code(), stored)
    }
}

impl Drop for AesCipher {
    fn drop(&mut self) {
        self.keystream.zeroize();
        self.counter.zeroize();
    }
}

/// Generates a random salt of the length required by `strength`.
pub fn generate_salt(strength: AesKeyStrength) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; strength.salt_len()];
    getrandom::getrandom(&mut salt).map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    Ok(salt)
}
