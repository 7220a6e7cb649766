//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with ZIP archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Categories
//!
//! Every variant belongs to one of a small number of categories, which can be
//! queried with the predicate methods on [`Error`]:
//!
//! | Category | Predicate | Variants |
//! |----------|-----------|----------|
//! | Format | [`Error::is_format_error`] | `BadSignature`, `NotAZip`, `Truncated`, `CorruptData`, `CrcMismatch`, `EntryNotFound` |
//! | Crypto | [`Error::is_crypto_error`] | `WrongPassword`, `AuthenticationFailed`, `UnsupportedMethod`, `PasswordRequired` |
//! | Security | [`Error::is_security_error`] | `PathTraversal`, `InvalidArchivePath` |
//! | I/O | - | `Io`, `VolumeMissing` |
//!
//! # Example
//!
//! ```rust,no_run
//! use zipkit::{Archive, Error, ExtractOptions};
//!
//! fn extract(path: &str, dest: &str) -> zipkit::Result<()> {
//!     let mut archive = Archive::open_path(path)?;
//!     match archive.extract_entry("report.pdf", dest, None, &ExtractOptions::default()) {
//!         Ok(_) => Ok(()),
//!         Err(Error::EntryNotFound { name }) => {
//!             eprintln!("missing entry: {}", name);
//!             Ok(())
//!         }
//!         Err(e @ Error::WrongPassword { .. }) => {
//!             eprintln!("Incorrect password. Please try again.");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

/// Which record a signature mismatch was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordKind {
    /// Local file header (`PK\x03\x04`).
    LocalFileHeader,
    /// Central directory file header (`PK\x01\x02`).
    CentralDirectoryHeader,
    /// Data descriptor (`PK\x07\x08`).
    DataDescriptor,
    /// End of central directory record (`PK\x05\x06`).
    EndOfCentralDirectory,
    /// Zip64 end of central directory record (`PK\x06\x06`).
    Zip64EndOfCentralDirectory,
    /// Zip64 end of central directory locator (`PK\x06\x07`).
    Zip64Locator,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LocalFileHeader => "local file header",
            Self::CentralDirectoryHeader => "central directory header",
            Self::DataDescriptor => "data descriptor",
            Self::EndOfCentralDirectory => "end of central directory record",
            Self::Zip64EndOfCentralDirectory => "zip64 end of central directory record",
            Self::Zip64Locator => "zip64 end of central directory locator",
        };
        f.write_str(name)
    }
}

/// How a wrong password was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PasswordDetectionMethod {
    /// The last byte of the decrypted 12-byte ZipCrypto header did not match
    /// the CRC (or modification time) check byte.
    EncryptionHeaderCheck,
    /// The two-byte AES password verification value did not match.
    PasswordVerifier,
}

impl std::fmt::Display for PasswordDetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EncryptionHeaderCheck => write!(f, "encryption header check byte"),
            Self::PasswordVerifier => write!(f, "password verification value"),
        }
    }
}

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_name: &'a str,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CRC mismatch for entry '{}': expected {:#010x}, got {:#010x}",
            self.entry_name, self.expected, self.actual
        )
    }
}

/// The main error type for ZIP archive operations.
///
/// Each variant includes enough context (usually the entry name) to tell the
/// caller which part of the archive was at fault.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading or writing the underlying storage.
    ///
    /// I/O failures are propagated as-is and never retried.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record did not start with its expected 4-byte signature.
    #[error("Bad signature for {record} at offset {offset:#x}: found {found:#010x}")]
    BadSignature {
        /// The record that was being decoded.
        record: RecordKind,
        /// Logical offset of the record.
        offset: u64,
        /// The signature value that was actually read.
        found: u32,
    },

    /// No end of central directory record was found.
    ///
    /// Returned for empty files and for files that are not ZIP archives.
    #[error("Not a ZIP archive: {0}")]
    NotAZip(String),

    /// A declared record or field length runs past the end of the stream.
    #[error("Truncated archive: {0}")]
    Truncated(String),

    /// Entry data could not be decoded.
    ///
    /// Produced by invalid deflate streams, trailing bytes after the final
    /// deflate block, and inconsistent header fields.
    #[error("Corrupt data in entry '{entry_name}': {reason}")]
    CorruptData {
        /// The affected entry.
        entry_name: String,
        /// A description of the problem.
        reason: String,
    },

    /// The CRC-32 of the extracted plaintext does not match the recorded value.
    ///
    /// For ZipCrypto entries this is the only way tampering is detected.
    #[error("{}", CrcMismatchDisplay { entry_name, expected: *expected, actual: *actual })]
    CrcMismatch {
        /// The affected entry.
        entry_name: String,
        /// The CRC recorded in the central directory.
        expected: u32,
        /// The CRC of the data that was actually produced.
        actual: u32,
    },

    /// No entry with the requested name exists in the archive.
    #[error("No file found with name {name} in zip file")]
    EntryNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The password is incorrect.
    ///
    /// Detected before any plaintext is produced, either from the ZipCrypto
    /// encryption header or from the AES password verification value.
    #[error("Wrong password for entry '{entry_name}' (detected by {detection_method})")]
    WrongPassword {
        /// The entry whose password check failed.
        entry_name: String,
        /// How the wrong password was detected.
        detection_method: PasswordDetectionMethod,
    },

    /// The AES authentication code did not match the ciphertext.
    ///
    /// Indicates tampering or corruption of an AES-encrypted entry. Output
    /// already produced for the entry must be discarded.
    #[error("Authentication code mismatch for entry '{entry_name}'")]
    AuthenticationFailed {
        /// The affected entry.
        entry_name: String,
    },

    /// The entry uses a compression or encryption method this build cannot handle.
    #[error("Unsupported method for entry '{entry_name}': {method}")]
    UnsupportedMethod {
        /// The affected entry.
        entry_name: String,
        /// Human-readable description of the method.
        method: String,
    },

    /// An encrypted entry was accessed without a password.
    #[error("Password required for encrypted entry '{entry_name}'")]
    PasswordRequired {
        /// The encrypted entry.
        entry_name: String,
    },

    /// Path traversal attack detected in an archive entry.
    ///
    /// The entry path would resolve outside the extraction directory.
    #[error("Path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// The entry index with path traversal.
        entry_index: usize,
        /// The offending path.
        path: String,
    },

    /// A name supplied for a new entry is not a valid archive path.
    #[error("Invalid archive path '{path}': {reason}")]
    InvalidArchivePath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The operation was cancelled through a progress reporter.
    ///
    /// Partially written output is left in place.
    #[error("Operation cancelled")]
    Cancelled,

    /// A volume of a split archive could not be opened.
    #[error("Missing volume {volume} ({path})")]
    VolumeMissing {
        /// The 1-based volume number.
        volume: u32,
        /// Path of the volume file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configured split size is below the minimum.
    #[error("Invalid split size {size}: must be at least {minimum} bytes")]
    InvalidSplitSize {
        /// The requested volume size.
        size: u64,
        /// The minimum allowed volume size.
        minimum: u64,
    },

    /// An entry outgrew 32-bit fields but was not written with Zip64 records.
    ///
    /// Either set [`Zip64Mode::Always`](crate::write::Zip64Mode::Always) or
    /// provide a size hint so the writer can reserve Zip64 fields up front.
    #[error("Entry '{entry_name}' requires Zip64 but was written without Zip64 fields")]
    Zip64Required {
        /// The entry that exceeded the 32-bit limits.
        entry_name: String,
    },

    /// The requested compression level is out of range.
    #[error("Invalid compression level {0}: must be between 0 and 9")]
    InvalidCompressionLevel(u32),

    /// The destination file exists and the overwrite policy forbids replacing it.
    #[error("File already exists: {path}")]
    EntryExists {
        /// The existing destination path.
        path: String,
    },

    /// The writer was used after `finish`.
    #[error("Writer is closed")]
    WriterClosed,
}

impl Error {
    /// Returns `true` if this error describes malformed or missing archive content.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::BadSignature { .. }
                | Error::NotAZip(_)
                | Error::Truncated(_)
                | Error::CorruptData { .. }
                | Error::CrcMismatch { .. }
                | Error::EntryNotFound { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Error::WrongPassword { .. }
                | Error::AuthenticationFailed { .. }
                | Error::UnsupportedMethod { .. }
                | Error::PasswordRequired { .. }
        )
    }

    /// Returns `true` if this error indicates a security issue.
    ///
    /// Security errors should generally cause extraction to abort unless
    /// the archive source is fully trusted.
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            Error::PathTraversal { .. } | Error::InvalidArchivePath { .. }
        )
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. }
                | Error::CorruptData { .. }
                | Error::AuthenticationFailed { .. }
                | Error::Truncated(_)
        )
    }

    /// Returns `true` if this error might be recoverable.
    ///
    /// - `WrongPassword` and `PasswordRequired`: retry with a password
    /// - `VolumeMissing`: the user can supply the missing volume
    /// - `Cancelled`: the operation can be restarted
    /// - `Io` with a transient kind
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::WrongPassword { .. } | Error::PasswordRequired { .. } => true,
            Error::Cancelled => true,
            Error::VolumeMissing { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::CorruptData { entry_name, .. }
            | Error::CrcMismatch { entry_name, .. }
            | Error::WrongPassword { entry_name, .. }
            | Error::AuthenticationFailed { entry_name }
            | Error::UnsupportedMethod { entry_name, .. }
            | Error::PasswordRequired { entry_name }
            | Error::Zip64Required { entry_name } => Some(entry_name),
            Error::EntryNotFound { name } => Some(name),
            Error::PathTraversal { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Creates a CorruptData error.
    pub fn corrupt_data(entry_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CorruptData {
            entry_name: entry_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an UnsupportedMethod error.
    pub fn unsupported_method(entry_name: impl Into<String>, method: impl Into<String>) -> Self {
        Error::UnsupportedMethod {
            entry_name: entry_name.into(),
            method: method.into(),
        }
    }

    /// Converts an I/O error produced inside a stream adapter back into the
    /// typed error it carries, if any.
    ///
    /// Adapters implementing [`Read`](std::io::Read) or [`Write`](std::io::Write)
    /// can only report `io::Error`, so crate errors travel through them wrapped
    /// with [`io::Error::other`].
    pub(crate) fn from_io(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            _ => Error::Io(io::Error::from(kind)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => io::Error::other(other),
        }
    }
}

/// A specialized Result type for ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;
