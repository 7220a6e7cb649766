//! # zipkit
//!
//! A pure-Rust library for reading and writing ZIP archives.
//!
//! Entries are stored or Deflate-compressed and may be encrypted with
//! traditional PKWARE encryption (ZipCrypto) or WinZip AES (AE-1/AE-2,
//! 128/192/256-bit). Zip64 archives and split archives (`.z01`, `.z02`, ...,
//! `.zip`) are supported on both sides.
//!
//! ## Quick Start
//!
//! ### Extracting an Archive
//!
//! ```rust,no_run
//! use zipkit::{Archive, ExtractOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open_path("archive.zip")?;
//!
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//!     }
//!
//!     archive.extract_all("./output", &ExtractOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use zipkit::{ArchivePath, Result, Writer};
//!
//! fn main() -> Result<()> {
//!     let mut writer = Writer::create_path("new.zip")?;
//!     writer.add_path("file.txt", ArchivePath::new("file.txt")?)?;
//!     writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//!
//!     let result = writer.finish()?;
//!     println!("Wrote {} entries ({:.1}% saved)",
//!         result.entries_written,
//!         result.space_savings() * 100.0);
//!     Ok(())
//! }
//! ```
//!
//! ### Encrypted Archives
//!
//! ```rust,no_run
//! use zipkit::{Archive, ArchivePath, EncryptionMethod, ExtractOptions, Result, WriteOptions, Writer};
//!
//! fn main() -> Result<()> {
//!     let options = WriteOptions::new()
//!         .encryption(EncryptionMethod::AES_256)
//!         .password("secret");
//!     let mut writer = Writer::create_path("encrypted.zip")?.options(options);
//!     writer.add_bytes(ArchivePath::new("secret.txt")?, b"Secret data")?;
//!     writer.finish()?;
//!
//!     let mut archive = Archive::open_path_with_password("encrypted.zip", "secret")?;
//!     archive.extract_entry("secret.txt", "./output", Some("plain.txt"), &ExtractOptions::new())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression via flate2 |
//! | `aes` | Yes | WinZip AES encryption |
//!
//! Without a feature, its method is still recognized but fails with
//! [`Error::UnsupportedMethod`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`:
//!
//! ```rust,no_run
//! use zipkit::{Archive, Error};
//!
//! fn open_archive(path: &str) -> zipkit::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("Opened archive with {} entries", archive.len());
//!             Ok(())
//!         }
//!         Err(Error::NotAZip(msg)) => {
//!             eprintln!("Not a ZIP file: {}", msg);
//!             Err(Error::NotAZip(msg))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ## Safety
//!
//! - **Path traversal protection**: entry names cannot escape the destination
//! - **Integrity checks**: CRC-32 and AES authentication codes are verified
//!   for every extracted entry
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive_path;
pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod format;
pub mod model;
pub mod progress;
pub mod read;
pub mod safety;
pub mod timestamp;
pub mod volume;
pub mod write;

pub use archive_path::ArchivePath;
pub use codec::{CompressionLevel, CompressionMethod};
pub use crypto::{AesKeyStrength, AesVendorVersion, EncryptionMethod, Password};
pub use error::{Error, PasswordDetectionMethod, RecordKind, Result};
pub use model::{ArchiveModel, EntryRecord, SplitInfo};
pub use timestamp::DosDateTime;

// Re-export reading API at crate root for convenience
pub use read::{
    Archive, EntrySelector, ExtractOptions, ExtractResult, FailurePolicy, OverwritePolicy,
    TestResult,
};

// Re-export writing API at crate root for convenience
pub use write::{EntryMeta, EntrySource, WriteOptions, WriteResult, Writer, Zip64Mode};

// Re-export volume API at crate root for convenience
pub use volume::VolumeConfig;

pub use safety::{PathSafety, validate_extract_path};

pub use progress::{AtomicProgress, NoProgress, ProgressReporter, progress_fn};
