//! Write options and configuration for archive creation.

use std::path::Path;

use crate::codec::{CompressionLevel, CompressionMethod};
use crate::crypto::{AesKeyStrength, AesVendorVersion, EncryptionMethod, Password};
use crate::model::ArchiveModel;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// When the writer emits Zip64 structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zip64Mode {
    /// Only where a value does not fit its 16- or 32-bit field.
    ///
    /// Entries larger than 4 GiB need a size hint (see
    /// [`EntryMeta::size_hint`]) so their local header can carry the Zip64
    /// extra field; otherwise they fail with [`Error::Zip64Required`].
    #[default]
    Auto,
    /// Every entry and the end records use Zip64, whatever their size.
    Always,
}

/// Options for creating archives.
///
/// Applies to every entry added after the options are set.
///
/// # Example
///
/// ```rust
/// use zipkit::{CompressionLevel, EncryptionMethod, WriteOptions};
///
/// let options = WriteOptions::new()
///     .level(CompressionLevel::High)
///     .encryption(EncryptionMethod::AES_256)
///     .password("secret")
///     .comment("nightly build");
/// assert!(options.is_encrypted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Compression method for file entries.
    pub method: CompressionMethod,
    /// Deflate level.
    pub level: CompressionLevel,
    /// Encryption applied to file entries.
    pub encryption: EncryptionMethod,
    /// WinZip AES vendor version for AES entries.
    pub aes_version: AesVendorVersion,
    /// Password for encrypted entries.
    pub password: Option<Password>,
    /// Zip64 policy.
    pub zip64: Zip64Mode,
    /// Also store non-ASCII names in an Info-ZIP Unicode path extra field.
    pub unicode_extra: bool,
    /// Archive comment written into the end record.
    pub comment: String,
}

impl WriteOptions {
    /// Creates default options: Deflate at normal level, no encryption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level.
    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets a numeric compression level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] for levels above 9.
    pub fn level_value(mut self, level: u32) -> Result<Self> {
        let level = CompressionLevel::Level(level);
        level.level()?;
        self.level = level;
        Ok(self)
    }

    /// Sets the encryption method.
    pub fn encryption(mut self, encryption: EncryptionMethod) -> Self {
        self.encryption = encryption;
        self
    }

    /// Selects WinZip AES with the given key strength.
    pub fn aes(self, strength: AesKeyStrength) -> Self {
        self.encryption(EncryptionMethod::Aes(strength))
    }

    /// Sets the AES vendor version (AE-2 by default).
    pub fn aes_version(mut self, version: AesVendorVersion) -> Self {
        self.aes_version = version;
        self
    }

    /// Sets the password for encrypted entries.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the Zip64 policy.
    pub fn zip64(mut self, mode: Zip64Mode) -> Self {
        self.zip64 = mode;
        self
    }

    /// Enables or disables the Unicode path extra field.
    pub fn unicode_extra(mut self, enabled: bool) -> Self {
        self.unicode_extra = enabled;
        self
    }

    /// Sets the archive comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Returns true if file entries will be encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_encrypted()
    }

    /// Checks that entries can be written with these options before any
    /// bytes of `entry_name` reach the archive.
    pub(crate) fn validate(&self, entry_name: &str) -> Result<()> {
        if !self.method.is_supported() {
            return Err(Error::unsupported_method(entry_name, self.method.name()));
        }
        if self.method == CompressionMethod::Deflated {
            self.level.level()?;
        }
        match self.encryption {
            EncryptionMethod::None => Ok(()),
            EncryptionMethod::Unsupported => {
                Err(Error::unsupported_method(entry_name, self.encryption.name()))
            }
            EncryptionMethod::Aes(_) if !cfg!(feature = "aes") => {
                Err(Error::unsupported_method(entry_name, self.encryption.name()))
            }
            _ if self.password.is_none() => Err(Error::PasswordRequired {
                entry_name: entry_name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Metadata for an entry being written.
#[derive(Debug, Clone, Default)]
pub struct EntryMeta {
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Modification time; the current time if unset.
    pub modified: Option<DosDateTime>,
    /// Unix mode bits, including the file type, stored in the upper half of
    /// the external attributes.
    pub unix_mode: Option<u32>,
    /// Expected uncompressed size, used to decide on Zip64 up front.
    pub size_hint: Option<u64>,
}

/// `S_IFREG`.
const UNIX_REGULAR_FILE: u32 = 0o100_000;
/// `S_IFDIR`.
const UNIX_DIRECTORY: u32 = 0o040_000;
/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;
/// MS-DOS read-only attribute.
const DOS_READ_ONLY: u32 = 0x01;

impl EntryMeta {
    /// Creates metadata for a file of `size` bytes.
    pub fn file(size: u64) -> Self {
        Self {
            size_hint: Some(size),
            ..Default::default()
        }
    }

    /// Creates metadata for a directory.
    pub fn directory() -> Self {
        Self {
            is_directory: true,
            size_hint: Some(0),
            ..Default::default()
        }
    }

    /// Creates metadata from a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the path cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::from_metadata(&metadata))
    }

    /// Creates metadata from [`std::fs::Metadata`].
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let is_directory = metadata.is_dir();
        Self {
            is_directory,
            modified: metadata.modified().ok().map(DosDateTime::from_system_time),
            unix_mode: Some(unix_mode(metadata)),
            size_hint: Some(if is_directory { 0 } else { metadata.len() }),
        }
    }

    /// Sets the modification time.
    pub fn modified(mut self, time: DosDateTime) -> Self {
        self.modified = Some(time);
        self
    }

    /// Sets the Unix mode.
    pub fn unix_mode(mut self, mode: u32) -> Self {
        self.unix_mode = Some(mode);
        self
    }

    /// Sets the size hint.
    pub fn size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Returns the external attributes for the central directory.
    pub(crate) fn external_attributes(&self) -> u32 {
        let file_type = if self.is_directory {
            UNIX_DIRECTORY
        } else {
            UNIX_REGULAR_FILE
        };
        let mode = match self.unix_mode {
            Some(mode) if mode & 0o170_000 != 0 => mode,
            Some(mode) => mode | file_type,
            None if self.is_directory => file_type | 0o755,
            None => file_type | 0o644,
        };
        let mut attributes = (mode & 0xFFFF) << 16;
        if self.is_directory {
            attributes |= DOS_DIRECTORY;
        }
        if mode & 0o222 == 0 {
            attributes |= DOS_READ_ONLY;
        }
        attributes
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn unix_mode(metadata: &std::fs::Metadata) -> u32 {
    let file_type = if metadata.is_dir() {
        UNIX_DIRECTORY | 0o755
    } else {
        UNIX_REGULAR_FILE | 0o644
    };
    if metadata.permissions().readonly() {
        file_type & !0o222
    } else {
        file_type
    }
}

/// Result of writing an archive.
#[must_use = "write results should be checked to ensure archive was created successfully"]
#[derive(Debug, Clone, Default)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directories written.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total stored bytes, including encryption overhead.
    pub compressed_size: u64,
    /// Size of each volume for split archives; empty otherwise.
    pub volume_sizes: Vec<u64>,
    /// The model of the archive as written. Reading the archive back
    /// yields the same model.
    pub model: ArchiveModel,
}

impl WriteResult {
    /// Returns the number of files the archive occupies.
    pub fn volume_count(&self) -> usize {
        self.volume_sizes.len().max(1)
    }

    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }

    /// Returns the space savings percentage.
    pub fn space_savings(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            1.0 - self.compression_ratio()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_options_default() {
        let opts = WriteOptions::default();
        assert_eq!(opts.method, CompressionMethod::Deflated);
        assert_eq!(opts.level, CompressionLevel::Normal);
        assert_eq!(opts.encryption, EncryptionMethod::None);
        assert_eq!(opts.aes_version, AesVendorVersion::Ae2);
        assert_eq!(opts.zip64, Zip64Mode::Auto);
        assert!(!opts.is_encrypted());
    }

    #[test]
    fn test_write_options_builder() {
        let opts = WriteOptions::new()
            .method(CompressionMethod::Stored)
            .aes(AesKeyStrength::Aes128)
            .password("pw")
            .zip64(Zip64Mode::Always)
            .comment("hello");

        assert_eq!(opts.method, CompressionMethod::Stored);
        assert_eq!(opts.encryption, EncryptionMethod::AES_128);
        assert_eq!(opts.zip64, Zip64Mode::Always);
        assert_eq!(opts.comment, "hello");
        assert!(opts.validate("a").is_ok());
    }

    #[test]
    fn test_level_value() {
        for level in 0..=9 {
            let opts = WriteOptions::new().level_value(level).unwrap();
            assert_eq!(opts.level, CompressionLevel::Level(level));
        }
        for level in [10, 100, u32::MAX] {
            assert!(matches!(
                WriteOptions::new().level_value(level),
                Err(Error::InvalidCompressionLevel(l)) if l == level
            ));
        }
    }

    #[test]
    fn test_validate_requires_password() {
        let opts = WriteOptions::new().encryption(EncryptionMethod::ZipCrypto);
        assert!(matches!(
            opts.validate("secret.txt"),
            Err(Error::PasswordRequired { entry_name }) if entry_name == "secret.txt"
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_methods() {
        let opts = WriteOptions::new().method(CompressionMethod::Unsupported(14));
        assert!(matches!(
            opts.validate("a"),
            Err(Error::UnsupportedMethod { .. })
        ));
        let opts = WriteOptions::new()
            .encryption(EncryptionMethod::Unsupported)
            .password("pw");
        assert!(matches!(
            opts.validate("a"),
            Err(Error::UnsupportedMethod { .. })
        ));
    }

    #[test]
    fn test_entry_meta_file() {
        let meta = EntryMeta::file(1000);
        assert!(!meta.is_directory);
        assert_eq!(meta.size_hint, Some(1000));
        assert_eq!(meta.external_attributes() >> 16, 0o100_644);
    }

    #[test]
    fn test_entry_meta_directory() {
        let meta = EntryMeta::directory();
        assert!(meta.is_directory);
        let attrs = meta.external_attributes();
        assert_eq!(attrs & DOS_DIRECTORY, DOS_DIRECTORY);
        assert_eq!(attrs >> 16, 0o040_755);
    }

    #[test]
    fn test_entry_meta_read_only() {
        let meta = EntryMeta::file(1).unix_mode(0o444);
        let attrs = meta.external_attributes();
        assert_eq!(attrs & DOS_READ_ONLY, DOS_READ_ONLY);
        assert_eq!(attrs >> 16, 0o100_444);
    }

    #[test]
    fn test_write_result() {
        let result = WriteResult {
            entries_written: 10,
            directories_written: 2,
            total_size: 1000,
            compressed_size: 500,
            ..Default::default()
        };
        assert!((result.compression_ratio() - 0.5).abs() < 0.001);
        assert!((result.space_savings() - 0.5).abs() < 0.001);
        assert_eq!(result.volume_count(), 1);
    }

    #[test]
    fn test_write_result_empty() {
        let result = WriteResult::default();
        assert!((result.compression_ratio() - 1.0).abs() < 0.001);
        assert!((result.space_savings() - 0.0).abs() < 0.001);
    }
}
