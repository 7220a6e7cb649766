//! Archive reading API.
//!
//! This module provides the public API for reading ZIP archives, including
//! listing entries, extracting files, and verifying integrity.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipkit::read::{Archive, ExtractOptions};
//!
//! # fn main() -> zipkit::Result<()> {
//! let mut archive = Archive::open_path("archive.zip")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//! }
//!
//! let result = archive.extract_all("output_dir", &ExtractOptions::default())?;
//! println!("{} entries extracted", result.entries_extracted);
//! # Ok(())
//! # }
//! ```

mod archive_open;
mod archive_query;
mod decompression;
mod extraction;
mod info;
mod options;

pub(crate) use archive_open::read_model;
pub use info::{ExtractResult, TestResult};
pub use options::{ExtractOptions, FailurePolicy, OverwritePolicy, PathSafety};

use crate::Password;
use crate::model::{ArchiveModel, EntryRecord};

/// A ZIP archive opened for reading.
///
/// The archive owns its reader. Entries can be listed without touching
/// entry data; extraction seeks to each entry's local header on demand.
pub struct Archive<R> {
    pub(crate) reader: R,
    pub(crate) model: ArchiveModel,
    pub(crate) password: Option<Password>,
    /// Bytes of foreign data in front of the archive.
    pub(crate) base_offset: u64,
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.model.len())
            .field("zip64", &self.model.zip64)
            .field("split", &self.model.split.is_some())
            .finish_non_exhaustive()
    }
}

/// Identifies one entry to extract.
///
/// Built from a name (the first entry with that exact name is used) or from
/// an [`EntryRecord`] obtained from the same archive, which is resolved by
/// index without a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySelector {
    /// Select the first entry with this exact name.
    Name(String),
    /// Select the entry at `index`, falling back to a name search if the
    /// record came from another archive.
    Record {
        /// Position in central directory order.
        index: usize,
        /// Name of the entry.
        name: String,
    },
}

impl EntrySelector {
    /// Returns the entry name this selector refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Record { name, .. } => name,
        }
    }
}

impl From<&str> for EntrySelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for EntrySelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for EntrySelector {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<&EntryRecord> for EntrySelector {
    fn from(entry: &EntryRecord) -> Self {
        Self::Record {
            index: entry.index,
            name: entry.name.clone(),
        }
    }
}
