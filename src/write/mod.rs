//! Archive writing API.
//!
//! This module provides the public API for creating ZIP archives: adding
//! files, directories, streams and byte slices with Store or Deflate, and
//! optionally ZipCrypto or WinZip AES encryption.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipkit::{ArchivePath, WriteOptions, Writer};
//!
//! # fn main() -> zipkit::Result<()> {
//! let mut writer = Writer::create_path("archive.zip")?.options(WriteOptions::new());
//!
//! writer.add_path("file.txt", ArchivePath::new("file.txt")?)?;
//! writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//!
//! let result = writer.finish()?;
//! println!("Wrote {} entries", result.entries_written);
//! # Ok(())
//! # }
//! ```

mod append;
mod entry_compression;
mod entry_input;
mod header_encode;
pub(crate) mod options;
mod writer_init;

pub use entry_input::EntrySource;
pub use options::{EntryMeta, WriteOptions, WriteResult, Zip64Mode};

use crate::format::header::CentralDirectoryHeader;
use crate::model::EntryRecord;
use crate::progress::ProgressReporter;
use crate::volume::ArchiveSink;

/// Running totals for [`WriteResult`].
#[derive(Debug, Default, Clone, Copy)]
struct WriteStats {
    entries_written: usize,
    directories_written: usize,
    total_size: u64,
    compressed_size: u64,
}

/// A ZIP archive writer.
///
/// Entries are streamed to the sink as they are added; the central
/// directory is written by [`finish`](Writer::finish), which consumes the
/// writer. Dropping a writer without finishing leaves an archive without a
/// central directory.
pub struct Writer<S: ArchiveSink> {
    sink: S,
    options: WriteOptions,
    /// Central headers in the order entries were written.
    headers: Vec<CentralDirectoryHeader>,
    /// Records derived from `headers`.
    entries: Vec<EntryRecord>,
    progress: Option<Box<dyn ProgressReporter>>,
    stats: WriteStats,
    /// Comment of the archive being appended to, kept unless the options
    /// set a new one.
    inherited_comment: String,
}

impl<S: ArchiveSink> Writer<S> {
    /// Wraps a sink positioned at the start of the archive.
    pub fn from_sink(sink: S) -> Self {
        Self {
            sink,
            options: WriteOptions::default(),
            headers: Vec::new(),
            entries: Vec::new(),
            progress: None,
            stats: WriteStats::default(),
            inherited_comment: String::new(),
        }
    }

    /// Sets the write options for entries added from now on.
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the write options for entries added from now on.
    pub fn set_options(&mut self, options: WriteOptions) {
        self.options = options;
    }

    /// Returns the current write options.
    pub fn write_options(&self) -> &WriteOptions {
        &self.options
    }

    /// Reports progress for each entry and allows cancelling a write in
    /// progress. A cancelled entry fails with [`Error::Cancelled`](crate::Error::Cancelled)
    /// and is left out of the archive.
    pub fn progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Some(Box::new(reporter));
        self
    }

    /// Returns the entries written so far.
    pub fn entries(&self) -> &[EntryRecord] {
        &self.entries
    }

    /// Returns the number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: ArchiveSink> std::fmt::Debug for Writer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("entries", &self.entries.len())
            .field("position", &self.sink.position())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
