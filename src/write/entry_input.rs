//! Entry input methods.
//!
//! This module provides methods for adding entries to an archive from
//! various sources: files, streams, and byte slices.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::volume::ArchiveSink;
use crate::{ArchivePath, Result};

use super::Writer;
use super::options::EntryMeta;

/// A file or directory on disk to add with [`Writer::add_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySource {
    /// Path on disk.
    pub path: PathBuf,
    /// Name inside the archive; derived from `path` and the root if unset.
    pub archive_path: Option<ArchivePath>,
}

impl EntrySource {
    /// Creates a source for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_path: None,
        }
    }

    /// Stores the entry under `archive_path` instead of its root-relative path.
    pub fn archive_path(mut self, archive_path: ArchivePath) -> Self {
        self.archive_path = Some(archive_path);
        self
    }

    fn resolve_name(&self, root: &Path) -> Result<ArchivePath> {
        match &self.archive_path {
            Some(name) => Ok(name.clone()),
            None => ArchivePath::from_relative_path(&self.path, root),
        }
    }
}

impl From<PathBuf> for EntrySource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for EntrySource {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for EntrySource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl<S: ArchiveSink> Writer<S> {
    /// Adds files and directories from disk, naming each by its path
    /// relative to `root`.
    ///
    /// Directories are added as directory entries only; their contents are
    /// not walked. Returns the number of entries added. Stops at the first
    /// failure, keeping the entries added before it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`](crate::Error::InvalidArchivePath)
    /// if a source lies outside `root`, or any error from reading a source.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use zipkit::{EntrySource, Writer};
    ///
    /// # fn main() -> zipkit::Result<()> {
    /// let mut writer = Writer::create_path("site.zip")?;
    /// let sources = [EntrySource::new("public/index.html"), EntrySource::new("public/css")];
    /// writer.add_entries(&sources, "public")?;
    /// writer.finish()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_entries(&mut self, sources: &[EntrySource], root: impl AsRef<Path>) -> Result<usize> {
        let root = root.as_ref();
        for source in sources {
            let name = source.resolve_name(root)?;
            self.add_path(&source.path, name)?;
        }
        Ok(sources.len())
    }

    /// Adds a file or directory from a filesystem path.
    ///
    /// The modification time and permissions are taken from the file's
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn add_path(&mut self, disk_path: impl AsRef<Path>, archive_path: ArchivePath) -> Result<()> {
        let disk_path = disk_path.as_ref();
        let meta = EntryMeta::from_path(disk_path)?;

        if meta.is_directory {
            self.add_directory(archive_path, meta)
        } else {
            let mut reader = BufReader::new(File::open(disk_path)?);
            self.add_stream(archive_path, &mut reader, meta)
        }
    }

    /// Adds a directory entry. The stored name ends with `/`.
    pub fn add_directory(&mut self, archive_path: ArchivePath, meta: EntryMeta) -> Result<()> {
        let meta = EntryMeta {
            is_directory: true,
            size_hint: Some(0),
            ..meta
        };
        self.write_entry(archive_path.to_directory_name(), None, &meta)
    }

    /// Adds data from a stream.
    ///
    /// Set [`EntryMeta::size_hint`] for streams that may exceed 4 GiB.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing the archive fails.
    pub fn add_stream(
        &mut self,
        archive_path: ArchivePath,
        source: &mut dyn Read,
        meta: EntryMeta,
    ) -> Result<()> {
        let meta = EntryMeta {
            is_directory: false,
            ..meta
        };
        self.write_entry(archive_path.as_str().to_string(), Some(source), &meta)
    }

    /// Adds data from a byte slice.
    pub fn add_bytes(&mut self, archive_path: ArchivePath, data: &[u8]) -> Result<()> {
        let meta = EntryMeta::file(data.len() as u64);
        let mut cursor = data;
        self.add_stream(archive_path, &mut cursor, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_source_name_from_root() {
        let source = EntrySource::new("/data/site/css/main.css");
        let name = source.resolve_name(Path::new("/data/site")).unwrap();
        assert_eq!(name.as_str(), "css/main.css");
    }

    #[test]
    fn test_source_outside_root() {
        let source = EntrySource::new("/etc/passwd");
        assert!(matches!(
            source.resolve_name(Path::new("/data")),
            Err(Error::InvalidArchivePath { .. })
        ));
    }

    #[test]
    fn test_explicit_archive_path() {
        let source = EntrySource::new("/anywhere/file")
            .archive_path(ArchivePath::new("renamed.txt").unwrap());
        let name = source.resolve_name(Path::new("/root")).unwrap();
        assert_eq!(name.as_str(), "renamed.txt");
    }

    #[test]
    fn test_add_entries_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();

        let sources = [
            EntrySource::new(dir.path().join("sub")),
            EntrySource::new(dir.path().join("sub/a.txt")),
            EntrySource::new(dir.path().join("b.txt")),
        ];
        let mut writer = Writer::new(Vec::new());
        assert_eq!(writer.add_entries(&sources, dir.path()).unwrap(), 3);

        let names: Vec<_> = writer.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["sub/", "sub/a.txt", "b.txt"]);
        assert_eq!(writer.entries()[2].uncompressed_size, 2);
    }
}
