//! Append mode for adding entries to an existing archive in place.
//!
//! The archive is truncated at its central directory; new entries are
//! written from there, and [`Writer::finish`] writes a central directory
//! holding the existing entries followed by the new ones. Existing entry
//! data is never rewritten.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipkit::{ArchivePath, Writer};
//!
//! # fn main() -> zipkit::Result<()> {
//! let mut writer = Writer::append_path("archive.zip")?;
//! writer.add_bytes(ArchivePath::new("new_file.txt")?, b"Hello, World!")?;
//! let result = writer.finish()?;
//! println!("archive now has {} entries", result.model.len());
//! # Ok(())
//! # }
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Cursor, Seek, SeekFrom};
use std::path::Path;

use crate::format::header::CentralDirectoryHeader;
use crate::format::reader::read_vec;
use crate::read::read_model;
use crate::volume::StreamSink;
use crate::Result;

use super::Writer;

impl Writer<StreamSink<BufWriter<File>>> {
    /// Opens an existing single-file archive for appending.
    ///
    /// The archive comment is kept unless the options set a new one. If
    /// the writer is dropped without [`finish`](Writer::finish), the file is
    /// left without a central directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a readable
    /// ZIP archive. Split archives fail with
    /// [`Error::VolumeMissing`](crate::Error::VolumeMissing).
    pub fn append_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let (model, base_offset) = read_model(&mut file, None)?;

        let cd_start = base_offset + model.cd_offset;
        file.seek(SeekFrom::Start(cd_start))?;
        let cd = read_vec(&mut file, model.cd_size as usize, "central directory")?;
        let mut cursor = Cursor::new(&cd[..]);
        let mut headers = Vec::with_capacity(model.len());
        for _ in 0..model.len() {
            let offset = cd_start + cursor.position();
            headers.push(CentralDirectoryHeader::parse(&mut cursor, offset)?);
        }

        file.set_len(cd_start)?;
        file.seek(SeekFrom::Start(cd_start))?;
        log::debug!(
            "appending to {} after {} existing entries at offset {:#x}",
            path.display(),
            model.len(),
            model.cd_offset
        );

        // Offsets stay relative to the start of the archive data, so any
        // prepended stub keeps working.
        let sink = StreamSink::with_offset(BufWriter::new(file), model.cd_offset);
        let mut writer = Self::from_sink(sink);
        writer.headers = headers;
        writer.entries = model.entries;
        writer.inherited_comment = model.comment;
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use crate::read::Archive;
    use crate::write::{WriteOptions, Writer};
    use crate::ArchivePath;

    #[test]
    fn test_append_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");

        let mut writer = Writer::create_path(&path)
            .unwrap()
            .options(WriteOptions::new().comment("first"));
        writer
            .add_bytes(ArchivePath::new("one.txt").unwrap(), b"one")
            .unwrap();
        writer.finish().unwrap();

        let mut writer = Writer::append_path(&path).unwrap();
        assert_eq!(writer.len(), 1);
        writer
            .add_bytes(ArchivePath::new("two.txt").unwrap(), b"two")
            .unwrap();
        let result = writer.finish().unwrap();
        assert_eq!(result.entries_written, 1);

        let mut archive = Archive::open_path(&path).unwrap();
        assert_eq!(archive.model(), &result.model);
        assert_eq!(archive.comment(), "first");
        assert_eq!(archive.read_to_vec("one.txt").unwrap(), b"one");
        assert_eq!(archive.read_to_vec("two.txt").unwrap(), b"two");
    }
}
