//! Writer initialization and finalization.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::format::MAX_COMMENT_LENGTH;
use crate::model::{ArchiveModel, SplitInfo};
use crate::volume::{ArchiveSink, MultiVolumeWriter, StreamSink, VolumeConfig};
use crate::{Error, Result};

use super::Writer;
use super::header_encode::EndRecords;
use super::options::{WriteResult, Zip64Mode};

impl<W: Write> Writer<StreamSink<W>> {
    /// Creates a writer over any output stream.
    ///
    /// The stream does not need to be seekable.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zipkit::{ArchivePath, Writer};
    ///
    /// # fn main() -> zipkit::Result<()> {
    /// let mut writer = Writer::new(Vec::new());
    /// writer.add_bytes(ArchivePath::new("test.txt")?, b"Hello")?;
    /// let (result, bytes) = writer.finish_into_inner()?;
    /// assert_eq!(result.entries_written, 1);
    /// assert!(bytes.starts_with(b"PK\x03\x04"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(inner: W) -> Self {
        Self::from_sink(StreamSink::new(inner))
    }
}

impl Writer<StreamSink<BufWriter<File>>> {
    /// Creates a new archive file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl Writer<MultiVolumeWriter> {
    /// Creates a split archive writer.
    ///
    /// Volumes are written as `name.z01`, `name.z02`, ... and the last one
    /// becomes `name.zip` when the writer is finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the first volume file cannot be created.
    pub fn create_split(config: VolumeConfig) -> Result<Self> {
        Ok(Self::from_sink(MultiVolumeWriter::create(config)?))
    }
}

impl<S: ArchiveSink> Writer<S> {
    /// Writes the central directory and end records, closing the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn finish(self) -> Result<WriteResult> {
        let (result, _inner) = self.finish_into_inner()?;
        Ok(result)
    }

    /// Finishes the archive and returns the underlying output as well.
    ///
    /// Useful when writing to a `Vec<u8>` that is needed afterwards.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, S::Inner)> {
        let mut block = Vec::new();
        for header in &self.headers {
            header.encode_into(&mut block);
        }
        let cd_size = block.len() as u64;

        let comment = self.archive_comment();
        let (disk, offset) = self.sink.position();
        let end = EndRecords::new(
            self.headers.len() as u64,
            cd_size,
            disk,
            offset,
            self.options.zip64 == Zip64Mode::Always,
            comment.as_bytes().to_vec(),
        );

        let (cd_disk, cd_offset) = self
            .sink
            .reserve((block.len() + end.encoded_len()) as u64)
            .map_err(Error::from_io)?;
        end.encode_into(&mut block, cd_disk, cd_offset);
        self.sink.write_record(&block).map_err(Error::from_io)?;
        self.sink.flush()?;
        let volume_sizes = self.sink.finish_volumes().map_err(Error::from_io)?;

        log::debug!(
            "finished archive: {} entries, {} bytes of central directory, zip64: {}, volumes: {}",
            self.entries.len(),
            cd_size,
            end.zip64,
            volume_sizes.len().max(1)
        );

        let model = ArchiveModel {
            entries: std::mem::take(&mut self.entries),
            cd_offset,
            cd_size,
            cd_disk,
            zip64: end.zip64,
            split: (volume_sizes.len() > 1).then(|| SplitInfo {
                volume_sizes: volume_sizes.clone(),
            }),
            comment,
        };
        let result = WriteResult {
            entries_written: self.stats.entries_written,
            directories_written: self.stats.directories_written,
            total_size: self.stats.total_size,
            compressed_size: self.stats.compressed_size,
            volume_sizes,
            model,
        };
        Ok((result, self.sink.into_inner()))
    }

    /// The comment to store, clipped to what the end record can hold.
    fn archive_comment(&self) -> String {
        let comment = if self.options.comment.is_empty() {
            &self.inherited_comment
        } else {
            &self.options.comment
        };
        if comment.len() <= MAX_COMMENT_LENGTH {
            return comment.clone();
        }
        let mut end = MAX_COMMENT_LENGTH;
        while !comment.is_char_boundary(end) {
            end -= 1;
        }
        log::warn!(
            "archive comment of {} bytes truncated to {}",
            comment.len(),
            end
        );
        comment[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::Archive;
    use crate::write::{EntryMeta, WriteOptions};
    use crate::ArchivePath;
    use std::io::Cursor;

    #[test]
    fn test_forced_zip64_roundtrip() {
        let mut writer = Writer::new(Vec::new()).options(WriteOptions::new().zip64(Zip64Mode::Always));
        writer
            .add_bytes(ArchivePath::new("a.txt").unwrap(), b"zip64 content")
            .unwrap();
        writer
            .add_directory(ArchivePath::new("d").unwrap(), EntryMeta::directory())
            .unwrap();
        let (result, bytes) = writer.finish_into_inner().unwrap();
        assert!(result.model.zip64);

        let mut archive = Archive::open(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.model(), &result.model);
        assert_eq!(archive.read_to_vec("a.txt").unwrap(), b"zip64 content");
    }

    #[test]
    fn test_long_comment_is_truncated() {
        let comment = "é".repeat(MAX_COMMENT_LENGTH);
        let writer = Writer::new(Vec::new()).options(WriteOptions::new().comment(comment));
        let (result, _) = writer.finish_into_inner().unwrap();
        assert!(result.model.comment.len() <= MAX_COMMENT_LENGTH);
        assert!(result.model.comment.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_split_writer_reports_volumes() {
        let dir = tempfile::tempdir().unwrap();
        let config = VolumeConfig::new(dir.path().join("out.zip"), 64 * 1024).unwrap();
        let mut writer = Writer::create_split(config).unwrap();
        writer
            .add_bytes(ArchivePath::new("a.bin").unwrap(), &vec![7u8; 10])
            .unwrap();
        let result = writer.finish().unwrap();
        assert_eq!(result.volume_sizes.len(), 1);
        assert!(dir.path().join("out.zip").exists());
        assert!(!dir.path().join("out.z01").exists());
    }
}
