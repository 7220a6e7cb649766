//! Entry extraction to the filesystem, to writers and to memory.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::model::EntryRecord;
use crate::progress::{ProgressReporter, ProgressTracker};
use crate::safety::validate_extract_path;
use crate::{Error, Result};

use super::decompression::{EntryStream, payload_offset, stream_entry};
use super::{Archive, EntrySelector, ExtractOptions, ExtractResult, FailurePolicy, OverwritePolicy};

/// What happened to one entry.
enum Outcome {
    Extracted(u64),
    Skipped,
}

impl<R: Read + Seek> Archive<R> {
    /// Extracts every entry below `dest`, preserving relative paths.
    ///
    /// Entries are processed in central directory order. Parent directories
    /// are created as needed, and names that would escape `dest` fail with
    /// [`Error::PathTraversal`].
    ///
    /// With [`FailurePolicy::Continue`] (the default) a failed entry is
    /// recorded in the returned [`ExtractResult`] and the batch carries on;
    /// [`FailurePolicy::Abort`] returns the first error instead.
    /// Cancellation always stops the batch with [`Error::Cancelled`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use zipkit::{Archive, ExtractOptions};
    ///
    /// # fn main() -> zipkit::Result<()> {
    /// let mut archive = Archive::open_path("archive.zip")?;
    /// let result = archive.extract_all("./output", &ExtractOptions::new().password("secret"))?;
    /// for (name, err) in &result.failures {
    ///     eprintln!("{}: {}", name, err);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract_all(
        &mut self,
        dest: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        let dest = dest.as_ref();
        std::fs::create_dir_all(dest)?;

        let mut result = ExtractResult::default();
        let mut tracker =
            ProgressTracker::new(options.reporter(), self.model.total_uncompressed_size());

        for index in 0..self.model.len() {
            tracker.check_cancelled()?;

            let entry = &self.model.entries[index];
            tracker.entry_start(&entry.name, entry.uncompressed_size);
            let outcome = validate_extract_path(&entry.name, dest, options.path_safety, index)
                .and_then(|path| self.extract_index_to(index, &path, options, &mut tracker));
            let entry_name = &self.model.entries[index].name;

            match outcome {
                Ok(Outcome::Extracted(bytes)) => {
                    result.entries_extracted += 1;
                    result.bytes_extracted += bytes;
                    tracker.entry_complete(entry_name, true);
                }
                Ok(Outcome::Skipped) => {
                    result.entries_skipped += 1;
                    tracker.entry_complete(entry_name, true);
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    tracker.entry_complete(entry_name, false);
                    if options.failure_policy == FailurePolicy::Abort {
                        return Err(e);
                    }
                    log::debug!("failed to extract '{}': {}", entry_name, e);
                    result.record_failure(entry_name, e);
                }
            }
        }

        log::debug!(
            "extracted {} entries ({} bytes), {} skipped, {} failed",
            result.entries_extracted,
            result.bytes_extracted,
            result.entries_skipped,
            result.entries_failed
        );
        Ok(result)
    }

    /// Extracts a single entry into `dest`.
    ///
    /// The output is named `new_name` if given, otherwise the entry's base
    /// name; intermediate directories of the entry name are not recreated.
    /// Returns the path that was written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if the selector matches nothing.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use zipkit::{Archive, ExtractOptions};
    ///
    /// # fn main() -> zipkit::Result<()> {
    /// let mut archive = Archive::open_path("archive.zip")?;
    /// let path = archive.extract_entry("docs/readme.txt", "./out", Some("README"), &ExtractOptions::new())?;
    /// assert!(path.ends_with("README"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract_entry(
        &mut self,
        selector: impl Into<EntrySelector>,
        dest: impl AsRef<Path>,
        new_name: Option<&str>,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let dest = dest.as_ref();
        let index = self.resolve(&selector.into())?;
        std::fs::create_dir_all(dest)?;

        let entry = &self.model.entries[index];
        let output_name = new_name.unwrap_or_else(|| entry.file_name());
        let path = validate_extract_path(output_name, dest, options.path_safety, index)?;

        let mut tracker = ProgressTracker::new(options.reporter(), entry.uncompressed_size);
        tracker.check_cancelled()?;
        tracker.entry_start(&entry.name, entry.uncompressed_size);

        let outcome = self.extract_index_to(index, &path, options, &mut tracker);
        tracker.entry_complete(&self.model.entries[index].name, outcome.is_ok());
        outcome.map(|_| path)
    }

    /// Decodes one entry into a writer. Returns the number of bytes written.
    pub fn extract_to_writer<W: Write + ?Sized>(
        &mut self,
        selector: impl Into<EntrySelector>,
        out: &mut W,
    ) -> Result<u64> {
        self.extract_to_writer_with_progress(selector, out, None)
    }

    /// Like [`extract_to_writer`](Self::extract_to_writer), reporting progress
    /// and honoring cancellation.
    pub fn extract_to_writer_with_progress<W: Write + ?Sized>(
        &mut self,
        selector: impl Into<EntrySelector>,
        out: &mut W,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<u64> {
        let index = self.resolve(&selector.into())?;
        let entry = &self.model.entries[index];
        if entry.is_directory {
            return Ok(0);
        }
        let mut tracker = ProgressTracker::new(progress, entry.uncompressed_size);
        stream_entry(
            &mut self.reader,
            &self.model,
            self.base_offset,
            entry,
            self.password.as_ref(),
            out,
            &mut tracker,
        )
    }

    /// Decodes one entry into memory.
    pub fn read_to_vec(&mut self, selector: impl Into<EntrySelector>) -> Result<Vec<u8>> {
        let selector = selector.into();
        let index = self.resolve(&selector)?;
        let capacity = self.model.entries[index].uncompressed_size.min(1 << 24) as usize;
        let mut out = Vec::with_capacity(capacity);
        self.extract_to_writer(selector, &mut out)?;
        Ok(out)
    }

    /// Extracts the entry at `index` to `path`.
    fn extract_index_to(
        &mut self,
        index: usize,
        path: &Path,
        options: &ExtractOptions,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<Outcome> {
        let entry = &self.model.entries[index];

        if entry.is_directory {
            std::fs::create_dir_all(path)?;
            return Ok(Outcome::Extracted(0));
        }

        if path.exists() {
            match options.overwrite {
                OverwritePolicy::Overwrite => {}
                OverwritePolicy::Skip => return Ok(Outcome::Skipped),
                OverwritePolicy::Error => {
                    return Err(Error::EntryExists {
                        path: path.display().to_string(),
                    });
                }
            }
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let password = options.password.as_ref().or(self.password.as_ref());
        let data_offset = payload_offset(&mut self.reader, &self.model, self.base_offset, entry)?;
        let stream = EntryStream::open(&mut self.reader, data_offset, entry, password)?;

        let mut file = BufWriter::new(File::create(path)?);
        let copied = stream
            .copy_to(&mut file, tracker)
            .and_then(|n| file.flush().map(|_| n).map_err(Error::from));
        drop(file);

        match copied {
            Ok(bytes) => {
                if options.preserve_mtime {
                    apply_mtime(path, entry);
                }
                Ok(Outcome::Extracted(bytes))
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                discard_output(path);
                Err(e)
            }
        }
    }
}

fn apply_mtime(path: &Path, entry: &EntryRecord) {
    let mtime = filetime::FileTime::from_system_time(entry.modified_time());
    if let Err(e) = filetime::set_file_mtime(path, mtime) {
        log::warn!("failed to set modification time of '{}': {}", path.display(), e);
    }
}

/// Removes output that failed verification.
fn discard_output(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("failed to remove corrupt output '{}': {}", path.display(), e);
    }
}
