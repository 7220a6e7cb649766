//! Progress reporting and cooperative cancellation.
//!
//! Long operations consult a [`ProgressReporter`] between entries and between
//! fixed-size chunks within an entry. Returning `false` from
//! [`ProgressReporter::on_progress`], or `true` from
//! [`ProgressReporter::should_cancel`], stops the operation with
//! [`Error::Cancelled`](crate::Error::Cancelled).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zipkit::progress::AtomicProgress;
//! use zipkit::{Archive, ExtractOptions};
//!
//! let progress = AtomicProgress::shared();
//! let options = ExtractOptions::new().progress(progress.clone());
//!
//! // From another thread: progress.cancel();
//! archive.extract_all("./output", &options)?;
//! println!("{:.1}% done", progress.percentage());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Progress reporting trait for archive operations.
///
/// Methods take `&self` so that a single reporter can be shared with another
/// thread that requests cancellation; implementors use interior mutability.
pub trait ProgressReporter: Send + Sync {
    /// Called once before processing begins with the total uncompressed bytes.
    fn on_total(&self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called after each processed chunk.
    ///
    /// Returns `true` to continue or `false` to request cancellation.
    fn on_progress(&self, bytes_processed: u64, total_bytes: u64) -> bool {
        let _ = (bytes_processed, total_bytes);
        true
    }

    /// Called when starting to process an entry.
    fn on_entry_start(&self, entry_name: &str, size: u64) {
        let _ = (entry_name, size);
    }

    /// Called when entry processing completes.
    fn on_entry_complete(&self, entry_name: &str, success: bool) {
        let _ = (entry_name, success);
    }

    /// Checks if cancellation has been requested.
    ///
    /// Default implementation returns `false` (no cancellation).
    fn should_cancel(&self) -> bool {
        false
    }
}

/// A progress reporter that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Thread-safe progress counters with a cancellation flag.
#[derive(Debug, Default)]
pub struct AtomicProgress {
    total_bytes: AtomicU64,
    processed_bytes: AtomicU64,
    entries_completed: AtomicU64,
    entries_failed: AtomicU64,
    cancelled: AtomicBool,
}

impl AtomicProgress {
    /// Creates a new atomic progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a shared atomic progress reporter.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns total bytes to process.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Returns processed bytes.
    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes.load(Ordering::Relaxed)
    }

    /// Returns the number of entries that completed successfully.
    pub fn entries_completed(&self) -> u64 {
        self.entries_completed.load(Ordering::Relaxed)
    }

    /// Returns the number of entries that failed.
    pub fn entries_failed(&self) -> u64 {
        self.entries_failed.load(Ordering::Relaxed)
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns completion percentage (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            0.0
        } else {
            (self.processed_bytes() as f64 / total as f64) * 100.0
        }
    }
}

impl ProgressReporter for AtomicProgress {
    fn on_total(&self, total_bytes: u64) {
        self.total_bytes.store(total_bytes, Ordering::Relaxed);
    }

    fn on_progress(&self, bytes_processed: u64, _total_bytes: u64) -> bool {
        self.processed_bytes
            .store(bytes_processed, Ordering::Relaxed);
        !self.is_cancelled()
    }

    fn on_entry_complete(&self, _entry_name: &str, success: bool) {
        let counter = if success {
            &self.entries_completed
        } else {
            &self.entries_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Arc<P> {
    fn on_total(&self, total_bytes: u64) {
        (**self).on_total(total_bytes)
    }

    fn on_progress(&self, bytes_processed: u64, total_bytes: u64) -> bool {
        (**self).on_progress(bytes_processed, total_bytes)
    }

    fn on_entry_start(&self, entry_name: &str, size: u64) {
        (**self).on_entry_start(entry_name, size)
    }

    fn on_entry_complete(&self, entry_name: &str, success: bool) {
        (**self).on_entry_complete(entry_name, success)
    }

    fn should_cancel(&self) -> bool {
        (**self).should_cancel()
    }
}

/// A progress reporter that calls a closure.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F> ClosureProgress<F>
where
    F: Fn(u64, u64) -> bool + Send + Sync,
{
    /// Creates a progress reporter from a closure.
    ///
    /// The closure receives (bytes_processed, total_bytes) and returns
    /// `true` to continue or `false` to cancel.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgress<F>
where
    F: Fn(u64, u64) -> bool + Send + Sync,
{
    fn on_progress(&self, bytes_processed: u64, total_bytes: u64) -> bool {
        (self.callback)(bytes_processed, total_bytes)
    }
}

/// Creates a closure-based progress reporter.
pub fn progress_fn<F>(f: F) -> ClosureProgress<F>
where
    F: Fn(u64, u64) -> bool + Send + Sync,
{
    ClosureProgress::new(f)
}

/// Tracks bytes across one operation and forwards them to an optional reporter.
///
/// Used internally by the reader and writer so the chunk loops can stay
/// reporter-agnostic.
pub(crate) struct ProgressTracker<'a> {
    reporter: Option<&'a dyn ProgressReporter>,
    processed: u64,
    total: u64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(reporter: Option<&'a dyn ProgressReporter>, total: u64) -> Self {
        if let Some(reporter) = reporter {
            reporter.on_total(total);
        }
        Self {
            reporter,
            processed: 0,
            total,
        }
    }

    /// Returns `Err(Cancelled)` if the reporter asked to stop.
    pub(crate) fn check_cancelled(&self) -> crate::Result<()> {
        match self.reporter {
            Some(reporter) if reporter.should_cancel() => Err(crate::Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Records `n` more processed bytes.
    pub(crate) fn advance(&mut self, n: usize) -> crate::Result<()> {
        self.processed += n as u64;
        match self.reporter {
            Some(reporter)
                if !reporter.on_progress(self.processed, self.total)
                    || reporter.should_cancel() =>
            {
                Err(crate::Error::Cancelled)
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn entry_start(&self, name: &str, size: u64) {
        if let Some(reporter) = self.reporter {
            reporter.on_entry_start(name, size);
        }
    }

    pub(crate) fn entry_complete(&self, name: &str, success: bool) {
        if let Some(reporter) = self.reporter {
            reporter.on_entry_complete(name, success);
        }
    }
}
