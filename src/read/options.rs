//! Extraction options.

use crate::Password;
use crate::progress::ProgressReporter;

pub use crate::safety::PathSafety;

/// Policy for handling existing files during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace existing files.
    #[default]
    Overwrite,
    /// Leave existing files alone and count the entry as skipped.
    Skip,
    /// Fail the entry with [`Error::EntryExists`](crate::Error::EntryExists).
    Error,
}

/// What a bulk extraction does when one entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure in the result and carry on with the next entry.
    #[default]
    Continue,
    /// Stop and return the first error.
    Abort,
}

/// Options for extraction operations.
///
/// # Example
///
/// ```rust
/// use zipkit::read::{ExtractOptions, FailurePolicy, OverwritePolicy};
///
/// let options = ExtractOptions::new()
///     .overwrite(OverwritePolicy::Skip)
///     .failure_policy(FailurePolicy::Abort)
///     .password("secret");
/// assert_eq!(options.overwrite, OverwritePolicy::Skip);
/// ```
#[derive(Default)]
pub struct ExtractOptions {
    /// Policy for handling existing files.
    pub overwrite: OverwritePolicy,
    /// Path safety validation policy.
    pub path_safety: PathSafety,
    /// Bulk extraction failure policy.
    pub failure_policy: FailurePolicy,
    /// Password for encrypted entries; overrides the archive's password.
    pub password: Option<Password>,
    /// Progress reporter, also consulted for cancellation.
    pub progress: Option<Box<dyn ProgressReporter>>,
    /// Apply the stored modification time to extracted files.
    pub preserve_mtime: bool,
}

impl std::fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("overwrite", &self.overwrite)
            .field("path_safety", &self.path_safety)
            .field("failure_policy", &self.failure_policy)
            .field("preserve_mtime", &self.preserve_mtime)
            .finish_non_exhaustive()
    }
}

impl ExtractOptions {
    /// Creates extraction options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Sets the path safety policy.
    pub fn path_safety(mut self, policy: PathSafety) -> Self {
        self.path_safety = policy;
        self
    }

    /// Sets the failure policy for bulk extraction.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the password for encrypted entries.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the progress reporter.
    pub fn progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Some(Box::new(reporter));
        self
    }

    /// Sets whether modification times are applied to extracted files.
    pub fn preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// Clones all settings except the progress reporter.
    pub fn clone_settings(&self) -> Self {
        Self {
            overwrite: self.overwrite,
            path_safety: self.path_safety,
            failure_policy: self.failure_policy,
            password: self.password.clone(),
            progress: None,
            preserve_mtime: self.preserve_mtime,
        }
    }

    pub(crate) fn reporter(&self) -> Option<&dyn ProgressReporter> {
        self.progress.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.overwrite, OverwritePolicy::Overwrite);
        assert_eq!(options.path_safety, PathSafety::Strict);
        assert_eq!(options.failure_policy, FailurePolicy::Continue);
        assert!(options.password.is_none());
        assert!(!options.preserve_mtime);
    }

    #[test]
    fn test_clone_settings_drops_progress() {
        let options = ExtractOptions::new()
            .password("pw")
            .progress(crate::progress::NoProgress)
            .preserve_mtime(true);
        let cloned = options.clone_settings();
        assert!(cloned.progress.is_none());
        assert!(cloned.preserve_mtime);
        assert_eq!(cloned.password.unwrap().as_str(), "pw");
    }
}
