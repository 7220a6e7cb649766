//! Operation result types.

use crate::Error;

/// Result of testing an archive for integrity.
#[must_use = "test results should be checked to verify archive integrity"]
#[derive(Debug, Default)]
pub struct TestResult {
    /// Number of entries tested.
    pub entries_tested: usize,
    /// Number of entries that passed.
    pub entries_passed: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Each failed entry with its error.
    pub failures: Vec<(String, Error)>,
}

impl TestResult {
    /// Returns true if all entries passed.
    pub fn is_ok(&self) -> bool {
        self.entries_failed == 0
    }

    /// Returns true if any entries failed.
    pub fn is_err(&self) -> bool {
        self.entries_failed > 0
    }
}

/// Result of extracting entries from an archive.
#[must_use = "extraction results should be checked for partial failures"]
#[derive(Debug, Default)]
pub struct ExtractResult {
    /// Number of entries extracted (files and directories).
    pub entries_extracted: usize,
    /// Number of entries skipped by the overwrite policy.
    pub entries_skipped: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Total bytes extracted.
    pub bytes_extracted: u64,
    /// Each failed entry with its error.
    pub failures: Vec<(String, Error)>,
}

impl ExtractResult {
    /// Returns true if all entries were extracted or skipped.
    pub fn is_ok(&self) -> bool {
        self.entries_failed == 0
    }

    /// Returns true if any entries failed.
    pub fn is_err(&self) -> bool {
        self.entries_failed > 0
    }

    pub(crate) fn record_failure(&mut self, entry_name: &str, err: Error) {
        self.entries_failed += 1;
        self.failures.push((entry_name.to_string(), err));
    }
}
