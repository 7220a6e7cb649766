//! Fuzz target for entry name validation.
//!
//! Feeds arbitrary strings to ArchivePath::new and validate_extract_path.
//! Accepted names must never be absolute or contain `..` segments, and
//! extraction paths must stay inside the destination.
//!
//! Run with: cargo +nightly fuzz run archive_path

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use zipkit::{ArchivePath, PathSafety, validate_extract_path};

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(path) = ArchivePath::new(name) {
        let normalized = path.as_str();
        assert!(
            !normalized.split('/').any(|s| s == ".." || s == "." || s.is_empty()),
            "Invalid segment in normalized path: {:?}",
            normalized
        );
        assert!(
            !normalized.starts_with('/'),
            "Absolute path accepted: {:?}",
            normalized
        );
        assert!(
            !normalized.contains('\0'),
            "NUL byte in normalized path: {:?}",
            normalized
        );
    }

    let dest = Path::new("/fuzz/dest");
    if let Ok(path) = validate_extract_path(name, dest, PathSafety::Relaxed, 0) {
        assert!(path.starts_with(dest), "{:?} escaped to {:?}", name, path);
    }
});
