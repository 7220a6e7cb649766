//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! Exercises end record discovery, Zip64 records, central directory parsing
//! and the per-entry read pipeline with malformed or adversarial input. Any
//! panic, hang or unbounded allocation is a bug; errors are expected.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let Ok(mut archive) = zipkit::Archive::open_with_password(Cursor::new(data), "fuzz") else {
        return;
    };

    let names: Vec<String> = archive.entries().iter().map(|e| e.name.clone()).collect();
    for name in names.iter().take(16) {
        let mut sink = std::io::sink();
        let _ = archive.extract_to_writer(name.as_str(), &mut sink);
    }
    let _ = archive.test();
});
