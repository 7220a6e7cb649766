//! Shared test utilities for integration tests.
//!
//! Each integration test file compiles as a separate crate and may only use a
//! subset of these helpers, hence `#![allow(dead_code)]`.

#![allow(dead_code)]

use std::io::Cursor;
use zipkit::{Archive, ArchivePath, Error, WriteOptions, WriteResult, Writer};

/// Creates an in-memory archive, returning its bytes and the write result.
///
/// `options` of `None` uses the defaults (Deflate, no encryption).
///
/// ```ignore
/// let (bytes, result) = create_archive_with_result(None, &[("a.txt", b"a" as &[u8])]).unwrap();
/// ```
pub fn create_archive_with_result(
    options: Option<WriteOptions>,
    entries: &[(&str, &[u8])],
) -> zipkit::Result<(Vec<u8>, WriteResult)> {
    let writer = Writer::new(Vec::new());
    let mut writer = match options {
        Some(opts) => writer.options(opts),
        None => writer,
    };

    for (name, data) in entries {
        writer.add_bytes(ArchivePath::new(name)?, data)?;
    }

    let (result, bytes) = writer.finish_into_inner()?;
    Ok((bytes, result))
}

/// Creates an in-memory archive with default options.
pub fn create_archive(entries: &[(&str, &[u8])]) -> zipkit::Result<Vec<u8>> {
    create_archive_with_result(None, entries).map(|(bytes, _)| bytes)
}

/// Creates an in-memory archive with custom options.
pub fn create_archive_with_options(
    options: WriteOptions,
    entries: &[(&str, &[u8])],
) -> zipkit::Result<Vec<u8>> {
    create_archive_with_result(Some(options), entries).map(|(bytes, _)| bytes)
}

/// Opens archive bytes, optionally with a password.
pub fn open(bytes: Vec<u8>, password: Option<&str>) -> Archive<Cursor<Vec<u8>>> {
    let cursor = Cursor::new(bytes);
    match password {
        Some(password) => Archive::open_with_password(cursor, password),
        None => Archive::open(cursor),
    }
    .expect("Failed to open archive")
}

/// Verifies that an archive passes integrity testing and holds exactly the
/// expected entries with the expected content.
pub fn verify_archive_contents(archive_bytes: &[u8], expected: &[(&str, &[u8])]) {
    verify_with_password(archive_bytes, None, expected);
}

/// Like [`verify_archive_contents`] for an archive encrypted with `password`.
pub fn verify_encrypted_archive(archive_bytes: &[u8], password: &str, expected: &[(&str, &[u8])]) {
    verify_with_password(archive_bytes, Some(password), expected);
}

fn verify_with_password(archive_bytes: &[u8], password: Option<&str>, expected: &[(&str, &[u8])]) {
    let mut archive = open(archive_bytes.to_vec(), password);

    let test_result = archive.test().expect("Failed to test archive");
    assert!(
        test_result.is_ok(),
        "Archive integrity test failed: {:?}",
        test_result.failures
    );
    assert_eq!(archive.len(), expected.len(), "Entry count mismatch");

    for (name, content) in expected {
        let data = archive
            .read_to_vec(*name)
            .unwrap_or_else(|e| panic!("Failed to read '{}': {}", name, e));
        assert_eq!(&data[..], *content, "Content mismatch for '{}'", name);
    }
}

/// Unwraps the error of a result whose `Ok` type is not `Debug`.
pub fn expect_err<T>(result: zipkit::Result<T>) -> Error {
    match result {
        Ok(_) => panic!("Expected an error"),
        Err(e) => e,
    }
}

/// Replaces every occurrence of `from` with `to` (same length) in `bytes`.
///
/// Used to forge entry names that the writer refuses to produce, such as
/// `../evil.txt`. Names appear in both the local and central headers.
pub fn patch_bytes(bytes: &mut [u8], from: &[u8], to: &[u8]) -> usize {
    assert_eq!(from.len(), to.len());
    let mut count = 0;
    let mut i = 0;
    while i + from.len() <= bytes.len() {
        if &bytes[i..i + from.len()] == from {
            bytes[i..i + from.len()].copy_from_slice(to);
            count += 1;
            i += from.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Deterministic pseudo-random bytes that do not compress.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}
