//! Tests for malformed, corrupted and malicious archives.
//!
//! These tests verify that zipkit reports typed errors instead of panicking
//! and never writes outside the extraction directory. Cancellation through a
//! progress reporter is covered here as well.

// Written with the default Deflate method; some tests also encrypt with AES.
#![cfg(all(feature = "deflate", feature = "aes"))]

mod common;

use std::io::Cursor;
use std::sync::Arc;

use zipkit::{
    Archive, ArchivePath, AtomicProgress, CompressionMethod, EncryptionMethod, Error,
    ExtractOptions, FailurePolicy, PathSafety, WriteOptions, Writer, Zip64Mode, progress_fn,
};

fn open_err(bytes: Vec<u8>) -> Error {
    common::expect_err(Archive::open(Cursor::new(bytes)))
}

/// Offset of the first central directory header.
fn central_directory_offset(bytes: &[u8]) -> usize {
    bytes
        .windows(4)
        .position(|w| w == b"PK\x01\x02")
        .expect("central directory header")
}

#[test]
fn test_empty_input() {
    assert!(matches!(open_err(Vec::new()), Error::NotAZip(_)));
}

#[test]
fn test_random_bytes() {
    let err = open_err(common::noise(4096, 1));
    assert!(matches!(err, Error::NotAZip(_)));
    assert!(err.is_format_error());
}

#[test]
fn test_eocd_only_prefix() {
    let bytes = common::create_archive(&[("a.txt", b"a")]).unwrap();
    // Cut off inside the end record.
    let cut = bytes[..bytes.len() - 10].to_vec();
    assert!(matches!(open_err(cut), Error::NotAZip(_)));
}

#[test]
fn test_missing_leading_bytes() {
    let bytes = common::create_archive(&[("a.txt", b"some content")]).unwrap();
    let err = open_err(bytes[40..].to_vec());
    assert!(matches!(err, Error::Truncated(_)), "unexpected error: {}", err);
}

#[test]
fn test_entry_count_larger_than_directory() {
    let mut bytes = common::create_archive(&[("a.txt", b"a")]).unwrap();
    let eocd = bytes.len() - 22;
    bytes[eocd + 8..eocd + 10].copy_from_slice(&500u16.to_le_bytes());
    bytes[eocd + 10..eocd + 12].copy_from_slice(&500u16.to_le_bytes());
    assert!(matches!(open_err(bytes), Error::Truncated(_)));
}

#[test]
fn test_bad_central_header_signature() {
    let mut bytes = common::create_archive(&[("a.txt", b"a")]).unwrap();
    let cd = central_directory_offset(&bytes);
    bytes[cd + 3] = 0x09;
    assert!(matches!(open_err(bytes), Error::BadSignature { .. }));
}

#[test]
fn test_bad_local_header_signature() {
    let mut bytes = common::create_archive(&[("a.txt", b"a")]).unwrap();
    bytes[2] = 0x09;
    let mut archive = common::open(bytes, None);
    let err = archive.read_to_vec("a.txt").unwrap_err();
    assert!(matches!(err, Error::BadSignature { offset: 0, .. }));
}

#[test]
fn test_prepended_data_is_tolerated() {
    let archive_bytes = common::create_archive(&[("a.txt", b"behind a stub")]).unwrap();
    let mut bytes = b"#!/bin/sh\nexit 0\n".to_vec();
    bytes.extend_from_slice(&archive_bytes);

    let mut archive = common::open(bytes, None);
    assert_eq!(archive.read_to_vec("a.txt").unwrap(), b"behind a stub");
}

#[test]
fn test_corrupt_deflate_stream() {
    let data = b"deflate me ".repeat(100);
    let options = WriteOptions::new().method(CompressionMethod::Deflated);
    let mut bytes = common::create_archive_with_options(options, &[("a.txt", &data)]).unwrap();
    let name_len = u16::from_le_bytes([bytes[26], bytes[27]]) as usize;
    let extra_len = u16::from_le_bytes([bytes[28], bytes[29]]) as usize;
    // Final block with the reserved block type.
    bytes[30 + name_len + extra_len] = 0xFF;

    let mut archive = common::open(bytes, None);
    let err = archive.read_to_vec("a.txt").unwrap_err();
    assert!(matches!(err, Error::CorruptData { .. }), "unexpected error: {}", err);
    assert!(err.is_corruption());
}

#[test]
fn test_crc_mismatch() {
    let options = WriteOptions::new().method(CompressionMethod::Stored);
    let mut bytes = common::create_archive_with_options(options, &[("a.txt", b"abcdef")]).unwrap();
    // The stored payload follows the 30-byte header and the name.
    bytes[35] = b'X';

    let mut archive = common::open(bytes, None);
    let err = archive.read_to_vec("a.txt").unwrap_err();
    assert!(matches!(err, Error::CrcMismatch { ref entry_name, .. } if entry_name == "a.txt"));

    let test = archive.test().unwrap();
    assert_eq!(test.entries_failed, 1);
    assert!(test.is_err());
}

#[test]
fn test_unsupported_compression_method() {
    let mut bytes = common::create_archive(&[("a.txt", b"bzip2 pretender")]).unwrap();
    let cd = central_directory_offset(&bytes);
    // Method 12 (bzip2) in both headers.
    bytes[8..10].copy_from_slice(&12u16.to_le_bytes());
    bytes[cd + 10..cd + 12].copy_from_slice(&12u16.to_le_bytes());

    let mut archive = common::open(bytes, None);
    assert_eq!(
        archive.entry("a.txt").unwrap().compression,
        CompressionMethod::Unsupported(12)
    );
    let err = archive.read_to_vec("a.txt").unwrap_err();
    assert!(matches!(err, Error::UnsupportedMethod { .. }));
}

#[test]
fn test_zip64_locator_offset_past_u64_range() {
    let mut bytes = Vec::new();
    // Zip64 locator pointing just below u64::MAX.
    bytes.extend_from_slice(b"PK\x06\x07");
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(u64::MAX - 8).to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    // End record with every field at its sentinel.
    bytes.extend_from_slice(b"PK\x05\x06");
    bytes.extend_from_slice(&[0xFF; 16]);
    bytes.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(bytes.len(), 42);

    assert!(matches!(open_err(bytes), Error::Truncated(_)));
}

#[test]
fn test_zip64_locator_ignored_without_sentinels() {
    let archive_bytes = common::create_archive(&[("a.txt", b"plain end record")]).unwrap();
    let eocd = archive_bytes.len() - 22;

    let mut bytes = archive_bytes[..eocd].to_vec();
    bytes.extend_from_slice(b"PK\x06\x07");
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0xDEAD_u64.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&archive_bytes[eocd..]);

    let mut archive = common::open(bytes, None);
    assert!(!archive.model().zip64);
    assert_eq!(archive.read_to_vec("a.txt").unwrap(), b"plain end record");
}

#[test]
fn test_huge_declared_sizes_do_not_overflow() {
    let options = WriteOptions::new().zip64(Zip64Mode::Always);
    let mut bytes =
        common::create_archive_with_options(options, &[("a.txt", b"aaaa"), ("b.txt", b"bbbb")])
            .unwrap();

    // Both central Zip64 extra fields start with the uncompressed size.
    let mut patched = 0;
    let mut pos = central_directory_offset(&bytes);
    while pos + 46 <= bytes.len() && &bytes[pos..pos + 4] == b"PK\x01\x02" {
        let name_len = u16::from_le_bytes([bytes[pos + 28], bytes[pos + 29]]) as usize;
        let extra_len = u16::from_le_bytes([bytes[pos + 30], bytes[pos + 31]]) as usize;
        let extra = pos + 46 + name_len;
        assert_eq!(&bytes[extra..extra + 2], &[0x01, 0x00]);
        bytes[extra + 4..extra + 12].copy_from_slice(&(u64::MAX - 1).to_le_bytes());
        patched += 1;
        pos = extra + extra_len;
    }
    assert_eq!(patched, 2);

    let mut archive = common::open(bytes, None);
    assert_eq!(archive.model().total_uncompressed_size(), u64::MAX);

    let out = tempfile::tempdir().unwrap();
    let result = archive.extract_all(out.path(), &ExtractOptions::new()).unwrap();
    assert_eq!(result.entries_failed, 2);
    for (_, err) in &result.failures {
        assert!(matches!(err, Error::CorruptData { .. }), "unexpected error: {}", err);
    }
}

#[test]
fn test_oversized_aes_entry_reports_authentication() {
    let data = vec![b'z'; 4096];
    let options = WriteOptions::new()
        .method(CompressionMethod::Stored)
        .encryption(EncryptionMethod::AES_256)
        .password("pw");
    let mut bytes = common::create_archive_with_options(options, &[("z.bin", &data)]).unwrap();

    // Declare fewer bytes than the entry decodes to.
    let cd = central_directory_offset(&bytes);
    bytes[cd + 24..cd + 28].copy_from_slice(&100u32.to_le_bytes());

    let mut archive = common::open(bytes.clone(), Some("pw"));
    let err = archive.read_to_vec("z.bin").unwrap_err();
    assert!(matches!(err, Error::CorruptData { .. }), "unexpected error: {}", err);

    // With tampered ciphertext as well, authentication decides the error.
    let payload = 30 + 5 + u16::from_le_bytes([bytes[28], bytes[29]]) as usize;
    bytes[payload + 16 + 2 + 1000] ^= 0x01;
    let mut archive = common::open(bytes, Some("pw"));
    let err = archive.read_to_vec("z.bin").unwrap_err();
    assert!(
        matches!(err, Error::AuthenticationFailed { .. }),
        "unexpected error: {}",
        err
    );
}

fn traversal_archive() -> Vec<u8> {
    let mut bytes =
        common::create_archive(&[("aa/evil.txt", b"gotcha"), ("good.txt", b"fine")]).unwrap();
    assert_eq!(common::patch_bytes(&mut bytes, b"aa/evil.txt", b"../evil.txt"), 2);
    bytes
}

#[test]
fn test_path_traversal_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let dest = root.path().join("out");
    let mut archive = common::open(traversal_archive(), None);
    assert_eq!(archive.entries()[0].name, "../evil.txt");

    let result = archive.extract_all(&dest, &ExtractOptions::new()).unwrap();
    assert_eq!(result.entries_failed, 1);
    assert_eq!(result.entries_extracted, 1);
    let (name, err) = &result.failures[0];
    assert_eq!(name, "../evil.txt");
    assert!(matches!(err, Error::PathTraversal { entry_index: 0, .. }));
    assert!(err.is_security_error());

    assert!(!root.path().join("evil.txt").exists());
    assert_eq!(std::fs::read(dest.join("good.txt")).unwrap(), b"fine");
}

#[test]
fn test_path_traversal_aborts_batch() {
    let dest = tempfile::tempdir().unwrap();
    let mut archive = common::open(traversal_archive(), None);

    let options = ExtractOptions::new().failure_policy(FailurePolicy::Abort);
    let err = archive.extract_all(dest.path(), &options).unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }));
    assert!(!dest.path().join("good.txt").exists());
}

#[test]
fn test_traversal_entry_extracts_with_safe_name() {
    let dest = tempfile::tempdir().unwrap();
    let mut archive = common::open(traversal_archive(), None);

    // The base name is used, so the entry lands inside the destination.
    let path = archive
        .extract_entry("../evil.txt", dest.path(), None, &ExtractOptions::new())
        .unwrap();
    assert_eq!(path, dest.path().join("evil.txt"));

    let err = archive
        .extract_entry("good.txt", dest.path(), Some("../escape.txt"), &ExtractOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }));
}

#[test]
fn test_relaxed_policy_still_rejects_traversal() {
    let dest = tempfile::tempdir().unwrap();
    let mut archive = common::open(traversal_archive(), None);
    let options = ExtractOptions::new().path_safety(PathSafety::Relaxed);
    let result = archive.extract_all(dest.path(), &options).unwrap();
    assert_eq!(result.entries_failed, 1);
}

#[test]
fn test_absolute_entry_name_is_rejected() {
    let mut bytes = common::create_archive(&[("xetc/passwd", b"root")]).unwrap();
    assert_eq!(common::patch_bytes(&mut bytes, b"xetc/passwd", b"/etc/passwd"), 2);

    let dest = tempfile::tempdir().unwrap();
    let mut archive = common::open(bytes, None);
    let result = archive.extract_all(dest.path(), &ExtractOptions::new()).unwrap();
    assert!(matches!(result.failures[0].1, Error::PathTraversal { .. }));
}

#[test]
fn test_cancel_extraction() {
    let data = common::noise(256 * 1024, 3);
    let bytes = common::create_archive(&[("a.bin", &data), ("b.bin", &data)]).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let mut archive = common::open(bytes, None);

    let progress = AtomicProgress::shared();
    progress.cancel();
    let options = ExtractOptions::new().progress(progress.clone());
    let err = archive.extract_all(dest.path(), &options).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!dest.path().join("b.bin").exists());
}

#[test]
fn test_cancel_mid_entry() {
    let data = common::noise(256 * 1024, 4);
    let bytes = common::create_archive(&[("a.bin", &data)]).unwrap();
    let mut archive = common::open(bytes, None);

    // Stop after the first chunk.
    let reporter = progress_fn(|processed, _total| processed == 0);
    let mut out = Vec::new();
    let err = archive
        .extract_to_writer_with_progress("a.bin", &mut out, Some(&reporter))
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(out.len() < data.len());

    // The archive stays usable.
    assert_eq!(archive.read_to_vec("a.bin").unwrap(), data);
}

#[test]
fn test_cancel_test_run() {
    let bytes = common::create_archive(&[("a.txt", b"a")]).unwrap();
    let mut archive = common::open(bytes, None);
    let progress = AtomicProgress::new();
    progress.cancel();
    assert!(matches!(
        archive.test_with_progress(Some(&progress)),
        Err(Error::Cancelled)
    ));
}

#[test]
fn test_cancelled_write_leaves_entry_out() {
    let progress = Arc::new(AtomicProgress::new());
    let mut writer = Writer::new(Vec::new()).progress(progress.clone());
    writer
        .add_bytes(ArchivePath::new("kept.txt").unwrap(), b"kept")
        .unwrap();

    progress.cancel();
    let err = writer
        .add_bytes(ArchivePath::new("dropped.bin").unwrap(), &common::noise(100_000, 5))
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(writer.len(), 1);

    let (result, bytes) = writer.finish_into_inner().unwrap();
    assert_eq!(result.entries_written, 1);
    let mut archive = common::open(bytes, None);
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.read_to_vec("kept.txt").unwrap(), b"kept");
}
