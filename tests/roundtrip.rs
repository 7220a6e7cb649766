//! Round-trip integration tests for zipkit.
//!
//! Every supported compression and encryption combination is written and read
//! back, along with:
//! - Empty archives and empty entries
//! - Directory entries and deep paths
//! - Extraction to disk, including renamed single-entry extraction
//! - Archives built from files on disk

// Written with the default Deflate method; some tests also encrypt with AES.
#![cfg(all(feature = "deflate", feature = "aes"))]

mod common;

use std::io::Cursor;
use zipkit::{
    AesKeyStrength, AesVendorVersion, Archive, ArchivePath, CompressionLevel, CompressionMethod,
    DosDateTime, EncryptionMethod, EntryMeta, EntrySource, ExtractOptions, WriteOptions, Writer,
};

const PASSWORD: &str = "correct horse battery staple";

fn sample_entries() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("empty.txt", Vec::new()),
        ("hello.txt", b"Hello, World!".to_vec()),
        ("docs/lorem.txt", b"Lorem ipsum dolor sit amet. ".repeat(400)),
        ("bin/noise.bin", common::noise(50_000, 7)),
    ]
}

fn roundtrip(method: CompressionMethod, encryption: EncryptionMethod) {
    let entries = sample_entries();
    let borrowed: Vec<(&str, &[u8])> = entries.iter().map(|(n, d)| (*n, &d[..])).collect();

    let mut options = WriteOptions::new().method(method).encryption(encryption);
    if encryption.is_encrypted() {
        options = options.password(PASSWORD);
    }
    let (bytes, result) = common::create_archive_with_result(Some(options), &borrowed)
        .unwrap_or_else(|e| panic!("{:?}/{:?} write failed: {}", method, encryption, e));

    assert_eq!(result.entries_written, entries.len());
    for entry in &result.model.entries {
        assert_eq!(entry.encryption, encryption, "{}", entry.name);
        assert_eq!(entry.compression, method, "{}", entry.name);
    }

    if encryption.is_encrypted() {
        common::verify_encrypted_archive(&bytes, PASSWORD, &borrowed);
    } else {
        common::verify_archive_contents(&bytes, &borrowed);
    }

    let archive = common::open(bytes, None);
    assert_eq!(archive.model(), &result.model);
}

#[test]
fn test_stored_plain() {
    roundtrip(CompressionMethod::Stored, EncryptionMethod::None);
}

#[test]
fn test_deflated_plain() {
    roundtrip(CompressionMethod::Deflated, EncryptionMethod::None);
}

#[test]
fn test_stored_zip_crypto() {
    roundtrip(CompressionMethod::Stored, EncryptionMethod::ZipCrypto);
}

#[test]
fn test_deflated_zip_crypto() {
    roundtrip(CompressionMethod::Deflated, EncryptionMethod::ZipCrypto);
}

#[test]
fn test_stored_aes_128() {
    roundtrip(CompressionMethod::Stored, EncryptionMethod::AES_128);
}

#[test]
fn test_stored_aes_256() {
    roundtrip(CompressionMethod::Stored, EncryptionMethod::AES_256);
}

#[test]
fn test_deflated_aes_128() {
    roundtrip(CompressionMethod::Deflated, EncryptionMethod::AES_128);
}

#[test]
fn test_deflated_aes_192() {
    roundtrip(
        CompressionMethod::Deflated,
        EncryptionMethod::Aes(AesKeyStrength::Aes192),
    );
}

#[test]
fn test_deflated_aes_256() {
    roundtrip(CompressionMethod::Deflated, EncryptionMethod::AES_256);
}

#[test]
fn test_aes_vendor_versions() {
    for version in [AesVendorVersion::Ae1, AesVendorVersion::Ae2] {
        let options = WriteOptions::new()
            .aes(AesKeyStrength::Aes256)
            .aes_version(version)
            .password(PASSWORD);
        let (bytes, result) =
            common::create_archive_with_result(Some(options), &[("a.txt", b"vendor version")])
                .unwrap();

        let entry = &result.model.entries[0];
        let aes = entry.aes.as_ref().expect("AES extra field");
        assert_eq!(aes.vendor_version, version);
        assert_eq!(entry.crc_checked(), version == AesVendorVersion::Ae1);

        common::verify_encrypted_archive(&bytes, PASSWORD, &[("a.txt", b"vendor version")]);
    }
}

#[test]
fn test_compression_levels() {
    let data = b"abcabcabcabc".repeat(1000);
    let mut sizes = Vec::new();
    for level in [
        CompressionLevel::Level(0),
        CompressionLevel::Low,
        CompressionLevel::Normal,
        CompressionLevel::High,
    ] {
        let options = WriteOptions::new().level(level);
        let (bytes, result) =
            common::create_archive_with_result(Some(options), &[("data", &data)]).unwrap();
        common::verify_archive_contents(&bytes, &[("data", &data)]);
        sizes.push(result.compressed_size);
    }
    // Level 0 emits stored deflate blocks.
    assert!(sizes[0] > data.len() as u64);
    assert!(sizes[3] <= sizes[1]);
}

#[test]
fn test_invalid_compression_level() {
    let err = WriteOptions::new().level_value(10).unwrap_err();
    assert!(matches!(err, zipkit::Error::InvalidCompressionLevel(10)));
}

#[test]
fn test_empty_archive() {
    let (bytes, result) = common::create_archive_with_result(None, &[]).unwrap();

    assert_eq!(result.entries_written, 0);
    assert_eq!(result.directories_written, 0);
    assert_eq!(&bytes[0..4], b"PK\x05\x06");

    let archive = common::open(bytes, None);
    assert!(archive.is_empty());
}

#[test]
fn test_directories_and_deep_paths() {
    let mut writer = Writer::new(Vec::new());
    writer
        .add_directory(ArchivePath::new("a").unwrap(), EntryMeta::directory())
        .unwrap();
    let deep = (0..20).map(|i| format!("level{}", i)).collect::<Vec<_>>().join("/");
    let deep_file = format!("{}/leaf.txt", deep);
    writer
        .add_bytes(ArchivePath::new(&deep_file).unwrap(), b"deep")
        .unwrap();
    let (result, bytes) = writer.finish_into_inner().unwrap();
    assert_eq!(result.directories_written, 1);
    assert_eq!(result.entries_written, 1);

    let mut archive = common::open(bytes, None);
    let dir = archive.entry("a/").unwrap();
    assert!(dir.is_directory);
    assert_eq!(dir.uncompressed_size, 0);
    assert_eq!(archive.read_to_vec(deep_file.as_str()).unwrap(), b"deep");

    let out = tempfile::tempdir().unwrap();
    let extracted = archive.extract_all(out.path(), &ExtractOptions::new()).unwrap();
    assert!(extracted.is_ok());
    assert!(out.path().join("a").is_dir());
    assert_eq!(
        std::fs::read(out.path().join(&deep_file)).unwrap(),
        b"deep"
    );
}

#[test]
fn test_overlong_names_are_rejected() {
    let longest = "a".repeat(65_535);
    let mut writer = Writer::new(Vec::new());

    // The trailing slash of a directory name pushes it past the length field.
    let err = writer
        .add_directory(ArchivePath::new(&longest).unwrap(), EntryMeta::directory())
        .unwrap_err();
    assert!(matches!(err, zipkit::Error::InvalidArchivePath { .. }));

    // A non-ASCII name repeated in the Unicode path extra field.
    let unicode = "é".repeat(32_760);
    writer.set_options(WriteOptions::new().unicode_extra(true));
    let err = writer
        .add_bytes(ArchivePath::new(&unicode).unwrap(), b"x")
        .unwrap_err();
    assert!(matches!(err, zipkit::Error::InvalidArchivePath { .. }));

    // The writer stays usable and the longest plain name still fits.
    writer
        .add_bytes(ArchivePath::new(&longest).unwrap(), b"long")
        .unwrap();
    let (result, bytes) = writer.finish_into_inner().unwrap();
    assert_eq!(result.entries_written, 1);

    let mut archive = common::open(bytes, None);
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.entries()[0].name.len(), 65_535);
    assert_eq!(archive.read_to_vec(longest.as_str()).unwrap(), b"long");
}

#[test]
fn test_extract_all_writes_every_file() {
    let entries = sample_entries();
    let borrowed: Vec<(&str, &[u8])> = entries.iter().map(|(n, d)| (*n, &d[..])).collect();
    let bytes = common::create_archive(&borrowed).unwrap();

    let out = tempfile::tempdir().unwrap();
    let mut archive = common::open(bytes, None);
    let result = archive.extract_all(out.path(), &ExtractOptions::default()).unwrap();

    assert_eq!(result.entries_extracted, entries.len());
    assert_eq!(result.entries_failed, 0);
    let expected_bytes: u64 = entries.iter().map(|(_, d)| d.len() as u64).sum();
    assert_eq!(result.bytes_extracted, expected_bytes);
    for (name, data) in &entries {
        assert_eq!(&std::fs::read(out.path().join(name)).unwrap(), data, "{}", name);
    }
}

#[test]
fn test_extract_entry_with_new_name() {
    let bytes = common::create_archive(&[("docs/readme.txt", b"read me")]).unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut archive = common::open(bytes, None);

    let renamed = archive
        .extract_entry("docs/readme.txt", out.path(), Some("README"), &ExtractOptions::new())
        .unwrap();
    assert_eq!(renamed, out.path().join("README"));
    assert_eq!(std::fs::read(&renamed).unwrap(), b"read me");

    let plain = archive
        .extract_entry("docs/readme.txt", out.path(), None, &ExtractOptions::new())
        .unwrap();
    assert_eq!(plain, out.path().join("readme.txt"));
    assert!(!out.path().join("docs").exists());
}

#[test]
fn test_extract_preserves_modification_time() {
    let time = DosDateTime::new(2019, 3, 14, 15, 9, 26).unwrap();
    let mut writer = Writer::new(Vec::new());
    writer
        .add_stream(
            ArchivePath::new("pi.txt").unwrap(),
            &mut &b"3.14159"[..],
            EntryMeta::file(7).modified(time),
        )
        .unwrap();
    let (_, bytes) = writer.finish_into_inner().unwrap();

    let out = tempfile::tempdir().unwrap();
    let mut archive = common::open(bytes, None);
    let path = archive
        .extract_entry("pi.txt", out.path(), None, &ExtractOptions::new().preserve_mtime(true))
        .unwrap();

    let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(DosDateTime::from_system_time(mtime), time);
}

#[test]
fn test_unicode_names() {
    let names = ["日本語.txt", "émigré/café.txt", "Ωμέγα.bin", "emoji-🦀.rs"];
    let entries: Vec<(&str, &[u8])> = names.iter().map(|n| (*n, n.as_bytes())).collect();

    for unicode_extra in [false, true] {
        let options = WriteOptions::new().unicode_extra(unicode_extra);
        let bytes = common::create_archive_with_options(options, &entries).unwrap();
        common::verify_archive_contents(&bytes, &entries);

        let archive = common::open(bytes, None);
        for (entry, name) in archive.entries().iter().zip(names) {
            assert_eq!(entry.name, name);
        }
    }
}

#[test]
fn test_add_entries_from_disk() {
    let src = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(src.path().join("site/css")).unwrap();
    std::fs::write(src.path().join("site/index.html"), b"<html></html>").unwrap();
    std::fs::write(src.path().join("site/css/main.css"), b"body {}").unwrap();

    let dest = tempfile::tempdir().unwrap();
    let zip_path = dest.path().join("site.zip");
    let root = src.path().join("site");

    let mut writer = Writer::create_path(&zip_path).unwrap();
    let sources = [
        EntrySource::new(root.join("index.html")),
        EntrySource::new(root.join("css")),
        EntrySource::new(root.join("css/main.css")),
    ];
    assert_eq!(writer.add_entries(&sources, &root).unwrap(), 3);
    let result = writer.finish().unwrap();
    assert_eq!(result.entries_written, 2);
    assert_eq!(result.directories_written, 1);

    let mut archive = Archive::open_path(&zip_path).unwrap();
    let names: Vec<_> = archive.entries().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["index.html", "css/", "css/main.css"]);
    assert_eq!(archive.read_to_vec("css/main.css").unwrap(), b"body {}");
}

#[test]
fn test_read_from_writer_output_cursor() {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .add_bytes(ArchivePath::new("c.txt").unwrap(), b"cursor")
        .unwrap();
    let (_, cursor) = writer.finish_into_inner().unwrap();

    let mut archive = Archive::open(Cursor::new(cursor.into_inner())).unwrap();
    assert_eq!(archive.read_to_vec("c.txt").unwrap(), b"cursor");
}
