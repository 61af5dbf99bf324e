//! End-to-end archive tests.

use lzhx_archive::header::ARCHIVE_HEADER_SIZE;
use lzhx_archive::{ArchiveReader, ArchiveWriter, is_lzhx_archive, unique_path};
use lzhx_core::{CodecSettings, LzhxError};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

fn text(len: usize) -> Vec<u8> {
    let words = ["archive", "block", "stream", "huffman", "literal", "match", "window"];
    let mut out = Vec::with_capacity(len);
    let mut i = 0usize;
    while out.len() < len {
        out.extend_from_slice(words[(i * 7 + i / 3) % words.len()].as_bytes());
        out.push(b' ');
        i += 1;
    }
    out.truncate(len);
    out
}

fn pseudo_random(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as u8
        })
        .collect()
}

#[test]
fn test_roundtrip_mixed_entries() {
    let files: Vec<(&str, Vec<u8>)> = vec![
        ("empty.bin", Vec::new()),
        ("one.bin", vec![42]),
        ("text.txt", text(150_000)),
        ("noise.bin", pseudo_random(20_000, 7)),
        ("zeros.bin", vec![0; 70_000]),
    ];

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_directory("nested").unwrap();
    for (name, data) in &files {
        writer.add_data(name, data).unwrap();
    }
    writer.add_data("nested/copy.txt", &files[2].1).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.entries().len(), files.len() + 2);
    let total: u64 = files.iter().map(|(_, d)| d.len() as u64).sum::<u64>() + 150_000;
    assert_eq!(reader.header().uncompressed_size, total);

    for (name, data) in &files {
        assert_eq!(&reader.read_by_name(name).unwrap(), data, "{name}");
    }
    assert_eq!(reader.read_by_name("nested/copy.txt").unwrap(), files[2].1);
    assert!(reader.find("nested").unwrap().is_dir);

    let text_entry = reader.find("text.txt").unwrap();
    assert!(text_entry.space_savings() > 90.0);
}

#[test]
fn test_custom_settings_roundtrip() {
    let settings = CodecSettings::default().with_block_bits(12);
    let data = text(30_000);

    let mut writer = ArchiveWriter::with_settings(Cursor::new(Vec::new()), &settings).unwrap();
    writer.add_data("t.txt", &data).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ArchiveReader::with_settings(Cursor::new(bytes), &settings).unwrap();
    assert_eq!(reader.read_by_name("t.txt").unwrap(), data);
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..6 {
        let path = dir.path().join(format!("f{i}.bin"));
        let data = if i % 2 == 0 { text(10_000 + i * 1000) } else { pseudo_random(5_000, i as u32) };
        fs::write(&path, data).unwrap();
        files.push((format!("f{i}.bin"), path));
    }

    let mut sequential = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    for (name, path) in &files {
        sequential.add_file(name, path).unwrap();
    }
    let sequential = sequential.finish().unwrap().into_inner();

    let mut parallel = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    let added = parallel.add_files_parallel(&files).unwrap();
    let names: Vec<_> = added.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["f0.bin", "f1.bin", "f2.bin", "f3.bin", "f4.bin", "f5.bin"]);
    let parallel = parallel.finish().unwrap().into_inner();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_parallel_missing_file() {
    let files = vec![("gone.bin".to_string(), PathBuf::from("/nonexistent/gone.bin"))];
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    assert!(matches!(writer.add_files_parallel(&files), Err(LzhxError::Io(_))));
}

#[test]
fn test_hash_mismatch_detected() {
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_data("a.txt", b"integrity matters").unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Stored hash of the first file header.
    bytes[ARCHIVE_HEADER_SIZE + 21] ^= 0x01;

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    let err = reader.verify_all().unwrap_err();
    assert!(matches!(err, LzhxError::HashMismatch { ref name, .. } if name == "a.txt"), "{err}");
}

#[test]
fn test_corrupt_payload_never_panics() {
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_data("t.txt", &text(40_000)).unwrap();
    let original = writer.finish().unwrap().into_inner();
    let data_start = ARCHIVE_HEADER_SIZE + 25 + "t.txt".len();

    for pos in (data_start..original.len()).step_by(37) {
        let mut bytes = original.clone();
        bytes[pos] ^= 0x5A;
        let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
        // Any error is fine as long as nothing panics and no bad data passes.
        if reader.verify_all().is_ok() {
            assert_eq!(reader.read_by_name("t.txt").unwrap(), text(40_000));
        }
    }
}

#[test]
fn test_extract_all_to_disk() {
    let src = tempfile::tempdir().unwrap();
    let root = src.path().join("site");
    fs::create_dir_all(root.join("css")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("index.html"), text(5_000)).unwrap();
    fs::write(root.join("css/style.css"), b"body { margin: 0 }").unwrap();

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_path(&root).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let out = tempfile::tempdir().unwrap();
    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    let written = reader.extract_all(out.path()).unwrap();
    assert_eq!(written.len(), 5);

    assert_eq!(fs::read(out.path().join("site/index.html")).unwrap(), text(5_000));
    assert_eq!(
        fs::read(out.path().join("site/css/style.css")).unwrap(),
        b"body { margin: 0 }"
    );
    assert!(out.path().join("site/empty").is_dir());
}

#[test]
fn test_traversal_rejected_before_writing() {
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_data("good.txt", b"fine").unwrap();
    writer.add_data("evil.txt", b"nope").unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Rename the second entry to "../il.txt" in place; same length.
    let pos = bytes.windows(8).rposition(|w| w == b"evil.txt").unwrap();
    bytes[pos..pos + 3].copy_from_slice(b"../");

    let out = tempfile::tempdir().unwrap();
    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert!(matches!(
        reader.extract_all(&out.path().join("dest")),
        Err(LzhxError::PathTraversal { .. })
    ));
    assert!(!out.path().join("dest").exists());
    assert!(!out.path().join("il.txt").exists());
}

#[test]
fn test_archive_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, text(2_000)).unwrap();

    let archive_path = unique_path(&input, "lzhx");
    assert_eq!(archive_path, dir.path().join("notes.lzhx"));
    let file = fs::File::create(&archive_path).unwrap();
    let mut writer = ArchiveWriter::new(file).unwrap();
    writer.add_path(&input).unwrap();
    writer.finish().unwrap();

    assert!(is_lzhx_archive(&archive_path).unwrap());
    assert!(!is_lzhx_archive(&input).unwrap());

    let mut reader = ArchiveReader::new(fs::File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(reader.read_by_name("notes.txt").unwrap(), text(2_000));
}
