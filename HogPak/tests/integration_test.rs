use std::fs::File;
use std::path::Path;

use hogpak::hog::{DEFAULT_SIDECAR_NAME, HogIndex, HogReader};
use hogpak::prelude::*;
use pretty_assertions::assert_eq;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tempfile::tempdir;
use walkdir::WalkDir;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

fn write_file(root: &Path, name: &str, data: &[u8]) {
    let path = root.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

/// Every file below `root` as (forward-slash name, contents), sorted by name
fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(std::result::Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let name = hogpak::utils::relative_path(e.path(), root).unwrap();
            (name, std::fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

fn sidecar(entries: &[(&str, bool)]) -> String {
    let files: Vec<String> = entries
        .iter()
        .map(|(path, compressed)| format!(r#"{{"path":"{path}","isCompressed":{compressed}}}"#))
        .collect();
    format!(r#"{{"fileCount":{},"files":[{}]}}"#, entries.len(), files.join(","))
}

fn read_index(archive: &Path) -> HogIndex {
    let mut reader = HogReader::new(File::open(archive).unwrap());
    reader.index().unwrap().clone()
}

#[test]
fn test_directory_roundtrip() {
    init_logging();
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");

    let text = b"All work and no play makes a dull archive. ".repeat(50);
    let multi: Vec<u8> = (0..3 * 65536 + 5).map(|i| (i % 251) as u8).collect();

    write_file(&input, "empty.dat", b"");
    write_file(&input, "docs/small.txt", &text);
    write_file(&input, "docs/raw_small.txt", &text);
    write_file(&input, "exact.bin", &vec![0u8; 65536]);
    write_file(&input, "levels/one/multi.bin", &multi);
    write_file(&input, "noise.bin", &noise(70_000, 1));
    write_file(
        &input,
        DEFAULT_SIDECAR_NAME,
        sidecar(&[
            ("docs/small.txt", true),
            ("exact.bin", true),
            ("levels/one/multi.bin", true),
            ("noise.bin", true),
        ])
        .as_bytes(),
    );

    let archive = dir.path().join("out.hogp");
    let summary = HogOperations::pack(&input, &archive).unwrap();
    assert_eq!(summary.files, 6);

    let index = read_index(&archive);
    let names: Vec<_> = index.entries.iter().map(|e| e.name.as_str()).collect();
    assert!(!names.contains(&DEFAULT_SIDECAR_NAME));

    let by_name = |name: &str| index.entries.iter().find(|e| e.name == name).unwrap();
    assert!(by_name("docs/small.txt").is_compressed());
    assert!(!by_name("docs/raw_small.txt").is_compressed());
    assert_eq!(index.chunks_for(by_name("levels/one/multi.bin")).unwrap().len(), 4);

    let output = dir.path().join("output");
    let report = HogOperations::unpack(&archive, &output).unwrap();
    assert!(report.is_complete());

    let mut expected = read_tree(&input);
    expected.retain(|(name, _)| name != DEFAULT_SIDECAR_NAME);
    assert_eq!(read_tree(&output), expected);
}

#[test]
fn test_concrete_scenario() {
    init_logging();
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");

    write_file(&input, "a.txt", &vec![0u8; 70_000]);
    write_file(&input, "b.bin", &noise(10, 7));
    write_file(&input, "empty.dat", b"");
    write_file(
        &input,
        DEFAULT_SIDECAR_NAME,
        sidecar(&[("a.txt", true), ("b.bin", false)]).as_bytes(),
    );

    let archive = dir.path().join("scenario.hogp");
    HogOperations::pack(&input, &archive).unwrap();
    let index = read_index(&archive);

    let a = &index.entries[0];
    assert_eq!(a.name, "a.txt");
    assert_eq!(a.size, 70_000);
    let chunks = index.chunks_for(a).unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|&c| c > 0));
    assert!(usize::from(chunks[0]) < 65536);
    assert_eq!(a.compressed_size, chunks.iter().map(|&c| u32::from(c)).sum::<u32>());

    let b = &index.entries[1];
    assert_eq!(b.name, "b.bin");
    assert_eq!(b.compressed_size, 10);
    assert_eq!(b.chunk_idx, 0);

    let empty = &index.entries[2];
    assert_eq!(empty.name, "empty.dat");
    assert_eq!(empty.size, 0);
    assert_eq!(empty.compressed_size, 0);
    assert_eq!(empty.chunk_idx, -1);

    let output = dir.path().join("output");
    HogOperations::unpack(&archive, &output).unwrap();
    assert_eq!(std::fs::read(output.join("a.txt")).unwrap(), vec![0u8; 70_000]);
    assert_eq!(std::fs::metadata(output.join("empty.dat")).unwrap().len(), 0);
}

#[test]
fn test_incompressible_window_stays_raw() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    let data = noise(65536, 42);
    write_file(&input, "random.bin", &data);

    let archive = dir.path().join("random.hogp");
    let options = PackOptions::new().with_policy(PolicyKind::Always);
    HogOperations::pack_with_options(&input, &archive, &options, &|_| {}).unwrap();

    let index = read_index(&archive);
    let entry = &index.entries[0];
    assert_eq!(index.chunks_for(entry).unwrap(), &[0u16][..]);

    let bytes = std::fs::read(&archive).unwrap();
    let start = entry.offset as usize;
    assert_eq!(&bytes[start..start + 65536], data.as_slice());

    let output = dir.path().join("output");
    HogOperations::unpack(&archive, &output).unwrap();
    assert_eq!(std::fs::read(output.join("random.bin")).unwrap(), data);
}

#[test]
fn test_malformed_sidecar_stores_everything_raw() {
    init_logging();
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "a.txt", &vec![b'a'; 5000]);
    write_file(&input, DEFAULT_SIDECAR_NAME, b"{ \"files\": [ oops");

    let archive = dir.path().join("out.hogp");
    let summary = HogOperations::pack(&input, &archive).unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.compressed_files, 0);

    let entries = HogOperations::list(&archive).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].compressed_size, 5000);
}

#[test]
fn test_custom_sidecar_name() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "a.txt", &vec![b'a'; 5000]);
    write_file(&input, "layout.json", sidecar(&[("a.txt", true)]).as_bytes());

    let archive = dir.path().join("out.hogp");
    let options = PackOptions::new().with_sidecar_name("layout.json");
    HogOperations::pack_with_options(&input, &archive, &options, &|_| {}).unwrap();

    let entries = HogOperations::list(&archive).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_compressed());
}

#[test]
fn test_emitted_sidecar_reproduces_archive() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "text/readme.txt", &b"hello archive ".repeat(500));
    write_file(&input, "noise.bin", &noise(3000, 9));
    write_file(&input, "empty.dat", b"");

    let first = dir.path().join("first.hogp");
    let options = PackOptions::new().with_policy(PolicyKind::Auto);
    HogOperations::pack_with_options(&input, &first, &options, &|_| {}).unwrap();

    let unpacked = dir.path().join("unpacked");
    let extract = ExtractOptions::new().with_emit_sidecar(true);
    HogOperations::unpack_with_options(&first, &unpacked, &extract, &|_| {}).unwrap();
    assert!(unpacked.join(DEFAULT_SIDECAR_NAME).is_file());

    let second = dir.path().join("second.hogp");
    HogOperations::pack(&unpacked, &second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_missing_input_directory() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("out.hogp");

    let err = HogOperations::pack(dir.path().join("nope"), archive.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
    assert!(!archive.exists());
}

#[test]
fn test_rejects_bad_magic_and_version() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "a.txt", b"abc");
    let archive = dir.path().join("out.hogp");
    HogOperations::pack(&input, &archive).unwrap();
    let good = std::fs::read(&archive).unwrap();

    let mut bad_magic = good.clone();
    bad_magic[..4].copy_from_slice(b"HOGX");
    std::fs::write(&archive, &bad_magic).unwrap();
    let err = HogOperations::list(&archive).unwrap_err();
    assert!(matches!(err, Error::InvalidHogMagic(_)));
    assert_eq!(err.kind(), ErrorKind::Format);

    let mut bad_version = good;
    bad_version[4..8].copy_from_slice(&2i32.to_le_bytes());
    std::fs::write(&archive, &bad_version).unwrap();
    let err = HogOperations::unpack(&archive, &dir.path().join("out")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedHogVersion { version: 2 }));
}

#[test]
fn test_truncated_archive() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "a.txt", b"some data");
    write_file(&input, "b.txt", b"more data");
    let archive = dir.path().join("out.hogp");
    HogOperations::pack(&input, &archive).unwrap();

    let bytes = std::fs::read(&archive).unwrap();
    std::fs::write(&archive, &bytes[..bytes.len() - 6]).unwrap();

    let err = HogOperations::info(&archive).unwrap_err();
    assert!(matches!(err, Error::TruncatedTable(_)));
}

#[test]
fn test_corrupt_entry_reports_partial_failure() {
    init_logging();
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    write_file(&input, "a.txt", &b"alpha ".repeat(2000));
    write_file(&input, "b.txt", &b"bravo ".repeat(2000));
    write_file(&input, "c.txt", &b"charlie ".repeat(2000));

    let archive = dir.path().join("out.hogp");
    let options = PackOptions::new().with_policy(PolicyKind::Always);
    HogOperations::pack_with_options(&input, &archive, &options, &|_| {}).unwrap();

    let index = read_index(&archive);
    let mut bytes = std::fs::read(&archive).unwrap();
    bytes[index.entries[1].offset as usize] = 0xFF;
    std::fs::write(&archive, &bytes).unwrap();

    let output = dir.path().join("output");
    let err = HogOperations::unpack(&archive, &output).unwrap_err();
    match err {
        Error::ExtractionPartialFailure { total, failed, ref first_error } => {
            assert_eq!(total, 3);
            assert_eq!(failed, 1);
            assert!(first_error.starts_with("b.txt"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(output.join("a.txt").is_file());
    assert!(!output.join("b.txt").exists());
    assert!(output.join("c.txt").is_file());
}
