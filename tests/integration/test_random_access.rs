//! Random access by virtual offset over files written with the library.

use std::io::Read;

use blockgz_lib::bgzf_io::{append_writer, create_writer, open_reader};
use blockgz_lib::{VirtualOffset, WriterOptions};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::TempDir;

/// Writes numbered records and returns each record with the virtual offset it starts at.
fn write_records(path: &std::path::Path, count: usize) -> Vec<(VirtualOffset, Vec<u8>)> {
    let options = WriterOptions { block_size: 4096, ..WriterOptions::default() };
    let mut writer = create_writer(path, options).unwrap();
    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let record = format!("record-{i:06}:{}\n", "N".repeat(i % 97)).into_bytes();
        records.push((writer.virtual_offset().unwrap(), record.clone()));
        writer.write_bytes(&record).unwrap();
    }
    writer.finish().unwrap();
    records
}

#[test]
fn test_seek_to_every_record_in_random_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.gz");
    let mut records = write_records(&path, 3_000);
    records.shuffle(&mut StdRng::seed_from_u64(42));

    let mut reader = open_reader(&path).unwrap();
    for (offset, record) in &records {
        reader.seek(*offset).unwrap();
        assert_eq!(&reader.read_bytes(record.len()).unwrap(), record);
    }
}

#[test]
fn test_reader_offsets_match_writer_offsets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.gz");
    let records = write_records(&path, 1_000);

    let mut reader = open_reader(&path).unwrap();
    for (offset, record) in &records {
        let here = reader.virtual_offset().unwrap();
        // A record starting exactly at a block boundary is addressed by the next block start
        assert_eq!(here, *offset, "record {}", String::from_utf8_lossy(record));
        reader.read_bytes(record.len()).unwrap();
    }
    assert!(reader.is_eof().unwrap());
}

#[test]
fn test_seek_then_stream_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.gz");
    let records = write_records(&path, 500);
    let (offset, _) = records[250];
    let expected: Vec<u8> = records[250..].iter().flat_map(|(_, r)| r.clone()).collect();

    let mut reader = open_reader(&path).unwrap();
    reader.seek(offset).unwrap();
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, expected);
}

#[test]
fn test_offsets_survive_append() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("appended.gz");

    let mut writer = create_writer(&path, WriterOptions::default()).unwrap();
    writer.write_bytes(b"first session\n").unwrap();
    writer.close().unwrap();

    let mut writer = append_writer(&path, WriterOptions::default()).unwrap();
    writer.write_bytes(b"second ").unwrap();
    let bookmark = writer.virtual_offset().unwrap();
    writer.write_bytes(b"session\n").unwrap();
    writer.finish().unwrap();

    let mut reader = open_reader(&path).unwrap();
    let mut all = String::new();
    reader.read_to_string(&mut all).unwrap();
    assert_eq!(all, "first session\nsecond session\n");

    reader.seek(bookmark).unwrap();
    assert_eq!(reader.read_bytes(8).unwrap(), b"session\n");
}
