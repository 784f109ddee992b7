//! Round trips through files and the public reader/writer API.

use std::fs;

use blockgz_lib::bgzf_io::{create_writer, open_reader};
use blockgz_lib::writer::HTSLIB_BLOCK_SIZE;
use blockgz_lib::{BGZF_EOF, Blocks, WriterOptions};
use rstest::rstest;
use std::io::{Cursor, Read};
use tempfile::TempDir;

use crate::helpers::{compress, decompress, random_payload, text_payload};

#[test]
fn test_empty_payload_round_trip() {
    let data = compress(b"", WriterOptions::default());
    assert_eq!(data, BGZF_EOF);
    assert!(decompress(data).is_empty());
}

#[rstest]
#[case(1)]
#[case(65535)]
#[case(65536)]
#[case(65537)]
#[case(1_000_000)]
fn test_text_round_trip(#[case] len: usize) {
    let mut payload = text_payload(len / 40 + 1);
    payload.truncate(len);
    assert_eq!(decompress(compress(&payload, WriterOptions::default())), payload);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(6)]
#[case(12)]
fn test_random_round_trip_at_level(#[case] level: u32) {
    let payload = random_payload(300_000, u64::from(level));
    let options = WriterOptions {
        compression_level: level,
        block_size: HTSLIB_BLOCK_SIZE,
        ..WriterOptions::default()
    };
    assert_eq!(decompress(compress(&payload, options)), payload);
}

#[test]
fn test_block_payloads_respect_block_size() {
    let payload = text_payload(10_000);
    let options = WriterOptions { block_size: 10_000, ..WriterOptions::default() };
    let data = compress(&payload, options);

    let blocks: Vec<_> = Blocks::new(Cursor::new(&data)).map(Result::unwrap).collect();
    let (terminator, body) = blocks.split_last().unwrap();
    assert!(terminator.is_terminator());
    assert!(body.iter().all(|b| b.data.len() <= 10_000 && !b.data.is_empty()));
    assert!(body[..body.len() - 1].iter().all(|b| b.data.len() == 10_000));
    assert!(body.iter().all(|b| b.framed_size <= 65536));
    let total: usize = body.iter().map(|b| b.data.len()).sum();
    assert_eq!(total, payload.len());
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reads.sam.gz");
    let payload = text_payload(5_000);

    let mut writer = create_writer(&path, WriterOptions::default()).unwrap();
    for line in payload.split_inclusive(|&b| b == b'\n') {
        writer.write_bytes(line).unwrap();
    }
    writer.finish().unwrap();
    assert!(fs::metadata(&path).unwrap().len() < payload.len() as u64);

    let mut reader = open_reader(&path).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, payload);
}
