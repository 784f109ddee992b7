//! BGZF output is ordinary multi-member gzip, and BGZF produced by other gzip writers reads back.

use std::io::{Cursor, Read, Write};

use blockgz_lib::{BgzfError, BgzfReader, WriterOptions};
use flate2::Compression;
use flate2::GzBuilder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::helpers::{compress, random_payload, text_payload};

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    MultiGzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

#[test]
fn test_gzip_decoder_reads_multi_block_output() {
    let payload = text_payload(20_000);
    let data = compress(&payload, WriterOptions::default());
    assert_eq!(gunzip(&data), payload);
}

#[test]
fn test_gzip_decoder_reads_incompressible_output() {
    let payload = random_payload(200_000, 11);
    let options = WriterOptions { block_size: 65280, ..WriterOptions::default() };
    assert_eq!(gunzip(&compress(&payload, options)), payload);
}

/// A gzip member written by flate2 with a foreign subfield ahead of `BC`.
fn foreign_bgzf_member(payload: &[u8]) -> Vec<u8> {
    let extra = vec![b'X', b'Y', 2, 0, 0xaa, 0xbb, b'B', b'C', 2, 0, 0, 0];
    let mut encoder = GzBuilder::new().extra(extra).write(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    let mut member = encoder.finish().unwrap();

    // 10 byte fixed header, 2 byte XLEN, 6 byte XY subfield, 4 byte BC subfield header
    let bsize = u16::try_from(member.len() - 1).unwrap().to_le_bytes();
    member[22..24].copy_from_slice(&bsize);
    member
}

#[test]
fn test_reads_member_with_extra_subfields() {
    let mut data = foreign_bgzf_member(b"from another writer ");
    data.extend_from_slice(&foreign_bgzf_member(b"and another"));

    let mut reader = BgzfReader::open(Cursor::new(data)).unwrap();
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "from another writer and another");
}

#[test]
fn test_plain_gzip_is_rejected() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"not blocked").unwrap();
    let data = encoder.finish().unwrap();

    let err = BgzfReader::open(Cursor::new(data)).err().unwrap();
    assert!(matches!(err, BgzfError::Format { offset: 0, .. }));
}
