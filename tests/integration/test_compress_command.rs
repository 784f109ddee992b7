//! Integration tests for the compress command.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use blockgz_lib::{BGZF_EOF, Blocks};
use tempfile::TempDir;

use crate::helpers::{arg, decompress, random_payload, run_blockgz, text_payload};

#[test]
fn test_compress_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("reads.sam");
    let output = temp_dir.path().join("reads.sam.gz");
    let payload = text_payload(10_000);
    fs::write(&input, &payload).unwrap();

    let result = run_blockgz(&["compress", "-i", arg(&input), "-o", arg(&output)]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let data = fs::read(&output).unwrap();
    assert_eq!(&data[data.len() - 28..], &BGZF_EOF);
    assert_eq!(decompress(data), payload);
}

#[test]
fn test_compress_incompressible_input_with_default_block_size() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("random.bin");
    let output = temp_dir.path().join("random.bin.gz");
    let payload = random_payload(500_000, 9);
    fs::write(&input, &payload).unwrap();

    let result = run_blockgz(&["compress", "-i", arg(&input), "-o", arg(&output)]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(decompress(fs::read(&output).unwrap()), payload);
}

#[test]
fn test_compress_incompressible_input_with_full_blocks_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("random.bin");
    let output = temp_dir.path().join("random.bin.gz");
    fs::write(&input, random_payload(200_000, 10)).unwrap();

    let result = run_blockgz(&[
        "compress",
        "-i",
        arg(&input),
        "-o",
        arg(&output),
        "--block-size",
        "65536",
    ]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("smaller block size"));
}

#[test]
fn test_compress_stdin_to_stdout() {
    let payload = text_payload(2_000);
    let mut child = Command::new(env!("CARGO_BIN_EXE_blockgz"))
        .args(["compress", "--compression-level", "1"])
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn blockgz");
    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(&payload).unwrap();
    }
    let result = child.wait_with_output().unwrap();
    assert!(result.status.success());
    assert_eq!(decompress(result.stdout), payload);
}

#[test]
fn test_compress_no_eof() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("small.txt");
    let output = temp_dir.path().join("small.txt.gz");
    fs::write(&input, b"no terminator").unwrap();

    let result = run_blockgz(&["compress", "-i", arg(&input), "-o", arg(&output), "--no-eof"]);
    assert!(result.status.success());

    let data = fs::read(&output).unwrap();
    let sizes: Vec<usize> =
        Blocks::new(data.as_slice()).map(|b| b.unwrap().data.len()).collect();
    assert_eq!(sizes, vec![13]);
    assert_eq!(decompress(data), b"no terminator");
}

#[test]
fn test_compress_append() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.txt");
    let second = temp_dir.path().join("second.txt");
    let output = temp_dir.path().join("both.gz");
    fs::write(&first, b"one\n").unwrap();
    fs::write(&second, b"two\n").unwrap();

    let result = run_blockgz(&["compress", "-i", arg(&first), "-o", arg(&output), "--no-eof"]);
    assert!(result.status.success());
    let result = run_blockgz(&["compress", "-i", arg(&second), "-o", arg(&output), "--append"]);
    assert!(result.status.success());

    assert_eq!(decompress(fs::read(&output).unwrap()), b"one\ntwo\n");
}

#[test]
fn test_compress_rejects_bad_level() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in.txt");
    fs::write(&input, b"x").unwrap();
    let output = temp_dir.path().join("out.gz");

    let result =
        run_blockgz(&["compress", "-i", arg(&input), "-o", arg(&output), "-l", "13"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("compression-level"));
}
