//! File-backed constructors for BGZF readers and writers.
//!
//! The codec types work over any `Read`/`Write`; these helpers open paths with buffering and
//! attach the path to any error, matching how the command-line tools report failures. A path
//! of `-` means standard input or output for the plain (uncompressed) side of a command.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::reader::BgzfReader;
use crate::writer::{BgzfWriter, WriterOptions};

/// Path value meaning standard input or standard output.
pub const STDIO_PATH: &str = "-";

/// Returns true if `path` refers to standard input or output.
#[must_use]
pub fn is_stdio<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().as_os_str() == STDIO_PATH
}

/// Fails unless `path` exists.
///
/// # Errors
///
/// Returns an error naming the file and its `description` if it does not exist.
///
/// # Example
///
/// ```
/// use blockgz_lib::bgzf_io::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.gz", "Input file").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("{description} does not exist: {}", path.display());
    }
    Ok(())
}

/// Opens a BGZF file and loads its first block.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, empty or does not start with a
/// valid BGZF block.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<BgzfReader<BufReader<File>>> {
    let path = path.as_ref();
    validate_file_exists(path, "BGZF file")?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open BGZF file: {}", path.display()))?;
    BgzfReader::open(BufReader::new(file))
        .with_context(|| format!("Failed to read BGZF file: {}", path.display()))
}

/// Creates (or truncates) a file and wraps it in a BGZF writer.
///
/// # Errors
///
/// Returns an error if the options are invalid or the file cannot be created.
pub fn create_writer<P: AsRef<Path>>(
    path: P,
    options: WriterOptions,
) -> Result<BgzfWriter<BufWriter<File>>> {
    let path = path.as_ref();
    options.validate()?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create BGZF file: {}", path.display()))?;
    Ok(BgzfWriter::with_options(BufWriter::new(file), options)?)
}

/// Opens a file for appending and wraps it in a BGZF writer.
///
/// The writer's start position is set to the current file length so virtual offsets
/// address the combined file; `options.start_position` is ignored. The file is created
/// if it does not exist.
///
/// # Errors
///
/// Returns an error if the options are invalid or the file cannot be opened.
pub fn append_writer<P: AsRef<Path>>(
    path: P,
    options: WriterOptions,
) -> Result<BgzfWriter<BufWriter<File>>> {
    let path = path.as_ref();
    options.validate()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open BGZF file for append: {}", path.display()))?;
    let start_position = file
        .metadata()
        .with_context(|| format!("Failed to stat BGZF file: {}", path.display()))?
        .len();
    log::debug!("Appending to {} at offset {start_position}", path.display());
    Ok(BgzfWriter::with_options(BufWriter::new(file), WriterOptions { start_position, ..options })?)
}

/// Opens a plain input, or standard input for `-`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    validate_file_exists(path, "Input file")?;
    let file =
        File::open(path).with_context(|| format!("Failed to open input: {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Creates a plain output, or standard output for `-`.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write>> {
    let path = path.as_ref();
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
