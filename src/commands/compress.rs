//! Compress plain data into a BGZF stream.

use std::io::{self, Read, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};

use blockgz_lib::bgzf_io::{append_writer, create_output, create_writer, is_stdio, open_input};
use blockgz_lib::logging::{OperationTimer, format_count, log_compression_summary};
use blockgz_lib::writer::{BgzfWriter, CloseError};

use crate::commands::command::Command;
use crate::commands::common::{CompressionOptions, IoOptions};

/// Compress data into BGZF.
#[derive(Debug, Parser)]
#[command(
    name = "compress",
    about = "\x1b[38;5;72m[CODEC]\x1b[0m          \x1b[36mCompress data into a BGZF stream\x1b[0m",
    long_about = r#"
Compress plain data into BGZF (Blocked GZip Format).

Input is split into blocks of at most --block-size bytes, each compressed as an
independent gzip member carrying its framed size in a BC extra subfield. The output
is a valid multi-member gzip file that can also be read by gunzip or zcat, and it
supports random access through virtual offsets.

Unless --no-eof is given the stream is terminated with an empty block, the marker
readers such as samtools use to detect truncation.

Example usage:
  blockgz compress -i reads.sam -o reads.sam.gz
  cat reads.sam | blockgz compress -l 9 > reads.sam.gz
  blockgz compress -i more.sam -o reads.sam.gz --append
"#
)]
pub struct Compress {
    /// Input/output options
    #[command(flatten)]
    pub io: IoOptions,

    /// Append to an existing BGZF file instead of replacing it
    #[arg(long, default_value = "false")]
    pub append: bool,

    /// Leave the stream without a terminating empty block
    #[arg(long, default_value = "false")]
    pub no_eof: bool,

    /// Compression options for the output.
    #[command(flatten)]
    pub compression: CompressionOptions,
}

/// Byte and block counts for one compression run.
struct CompressStats {
    uncompressed: u64,
    compressed: u64,
    blocks: u64,
}

impl Command for Compress {
    fn execute(&self, command_line: &str) -> Result<()> {
        debug!("Command line: {command_line}");
        self.io.validate()?;
        let options = self.compression.writer_options()?;
        if self.append && is_stdio(&self.io.output) {
            bail!("--append requires an output file, not standard output");
        }

        info!("Starting Compress");
        info!("Input: {}", self.io.input_name());
        info!("Output: {}", self.io.output_name());
        info!("Compression level: {}", options.compression_level);
        info!("Block size: {}", format_count(options.block_size as u64));

        let timer = OperationTimer::new("Compressing");
        let mut input = open_input(&self.io.input)?;

        let stats = if is_stdio(&self.io.output) {
            let writer = BgzfWriter::with_options(create_output(&self.io.output)?, options)?;
            self.compress_stream(&mut input, writer)?
        } else if self.append {
            self.compress_stream(&mut input, append_writer(&self.io.output, options)?)?
        } else {
            self.compress_stream(&mut input, create_writer(&self.io.output, options)?)?
        };

        log_compression_summary(stats.uncompressed, stats.compressed, stats.blocks);
        timer.log_completion(stats.uncompressed);
        Ok(())
    }
}

impl Compress {
    fn compress_stream<W: Write>(
        &self,
        input: &mut dyn Read,
        mut writer: BgzfWriter<W>,
    ) -> Result<CompressStats> {
        let start = writer.position();
        let uncompressed = io::copy(input, &mut writer)
            .with_context(|| format!("Failed to compress {}", self.io.input_name()))?;

        if self.no_eof {
            if writer.pending_len() > 0 {
                writer.flush()?;
            }
        } else {
            // The second flush has nothing pending and writes the empty terminator block
            writer.flush()?;
            writer.flush()?;
        }

        let stats = CompressStats {
            uncompressed,
            compressed: writer.position() - start,
            blocks: writer.blocks_written(),
        };
        writer
            .close()
            .map_err(CloseError::into_error)
            .with_context(|| format!("Failed to finish writing {}", self.io.output_name()))?;
        Ok(stats)
    }
}
