//! Decompress a BGZF stream, optionally starting from a virtual offset.

use std::io::{self, Read, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};

use blockgz_lib::bgzf_io::{create_output, is_stdio, open_input, open_reader};
use blockgz_lib::logging::OperationTimer;
use blockgz_lib::reader::BgzfReader;
use blockgz_lib::virtual_offset::VirtualOffset;

use crate::commands::command::Command;
use crate::commands::common::IoOptions;

/// Decompress BGZF data.
#[derive(Debug, Parser)]
#[command(
    name = "decompress",
    about = "\x1b[38;5;72m[CODEC]\x1b[0m          \x1b[36mDecompress a BGZF stream\x1b[0m",
    long_about = r#"
Decompress a BGZF stream.

With --virtual-offset, decompression starts at the given 64-bit virtual offset (block
start in the upper 48 bits, offset within the decompressed block in the lower 16 bits),
as stored in BAI, CSI and tabix indexes. Seeking requires a file input.

With --length, exactly that many bytes are written; running out of data first is an
error.

Example usage:
  blockgz decompress -i reads.sam.gz -o reads.sam
  blockgz decompress -i reads.sam.gz --virtual-offset 6553600010 --length 200
"#
)]
pub struct Decompress {
    /// Input/output options
    #[command(flatten)]
    pub io: IoOptions,

    /// Virtual offset to start decompressing from
    #[arg(long)]
    pub virtual_offset: Option<u64>,

    /// Number of decompressed bytes to write
    #[arg(long)]
    pub length: Option<u64>,
}

impl Command for Decompress {
    fn execute(&self, command_line: &str) -> Result<()> {
        debug!("Command line: {command_line}");
        self.io.validate()?;

        info!("Starting Decompress");
        info!("Input: {}", self.io.input_name());
        info!("Output: {}", self.io.output_name());

        let timer = OperationTimer::new("Decompressing");
        let mut output = create_output(&self.io.output)?;

        let written = if is_stdio(&self.io.input) {
            if self.virtual_offset.is_some() {
                bail!("--virtual-offset requires an input file, not standard input");
            }
            let mut reader = BgzfReader::open(open_input(&self.io.input)?)
                .context("Failed to read BGZF data from standard input")?;
            self.copy_out(&mut reader, &mut output)?
        } else {
            let mut reader = open_reader(&self.io.input)?;
            if let Some(raw) = self.virtual_offset {
                let offset = VirtualOffset::from(raw);
                info!("Seeking to virtual offset {offset}");
                reader
                    .seek(offset)
                    .with_context(|| format!("Failed to seek to virtual offset {raw}"))?;
            }
            self.copy_out(&mut reader, &mut output)?
        };

        output.flush().context("Failed to flush output")?;
        timer.log_completion(written);
        Ok(())
    }
}

impl Decompress {
    fn copy_out<R: Read>(&self, reader: &mut BgzfReader<R>, output: &mut dyn Write) -> Result<u64> {
        let input = self.io.input_name();
        match self.length {
            Some(length) => {
                let copied = io::copy(&mut reader.by_ref().take(length), output)
                    .with_context(|| format!("Failed to decompress {input}"))?;
                if copied < length {
                    bail!("{input} ended after {copied} of the {length} requested bytes");
                }
                Ok(copied)
            }
            None => {
                io::copy(reader, output).with_context(|| format!("Failed to decompress {input}"))
            }
        }
    }
}
