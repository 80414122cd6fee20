//! Serialization of the combined enrichment file.
//!
//! The combined file is either one JSON array or JSON Lines (one record per
//! line), selected with `--format` on the CLI.

use serde::Serialize;
use std::io::{self, Write};

/// Layout of the combined output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON array
    #[default]
    Json,
    /// Newline-delimited JSON, one record per line
    JsonLines,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
        }
    }
}

/// Writes records in the chosen `OutputFormat`.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only applies to `OutputFormat::Json`.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write `items` as one array (JSON) or one line each (JSONL).
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let result = if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                } else {
                    serde_json::to_writer(&mut self.writer, items)
                };
                result.map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                for item in items {
                    serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
            }
        }
        self.items_written += items.len();
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
