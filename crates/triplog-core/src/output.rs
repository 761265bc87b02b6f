//! Output formatting for extraction records.
//!
//! JSONL output is streamed one record per line as results arrive. JSON
//! output is buffered and written on `finish()`: a lone record becomes an
//! object, anything else an array.

use crate::types::ExtractionRecord;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

/// Writes extraction records to any `Write` sink.
pub struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<ExtractionRecord>,
    records_written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// `pretty` only affects JSON format; JSONL is always one record per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            records_written: 0,
        }
    }

    /// Write (JSONL) or buffer (JSON) one record.
    pub fn write(&mut self, record: ExtractionRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()?;
                self.records_written += 1;
            }
            OutputFormat::Json => self.pending.push(record),
        }
        Ok(())
    }

    /// Flush buffered JSON output and return the number of records written.
    pub fn finish(mut self) -> io::Result<usize> {
        if self.format == OutputFormat::Json && !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            if pending.len() == 1 {
                self.write_json(&pending[0])?;
            } else {
                self.write_json(&pending)?;
            }
            self.records_written += pending.len();
        }
        self.writer.flush()?;
        Ok(self.records_written)
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }
}
