//! RFC 4180 CSV output for labeled messages.
//!
//! Columns: sent timestamp, id, content, label. No header row. Each row is
//! flushed as soon as it is written so an aborted run keeps what it labeled.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::LabeledRecord;

pub struct CsvSink<W: Write> {
    out: W,
    rows: usize,
}

impl CsvSink<BufWriter<File>> {
    /// Create or truncate `path`.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    pub fn write_row(&mut self, labeled: &LabeledRecord) -> std::io::Result<()> {
        let record = &labeled.record;
        write!(
            self.out,
            "{},{},{},{}\r\n",
            csv_escape(&record.sent),
            csv_escape(&record.id),
            csv_escape(&record.content),
            if labeled.label { "True" } else { "False" },
        )?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

// Quote when the field holds a separator, quote or line break; double embedded quotes.
fn csv_escape(value: &str) -> std::borrow::Cow<'_, str> {
    let needs_quotes = value.contains([',', '"', '\n', '\r']);
    if !needs_quotes {
        return value.into();
    }
    format!("\"{}\"", value.replace('"', "\"\"")).into()
}
