//! CSV persistence for accepted profile samples.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::profile::ProfileSink;

/// Timestamp layout used in the log, second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes one row per accepted tick. The file is truncated at run start and
/// every row is flushed as soon as it is written.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Create (truncating) the log file and write the header row.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> io::Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(["Timestamp", "Current Temp", "Set Temp"])
            .map_err(io::Error::other)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Recover the underlying writer, flushing any buffered rows.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
    }
}

impl<W: Write> ProfileSink for CsvSink<W> {
    fn record(&mut self, at: DateTime<Local>, current_temp: f64, set_temp: f64) -> io::Result<()> {
        self.writer
            .write_record([
                at.format(TIMESTAMP_FORMAT).to_string(),
                format!("{current_temp:.2}"),
                format!("{set_temp:.2}"),
            ])
            .map_err(io::Error::other)?;
        self.writer.flush()
    }
}
