//! Append-only log file sink.

use super::LogSink;
use crate::error::SinkResult;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Opens, appends and closes the log file for every report.
///
/// Each line goes out in a single `write_all` on an `O_APPEND` handle, so
/// independent processes can share one log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendLog;

impl LogSink for AppendLog {
    fn append_line(&self, path: &Path, text: &str) -> SinkResult<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(path)?;
        if text.ends_with('\n') {
            file.write_all(text.as_bytes())?;
        } else {
            file.write_all(format!("{text}\n").as_bytes())?;
        }
        Ok(())
    }
}
