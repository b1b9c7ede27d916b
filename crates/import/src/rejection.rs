use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use momo_core::UnprocessedEntry;

/// Append-only sink for entries that need manual triage.
///
/// Each line is `<time>\t<reason>\t<raw attributes as JSON>`.
pub struct RejectionLog<W: Write> {
    writer: W,
    written: usize,
}

impl RejectionLog<File> {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RejectionLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn record(&mut self, entry: &UnprocessedEntry) -> io::Result<()> {
        let raw = serde_json::to_string(&entry.raw)?;
        let reason = entry.reason.to_string().replace(['\t', '\n', '\r'], " ");
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            reason,
            raw
        )?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of lines written by this handle.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
