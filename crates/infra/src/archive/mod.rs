//! JSON-lines archive codec
//!
//! One serialized event per line. The codec only promises the sequential
//! read/append contract the core relies on; it never rewrites archives in
//! place.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use timelens_domain::{IdeEvent, Result, TimelensError};
use timelens_core::ports::{EventSink, EventSource};

use crate::layout::ensure_parent;

/// Lazy line-by-line reader over one archive file.
pub struct JsonlEventSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl JsonlEventSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| TimelensError::NotFound(format!("archive {}: {e}", path.display())))?;
        Ok(Self { path: path.to_path_buf(), lines: BufReader::new(file).lines() })
    }
}

impl EventSource for JsonlEventSource {
    fn next_event(&mut self) -> Result<Option<IdeEvent>> {
        for line in self.lines.by_ref() {
            let line = line
                .map_err(|e| TimelensError::Io(format!("read {}: {e}", self.path.display())))?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|e| {
                TimelensError::Archive(format!("malformed event in {}: {e}", self.path.display()))
            })?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

/// Buffered append writer creating a fresh archive file.
pub struct JsonlEventSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlEventSink {
    /// Create (truncating) the target archive, creating parent
    /// directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path)
            .map_err(|e| TimelensError::Io(format!("create {}: {e}", path.display())))?;
        Ok(Self { path: path.to_path_buf(), writer: BufWriter::new(file) })
    }
}

impl EventSink for JsonlEventSink {
    fn append(&mut self, event: &IdeEvent) -> Result<()> {
        let line = serde_json::to_string(event).map_err(|e| {
            TimelensError::Archive(format!("serialize event for {}: {e}", self.path.display()))
        })?;
        writeln!(self.writer, "{line}")
            .map_err(|e| TimelensError::Io(format!("write {}: {e}", self.path.display())))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| TimelensError::Io(format!("flush {}: {e}", self.path.display())))
    }
}
