use crate::models::SequencedEntry;
use crate::utils::ExtractionError;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Write-through destination for each emitted entry. Failures are logged by
/// the caller and never retried.
pub trait RecordSink: Send + Sync {
    fn persist(&self, entry: &SequencedEntry) -> Result<(), ExtractionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn persist(&self, _entry: &SequencedEntry) -> Result<(), ExtractionError> {
        Ok(())
    }
}

/// Appends one JSON object per line, flushed after every entry.
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        Ok(JsonLinesSink {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn persist(&self, entry: &SequencedEntry) -> Result<(), ExtractionError> {
        let line = serde_json::to_string(entry)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line).map_err(|e| ExtractionError::Persistence(e.to_string()))?;
        writer.flush().map_err(|e| ExtractionError::Persistence(e.to_string()))?;
        Ok(())
    }
}
