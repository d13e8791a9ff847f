//! Record output.
//!
//! Each record is one synchronous, flushed write of a single JSON line.
//! There is no buffering, batching or retry: a failed write is reported on
//! the diagnostics channel and dropped.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{json, Value};

use crate::observability::events::UNSERIALIZABLE;
use crate::observability::metrics;
use crate::observability::record::StructuredRecord;

/// Line-oriented record writer.
pub struct Sink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    /// Sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Write `record` as one line.
    pub fn emit(&self, record: &StructuredRecord) {
        let line = encode_line(record);

        // A panic while holding the lock must not silence the fatal record.
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush());

        match written {
            Ok(()) => metrics::record_emitted(record.severity),
            Err(e) => tracing::warn!(error = %e, severity = %record.severity, "Dropping log record"),
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// Serialize a record to a newline-terminated line. Never fails: if the
/// record cannot be encoded, a reduced record with a placeholder message is
/// written instead.
fn encode_line(record: &StructuredRecord) -> String {
    let mut line = serde_json::to_string(record).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Record is not serializable, writing placeholder");
        let fallback = json!({
            "severity": record.severity,
            "message": UNSERIALIZABLE,
            "logging.googleapis.com/operation": {
                "id": record.operation.id,
                "producer": record.operation.producer,
            },
            "timestamp": record.timestamp,
        });
        fallback.to_string()
    });
    line.push('\n');
    line
}

/// In-memory writer that can be inspected after records were emitted.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Every line parsed as JSON; lines that fail to parse become `Null`.
    pub fn records(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap_or(Value::Null))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
