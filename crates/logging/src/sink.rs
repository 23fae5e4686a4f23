//! crates/logging/src/sink.rs
//! The outbound boundary: where admitted records go.
//!
//! A [`RecordSink`] receives records that passed both filter phases. Sinks
//! own formatting and I/O. The logger never propagates sink failures from its
//! hot path; it counts them instead (see [`Logger::write_errors`](crate::Logger::write_errors)).

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::record::Record;

/// Failure reported by a sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing to the underlying writer failed.
    #[error("failed to write log record: {0}")]
    Io(#[from] io::Error),
    /// Encoding the record failed.
    #[error("failed to encode log record: {0}")]
    Encode(String),
    /// The sink was closed or poisoned.
    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for admitted records.
pub trait RecordSink: Send + Sync {
    /// Accepts one record.
    fn write(&self, record: &Record) -> Result<(), SinkError>;

    /// Flushes buffered output.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink;

impl RecordSink for DiscardSink {
    fn write(&self, _record: &Record) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the captured records.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Removes and returns the captured records.
    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of captured records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Reports whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Captured messages in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordSink for MemorySink {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        self.lock().push(record.clone());
        Ok(())
    }
}

impl<S> RecordSink for std::sync::Arc<S>
where
    S: RecordSink + ?Sized,
{
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}
