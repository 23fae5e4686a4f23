//! crates/logging-sink/src/writer.rs
//! Record sink that renders into any [`std::io::Write`] target.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use logging::{Record, RecordSink, SinkError};

use crate::format::{Format, render_json, render_text};
use crate::line_mode::LineMode;

struct State<W> {
    writer: W,
    scratch: Vec<u8>,
    text: String,
    line_mode: LineMode,
}

/// Streaming sink that renders [`Record`]s into a writer.
///
/// The sink owns the writer together with reusable scratch buffers. Each
/// record is rendered completely into the scratch buffer and then written with
/// a single `write_all`, so concurrent records never interleave.
///
/// # Examples
///
/// ```
/// use logging::{Level, Record, RecordSink};
/// use logging_sink::{LineMode, WriterSink};
///
/// let sink = WriterSink::with_line_mode(Vec::new(), LineMode::WithoutNewline);
/// sink.write(&Record::new(Level::INFO, "ready"))?;
/// assert_eq!(sink.into_inner(), b"INFO  ready".to_vec());
/// # Ok::<(), logging::SinkError>(())
/// ```
pub struct WriterSink<W> {
    state: Mutex<State<W>>,
    format: Format,
}

impl<W> WriterSink<W> {
    /// Creates a text sink that terminates each record with a newline.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::with_parts(writer, Format::Text, LineMode::WithNewline)
    }

    /// Creates a text sink with the provided [`LineMode`].
    #[must_use]
    pub fn with_line_mode(writer: W, line_mode: LineMode) -> Self {
        Self::with_parts(writer, Format::Text, line_mode)
    }

    /// Creates a JSON-lines sink.
    #[must_use]
    pub fn json(writer: W) -> Self {
        Self::with_parts(writer, Format::Json, LineMode::WithNewline)
    }

    /// Creates a sink from explicit parts.
    #[must_use]
    pub fn with_parts(writer: W, format: Format, line_mode: LineMode) -> Self {
        Self {
            state: Mutex::new(State {
                writer,
                scratch: Vec::with_capacity(256),
                text: String::with_capacity(256),
                line_mode,
            }),
            format,
        }
    }

    /// The output encoding.
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Returns the current [`LineMode`].
    pub fn line_mode(&self) -> LineMode {
        self.lock().line_mode
    }

    /// Updates the [`LineMode`] used for subsequent writes.
    pub fn set_line_mode(&self, line_mode: LineMode) {
        self.lock().line_mode = line_mode;
    }

    /// Temporarily overrides the [`LineMode`] until the guard is dropped.
    pub fn scoped_line_mode(&self, line_mode: LineMode) -> LineModeGuard<'_, W> {
        let previous = std::mem::replace(&mut self.lock().line_mode, line_mode);
        LineModeGuard {
            sink: self,
            previous,
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .writer
    }

    fn lock(&self) -> MutexGuard<'_, State<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriterSink<io::Stderr> {
    /// Text sink writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl WriterSink<io::Stdout> {
    /// Text sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W> RecordSink for WriterSink<W>
where
    W: Write + Send,
{
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        let mut state = self.lock();
        let State {
            writer,
            scratch,
            text,
            line_mode,
        } = &mut *state;
        scratch.clear();
        match self.format {
            Format::Text => {
                text.clear();
                render_text(record, text);
                scratch.extend_from_slice(text.as_bytes());
            }
            Format::Json => {
                render_json(record, scratch).map_err(|error| SinkError::Encode(error.to_string()))?;
            }
        }
        line_mode.terminate(scratch);
        writer.write_all(scratch)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.lock().writer.flush()?;
        Ok(())
    }
}

impl<W> fmt::Debug for WriterSink<W>
where
    W: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("WriterSink")
            .field("writer", &state.writer)
            .field("format", &self.format)
            .field("line_mode", &state.line_mode)
            .finish()
    }
}

/// RAII guard that restores a [`WriterSink`]'s previous [`LineMode`] on drop.
///
/// Created by [`WriterSink::scoped_line_mode`]. The guard dereferences to the
/// sink so writes can go through it directly.
#[must_use = "dropping the guard immediately restores the previous line mode"]
pub struct LineModeGuard<'a, W> {
    sink: &'a WriterSink<W>,
    previous: LineMode,
}

impl<W> LineModeGuard<'_, W> {
    /// Returns the [`LineMode`] that will be restored when the guard is dropped.
    pub const fn previous_line_mode(&self) -> LineMode {
        self.previous
    }
}

impl<W> Drop for LineModeGuard<'_, W> {
    fn drop(&mut self) {
        self.sink.set_line_mode(self.previous);
    }
}

impl<W> std::ops::Deref for LineModeGuard<'_, W> {
    type Target = WriterSink<W>;

    fn deref(&self) -> &Self::Target {
        self.sink
    }
}
