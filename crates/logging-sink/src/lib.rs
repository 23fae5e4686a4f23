#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` provides [`RecordSink`](logging::RecordSink)
//! implementations that render admitted [`Record`](logging::Record)s into
//! arbitrary writers, as human-readable text or as JSON lines.
//!
//! # Design
//!
//! [`WriterSink`] wraps an [`std::io::Write`] implementor behind a mutex. Each
//! sink keeps scratch buffers that are reused for every record, so steady-state
//! logging does not allocate per line. Callers control whether records end
//! with a newline by selecting a [`LineMode`].
//!
//! # Invariants
//!
//! - A record is rendered completely before any byte reaches the writer and is
//!   written with one `write_all` call; concurrent records never interleave.
//! - `LineMode::WithNewline` is the default, one record per line.
//! - Fields never overwrite the `ts`, `level`, `msg`, `logger`, or `caller`
//!   keys of the JSON encoding.
//!
//! # Errors
//!
//! Writer failures surface as [`SinkError::Io`](logging::SinkError::Io) and
//! JSON encoding failures as [`SinkError::Encode`](logging::SinkError::Encode).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use logging::{Level, Logger};
//! use logging_sink::WriterSink;
//!
//! let sink = Arc::new(WriterSink::new(Vec::new()));
//! let logger = Logger::builder().shared_sink(sink.clone()).caller(false).build();
//!
//! logger.warn("some files vanished");
//! logger.log_at(Level::ERROR, "partial transfer", vec![]);
//!
//! drop(logger);
//! let sink = Arc::into_inner(sink).expect("sole owner");
//! let output = String::from_utf8(sink.into_inner()).unwrap();
//! assert_eq!(output, "WARN  some files vanished\nERROR partial transfer\n");
//! ```

mod format;
mod line_mode;
mod writer;

pub use format::{Format, render_json, render_text};
pub use line_mode::LineMode;
pub use writer::{LineModeGuard, WriterSink};
