#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is the core of a structured-logging facade. It answers two
//! questions for every log call: *who called?* and *should this be written?*
//!
//! - **Caller attribution.** Applications wrap loggers in adapters, and those
//!   adapters would otherwise be reported as the call site. The
//!   [`CallerResolver`] walks the stack and returns the first frame that is
//!   neither runtime code, this library, nor a package registered through
//!   [`register_internal_packages`].
//! - **Verbosity filtering.** The [`VerbosityFilter`] combines a global
//!   severity threshold with per-file verbosity overrides in the style of
//!   glog's `-vmodule`. A cheap pre-check runs before any stack walk; the
//!   precise check runs once the caller's file is known.
//!
//! # Design
//!
//! The registry and the vmodule table are immutable snapshots published with
//! [`arc_swap`]; readers never block. Severity and default verbosity travel as
//! one packed [`Verbosity`] value so a reader never observes half an update.
//! Frame classification is an ordered table of [`FrameRule`]s that can each be
//! exercised on their own.
//!
//! Records that pass both phases are handed to a [`RecordSink`]. The
//! `logging-sink` crate renders them to writers; [`MemorySink`] captures them
//! for tests.
//!
//! # Invariants
//!
//! - A disabled record never evaluates its message or fields.
//! - A frame matched by a registered prefix is never reported as the caller.
//! - At most [`MAX_CALLER_DEPTH`] frames are inspected per record; past that
//!   the record is emitted without caller metadata.
//! - Registering a prefix twice does not grow the registry.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use logging::{Level, Logger, MemorySink, log_debug};
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder().shared_sink(sink.clone()).build();
//!
//! logger.filter().set_verbosity(Level::WARN);
//! logger.filter().set_file_verbosity("server.rs=-4");
//!
//! logger.info("suppressed by the WARN threshold");
//! log_debug!(logger, "suppressed unless emitted from server.rs"; attempt = 1);
//! logger.error("always written");
//!
//! assert_eq!(sink.messages(), ["always written"]);
//! ```
//!
//! # See also
//!
//! - `logging-sink` for text and JSON writer sinks.
//! - `VerbosityLayer` (feature `bridge`) for routing `tracing` events.

pub mod caller;
pub mod classifier;
pub mod config;
pub mod filter;
pub mod frame;
pub mod level;
pub mod logger;
mod macros;
pub mod record;
pub mod registry;
pub mod sink;
#[cfg(feature = "bridge")]
pub mod tracing_bridge;

pub use caller::{CallerResolver, MAX_CALLER_DEPTH, capture_frames, first_external, resolve_caller};
pub use classifier::{FrameClass, FrameRule, ResolveMode, classify, is_internal};
pub use config::{ConfigError, LogConfig};
pub use filter::{Verbosity, VerbosityFilter, VmoduleError, VmoduleTable};
pub use frame::Frame;
pub use level::{Level, LevelParseError};
pub use logger::{Logger, LoggerBuilder, Outcome};
pub use record::{Field, Record, Value};
pub use registry::{DEFAULT_INTERNAL_PACKAGES, InternalPackages, PrefixSet, register_internal_packages};
pub use sink::{DiscardSink, MemorySink, RecordSink, SinkError};
#[cfg(feature = "bridge")]
pub use tracing_bridge::{VerbosityLayer, init_tracing, init_tracing_with};
