#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! src/lib.rs
//!
//! # Overview
//!
//! `sitelog` is the process-facing entry point of the logging workspace. It
//! re-exports the [`logging`] core and the [`logging_sink`] writers, and owns
//! the process-wide state that applications configure once at start-up:
//!
//! - one shared [`VerbosityFilter`], reachable through [`filter`],
//! - the global internal-package registry, extended with
//!   [`register_internal_packages`],
//! - a default [`Logger`] returned by [`root`] and replaced with
//!   [`set_default`].
//!
//! Until [`init`] or [`init_from_env`] runs, the default logger writes text
//! records to standard error at the `INFO` threshold.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sitelog::{Level, Logger, MemorySink};
//!
//! sitelog::set_verbosity(Level::WARN);
//! sitelog::set_file_verbosity("server.rs=-4");
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder()
//!     .shared_sink(sink.clone())
//!     .filter(Arc::clone(sitelog::filter()))
//!     .build();
//! logger.info("below the WARN threshold");
//! logger.warn("written");
//! assert_eq!(sink.messages(), ["written"]);
//! # sitelog::reset();
//! ```

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

pub use logging::{
    CallerResolver, ConfigError, DEFAULT_INTERNAL_PACKAGES, DiscardSink, Field, Frame, FrameClass,
    FrameRule, InternalPackages, Level, LevelParseError, LogConfig, Logger, LoggerBuilder,
    MAX_CALLER_DEPTH, MemorySink, Outcome, PrefixSet, Record, RecordSink, ResolveMode, SinkError,
    Value, Verbosity, VerbosityFilter, VmoduleError, VmoduleTable, classify, first_external,
    is_internal, log_at, log_crit, log_debug, log_error, log_info, log_trace, log_warn,
    resolve_caller,
};
#[cfg(feature = "bridge")]
pub use logging::{VerbosityLayer, init_tracing, init_tracing_with};
pub use logging_sink::{Format, LineMode, LineModeGuard, WriterSink};
pub use {logging, logging_sink};

/// Failure while initializing process-wide logging.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A global `tracing` subscriber was already installed.
    #[cfg(feature = "bridge")]
    #[error("failed to install the tracing bridge: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}

static FILTER: LazyLock<Arc<VerbosityFilter>> =
    LazyLock::new(|| Arc::new(VerbosityFilter::default()));

static DEFAULT: LazyLock<ArcSwap<Logger>> =
    LazyLock::new(|| ArcSwap::from_pointee(stderr_logger(&LogConfig::default())));

fn stderr_logger(config: &LogConfig) -> Logger {
    config
        .logger_builder()
        .filter(Arc::clone(filter()))
        .packages(Arc::clone(logging::registry::global()))
        .sink(WriterSink::stderr())
        .build()
}

/// The process-wide filter shared by the default logger.
pub fn filter() -> &'static Arc<VerbosityFilter> {
    &FILTER
}

/// Returns a handle to the current default logger.
pub fn root() -> Logger {
    Logger::clone(&DEFAULT.load())
}

/// Replaces the default logger returned by [`root`].
pub fn set_default(logger: Logger) {
    DEFAULT.store(Arc::new(logger));
}

/// Registers package prefixes whose frames are never reported as callers.
///
/// Returns how many prefixes were new.
pub fn register_internal_packages<I, S>(prefixes: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    logging::register_internal_packages(prefixes)
}

/// Sets the severity threshold and default verbosity of the process filter.
pub fn set_verbosity(level: Level) {
    filter().set_verbosity(level);
}

/// Merges `pattern=level` overrides into the process filter.
///
/// Malformed entries are skipped. Returns how many entries were applied.
pub fn set_file_verbosity(spec: &str) -> usize {
    filter().set_file_verbosity(spec)
}

/// Restores the process filter to `INFO` with no per-file overrides.
pub fn reset() {
    filter().set(Verbosity::default());
    filter().reset_file_verbosity();
}

/// Applies `config` to the process state and installs a stderr logger.
///
/// With the `bridge` feature the logger is also installed as the global
/// `tracing` subscriber, which fails if another subscriber is already set.
/// The process filter and default logger are updated even then.
pub fn init(config: &LogConfig) -> Result<Logger, InitError> {
    config.apply(filter(), logging::registry::global());
    let logger = stderr_logger(config);
    set_default(logger.clone());
    #[cfg(feature = "bridge")]
    init_tracing(logger.clone())?;
    tracing::debug!(
        target: "sitelog",
        bridge = cfg!(feature = "bridge"),
        "process logging initialized"
    );
    Ok(logger)
}

/// Reads the `SITELOG_*` environment variables and calls [`init`].
pub fn init_from_env() -> Result<Logger, InitError> {
    let config = LogConfig::from_env()?;
    init(&config)
}
