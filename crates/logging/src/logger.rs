//! crates/logging/src/logger.rs
//! The logging entry point.
//!
//! Every call runs the same pipeline:
//!
//! 1. [`VerbosityFilter::might_emit`] rejects records no override could rescue.
//! 2. When no vmodule override is installed the final decision does not depend
//!    on the caller, so disabled records are rejected before any unwinding.
//! 3. The [`CallerResolver`] attributes the record.
//! 4. [`VerbosityFilter::should_emit`] decides with the caller's file.
//! 5. Only then is the message built and the [`Record`] handed to the sink.
//!
//! Sink failures never surface from the logging methods; they are counted and
//! exposed through [`Logger::write_errors`]. [`Logger::try_log_at`] returns
//! them for hosts that want to react.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::caller::CallerResolver;
use crate::classifier::ResolveMode;
use crate::filter::VerbosityFilter;
use crate::frame::Frame;
use crate::level::Level;
use crate::record::{Field, Record};
use crate::registry::{self, InternalPackages};
use crate::sink::{DiscardSink, RecordSink, SinkError};

/// What happened to a record passed to [`Logger::try_log_at`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The record reached the sink.
    Emitted,
    /// The filter rejected the record.
    Filtered,
}

struct Shared {
    sink: Arc<dyn RecordSink>,
    filter: Arc<VerbosityFilter>,
    resolver: CallerResolver,
    caller: bool,
    write_errors: AtomicU64,
}

/// Structured logger with caller attribution and verbosity filtering.
///
/// Cloning is cheap. Children created with [`with`](Self::with) or
/// [`named`](Self::named) share the sink, the filter, and the error counter
/// of their parent.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    name: Option<Arc<str>>,
    context: Arc<[Field]>,
}

impl Logger {
    /// Starts building a logger.
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Creates a logger writing to `sink` with default settings.
    pub fn new(sink: impl RecordSink + 'static) -> Self {
        Self::builder().sink(sink).build()
    }

    /// The filter consulted by this logger.
    pub fn filter(&self) -> &Arc<VerbosityFilter> {
        &self.shared.filter
    }

    /// The resolver used to attribute records.
    pub fn resolver(&self) -> &CallerResolver {
        &self.shared.resolver
    }

    /// The logger's name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Context fields attached to every record.
    pub fn context(&self) -> &[Field] {
        &self.context
    }

    /// Reports whether records carry caller metadata.
    pub fn caller_enabled(&self) -> bool {
        self.shared.caller
    }

    /// Cheap pre-check used by the logging macros.
    #[inline]
    pub fn might_emit(&self, level: Level) -> bool {
        self.shared.filter.might_emit(level)
    }

    /// Number of records the sink failed to accept.
    pub fn write_errors(&self) -> u64 {
        self.shared.write_errors.load(Ordering::Relaxed)
    }

    /// Logs `message` with `fields` at `level`.
    pub fn log_at(&self, level: Level, message: impl Into<String>, fields: Vec<Field>) {
        let _ = self.dispatch(level, move || (message.into(), fields));
    }

    /// Logs a lazily built message; `build` runs only for admitted records.
    pub fn log_with<F>(&self, level: Level, build: F)
    where
        F: FnOnce() -> (String, Vec<Field>),
    {
        let _ = self.dispatch(level, build);
    }

    /// Logs like [`log_at`](Self::log_at) and reports the outcome.
    pub fn try_log_at(
        &self,
        level: Level,
        message: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Outcome, SinkError> {
        self.dispatch(level, move || (message.into(), fields))
    }

    /// Logs at [`Level::TRACE`].
    pub fn trace(&self, message: impl Into<String>) {
        self.log_at(Level::TRACE, message, Vec::new());
    }

    /// Logs at [`Level::DEBUG`].
    pub fn debug(&self, message: impl Into<String>) {
        self.log_at(Level::DEBUG, message, Vec::new());
    }

    /// Logs at [`Level::INFO`].
    pub fn info(&self, message: impl Into<String>) {
        self.log_at(Level::INFO, message, Vec::new());
    }

    /// Logs at [`Level::WARN`].
    pub fn warn(&self, message: impl Into<String>) {
        self.log_at(Level::WARN, message, Vec::new());
    }

    /// Logs at [`Level::ERROR`].
    pub fn error(&self, message: impl Into<String>) {
        self.log_at(Level::ERROR, message, Vec::new());
    }

    /// Logs at [`Level::CRIT`].
    pub fn crit(&self, message: impl Into<String>) {
        self.log_at(Level::CRIT, message, Vec::new());
    }

    /// Returns a child logger that adds `fields` to every record.
    #[must_use]
    pub fn with<I>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        let context: Vec<Field> = self.context.iter().cloned().chain(fields).collect();
        Self {
            shared: Arc::clone(&self.shared),
            name: self.name.clone(),
            context: context.into(),
        }
    }

    /// Returns a child logger with a different name.
    #[must_use]
    pub fn named(&self, name: impl AsRef<str>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            name: Some(Arc::from(name.as_ref())),
            context: Arc::clone(&self.context),
        }
    }

    /// Flushes the sink.
    pub fn flush(&self) -> Result<(), SinkError> {
        self.shared.sink.flush()
    }

    /// Hands an already attributed record to the sink, counting failures.
    pub(crate) fn submit(&self, record: &Record) -> Result<(), SinkError> {
        self.shared.sink.write(record).inspect_err(|_| {
            self.shared.write_errors.fetch_add(1, Ordering::Relaxed);
        })
    }

    /// Runs the filter and attribution phases, returning the caller when the
    /// record is admitted.
    fn admit(&self, level: Level) -> Option<Option<Frame>> {
        let filter = &self.shared.filter;
        if !filter.might_emit(level) {
            return None;
        }
        if !filter.has_file_overrides() && !filter.should_emit(level, None) {
            return None;
        }
        let caller = if self.needs_call_site(level) {
            self.shared.resolver.resolve(0)
        } else {
            None
        };
        let file = caller.as_ref().map(|frame| frame.file.as_str());
        if !filter.should_emit(level, file) {
            return None;
        }
        Some(caller.filter(|_| self.shared.caller))
    }

    /// Reports whether deciding or recording a record at `level` needs the
    /// call site: caller metadata is on, or a file override may apply.
    pub(crate) fn needs_call_site(&self, level: Level) -> bool {
        let filter = &self.shared.filter;
        self.shared.caller
            || (level < filter.verbosity().min_severity && filter.has_file_overrides())
    }

    fn dispatch<F>(&self, level: Level, build: F) -> Result<Outcome, SinkError>
    where
        F: FnOnce() -> (String, Vec<Field>),
    {
        let Some(caller) = self.admit(level) else {
            return Ok(Outcome::Filtered);
        };
        let (message, fields) = build();
        let mut record = Record::new(level, message);
        record.fields = self.context.iter().cloned().chain(fields).collect();
        record.caller = caller;
        record.logger = self.name.clone();
        self.submit(&record)?;
        Ok(Outcome::Emitted)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("filter", &self.shared.filter)
            .field("mode", &self.shared.resolver.mode())
            .field("caller", &self.shared.caller)
            .finish_non_exhaustive()
    }
}

/// Configures a [`Logger`].
pub struct LoggerBuilder {
    sink: Option<Arc<dyn RecordSink>>,
    filter: Option<Arc<VerbosityFilter>>,
    packages: Option<Arc<InternalPackages>>,
    mode: ResolveMode,
    caller: bool,
    name: Option<String>,
    fields: Vec<Field>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            sink: None,
            filter: None,
            packages: None,
            mode: ResolveMode::Standard,
            caller: true,
            name: None,
            fields: Vec::new(),
        }
    }
}

impl LoggerBuilder {
    /// Sets the destination. Defaults to [`DiscardSink`].
    #[must_use]
    pub fn sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets a shared destination.
    #[must_use]
    pub fn shared_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Shares an existing filter. Defaults to a fresh filter.
    #[must_use]
    pub fn filter(mut self, filter: Arc<VerbosityFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Uses an explicit registry. Defaults to the process-wide one.
    #[must_use]
    pub fn packages(mut self, packages: Arc<InternalPackages>) -> Self {
        self.packages = Some(packages);
        self
    }

    /// Sets the caller resolution mode.
    #[must_use]
    pub fn mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables or disables caller attribution.
    #[must_use]
    pub fn caller(mut self, enabled: bool) -> Self {
        self.caller = enabled;
        self
    }

    /// Names the logger.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a context field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds the logger.
    pub fn build(self) -> Logger {
        let packages = self
            .packages
            .unwrap_or_else(|| Arc::clone(registry::global()));
        Logger {
            shared: Arc::new(Shared {
                sink: self.sink.unwrap_or_else(|| Arc::new(DiscardSink)),
                filter: self.filter.unwrap_or_default(),
                resolver: CallerResolver::new(packages, self.mode),
                caller: self.caller,
                write_errors: AtomicU64::new(0),
            }),
            name: self.name.map(Arc::from),
            context: self.fields.into(),
        }
    }
}
