//! crates/logging/src/tracing_bridge.rs
//! Bridge between the tracing crate and the verbosity filter.
//!
//! [`VerbosityLayer`] lets code instrumented with standard `tracing` macros
//! share a [`Logger`]'s filter, attribution, and sink.
//!
//! # Architecture
//!
//! - `Layer::enabled` runs the cheap severity pre-check, so disabled callsites
//!   are skipped before their fields are evaluated.
//! - Events are attributed from their callsite metadata. When the callsite
//!   itself lies inside a registered internal package, the stack is walked
//!   instead, exactly as for direct logger calls.
//! - The precise per-file check runs with the attributed file, and admitted
//!   events become [`Record`]s handed to the logger's sink.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{Logger, MemorySink, init_tracing};
//!
//! let logger = Logger::new(MemorySink::new());
//! logger.filter().set_file_verbosity("server.rs=-4");
//! init_tracing(logger)?;
//!
//! tracing::debug!(peer = "10.0.0.1", "handshake complete");
//! ```

use std::fmt;
use std::iter;

use tracing::field::{Field as TracingField, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::caller::first_external;
use crate::frame::Frame;
use crate::level::Level;
use crate::logger::Logger;
use crate::record::{Field, Record, Value};

/// A tracing layer that routes events through a [`Logger`].
#[derive(Clone, Debug)]
pub struct VerbosityLayer {
    logger: Logger,
}

impl VerbosityLayer {
    /// Creates a layer that filters and emits through `logger`.
    #[must_use]
    pub const fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// The logger events are routed to.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Map a tracing level onto the signed level scale.
    const fn level_from_tracing(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::TRACE => Level::TRACE,
        }
    }

    /// Frame described by the callsite metadata, if it has any location.
    fn callsite_frame(metadata: &Metadata<'_>) -> Option<Frame> {
        let file = metadata.file().unwrap_or_default();
        if file.is_empty() {
            return None;
        }
        let function = metadata.module_path().unwrap_or_else(|| metadata.target());
        Some(Frame::new(function, file, metadata.line().unwrap_or(0)))
    }

    fn attribute(&self, level: Level, metadata: &Metadata<'_>) -> Option<Frame> {
        if !self.logger.needs_call_site(level) {
            return None;
        }
        let resolver = self.logger.resolver();
        if let Some(frame) = Self::callsite_frame(metadata) {
            let prefixes = resolver.packages().snapshot();
            if let Some(frame) = first_external(iter::once(frame), &prefixes, resolver.mode()) {
                return Some(frame);
            }
        }
        resolver.resolve(0)
    }
}

impl<S> Layer<S> for VerbosityLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // Thresholds change at runtime, so interest is never cached.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        !metadata.is_event() || self.logger.might_emit(Self::level_from_tracing(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::level_from_tracing(metadata.level());
        let filter = self.logger.filter();
        if !filter.might_emit(level) {
            return;
        }
        if !filter.has_file_overrides() && !filter.should_emit(level, None) {
            return;
        }

        let caller = self.attribute(level, metadata);
        if !filter.should_emit(level, caller.as_ref().map(|frame| frame.file.as_str())) {
            return;
        }
        let caller = caller.filter(|_| self.logger.caller_enabled());

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Record::new(level, visitor.message.unwrap_or_default());
        record.fields = self
            .logger
            .context()
            .iter()
            .cloned()
            .chain(visitor.fields)
            .collect();
        record.caller = caller;
        record.logger = match self.logger.name() {
            Some(name) => Some(name.into()),
            None => Some(metadata.target().into()),
        };
        // Failures are counted by `submit`; a layer has no caller to report to.
        self.logger.submit(&record).ok();
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<Field>,
}

impl FieldVisitor {
    fn push(&mut self, field: &TracingField, value: Value) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        self.push(field, Value::Str(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::U64(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::Bool(value));
    }
}

/// Installs a global subscriber that routes tracing events through `logger`.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{Logger, init_tracing};
///
/// init_tracing(Logger::default())?;
/// tracing::info!("ready");
/// ```
pub fn init_tracing(logger: Logger) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(VerbosityLayer::new(logger))
        .try_init()
}

/// Installs a global subscriber with an extra layer in front of the bridge.
///
/// The extra layer is typically a filter such as a target allow-list.
pub fn init_tracing_with<L>(logger: Logger, layer: L) -> Result<(), TryInitError>
where
    L: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(layer)
        .with(VerbosityLayer::new(logger))
        .try_init()
}
