//! crates/logging/src/macros.rs
//! Logging macros that defer formatting until a record is admitted.
//!
//! Arguments after the format string are evaluated only when the record
//! passes the filter. Fields follow a `;` as `key = value` pairs.

/// Log at an explicit level.
///
/// # Example
/// ```ignore
/// log_at!(logger, Level::new(-2), "retrying {}", attempt; peer = addr);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(; $($key:ident = $value:expr),+)?) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::Level = $level;
        if logger.might_emit(level) {
            logger.log_with(level, || {
                (
                    ::std::format!($fmt $(, $arg)*),
                    ::std::vec![$($($crate::Field::new(::std::stringify!($key), $value)),+)?],
                )
            });
        }
    }};
}

/// Log at [`Level::TRACE`](crate::Level::TRACE).
///
/// # Example
/// ```ignore
/// log_trace!(logger, "frame {} decoded", index);
/// ```
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::TRACE, $($rest)+)
    };
}

/// Log at [`Level::DEBUG`](crate::Level::DEBUG).
///
/// # Example
/// ```ignore
/// log_debug!(logger, "cache miss"; key = name);
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::DEBUG, $($rest)+)
    };
}

/// Log at [`Level::INFO`](crate::Level::INFO).
///
/// # Example
/// ```ignore
/// log_info!(logger, "listening"; port = 8080);
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::INFO, $($rest)+)
    };
}

/// Log at [`Level::WARN`](crate::Level::WARN).
///
/// # Example
/// ```ignore
/// log_warn!(logger, "slow response: {}ms", elapsed);
/// ```
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::WARN, $($rest)+)
    };
}

/// Log at [`Level::ERROR`](crate::Level::ERROR).
///
/// # Example
/// ```ignore
/// log_error!(logger, "request failed"; status = 502);
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::ERROR, $($rest)+)
    };
}

/// Log at [`Level::CRIT`](crate::Level::CRIT).
///
/// # Example
/// ```ignore
/// log_crit!(logger, "state corrupted");
/// ```
#[macro_export]
macro_rules! log_crit {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::CRIT, $($rest)+)
    };
}
