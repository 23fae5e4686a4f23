//! Innermost adapter: the only layer that talks to the logger.

use sitelog::{Level, Logger, log_at};

#[inline(never)]
pub fn emit(logger: &Logger, action: &str, fields: Vec<sitelog::Field>) {
    if fields.is_empty() {
        log_at!(logger, Level::WARN, "{action}");
    } else {
        logger.log_at(Level::WARN, action, fields);
    }
    std::hint::black_box(());
}
