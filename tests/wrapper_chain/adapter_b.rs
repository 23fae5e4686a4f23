//! Middle adapter: enriches records with a component field.

use sitelog::{Field, Logger};

#[inline(never)]
pub fn record(logger: &Logger, mut fields: Vec<Field>, action: &str) {
    fields.push(Field::new("component", "audit"));
    super::adapter_c::emit(logger, action, fields);
    std::hint::black_box(());
}
