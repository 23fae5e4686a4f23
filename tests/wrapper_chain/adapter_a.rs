//! Outermost adapter: the layer applications call.

use sitelog::{Field, Logger};

#[inline(never)]
pub fn audit(logger: &Logger, user: &str, action: &str) {
    super::adapter_b::record(logger, vec![Field::new("user", user)], action);
    std::hint::black_box(());
}

#[inline(never)]
pub fn nested(logger: &Logger, depth: usize) {
    if depth == 0 {
        super::adapter_b::record(logger, Vec::new(), "deep");
    } else {
        nested(logger, depth - 1);
    }
    std::hint::black_box(depth);
}
