//! crates/logging/src/caller.rs
//! Finds the first application frame on the current stack.
//!
//! The resolver walks the stack innermost-first and returns the first frame
//! the [classifier](crate::classifier) reports as external. The walk is
//! bounded by [`MAX_CALLER_DEPTH`] raw entries; running out of entries yields
//! `None`, and the record is emitted without caller metadata.

use std::sync::Arc;

use crate::classifier::{FrameClass, ResolveMode, classify, is_runtime_frame, is_test_source};
use crate::frame::Frame;
use crate::registry::{self, InternalPackages, PrefixSet};

/// Maximum number of stack entries examined per resolution.
pub const MAX_CALLER_DEPTH: usize = 64;

/// Captures symbolized frames above the caller of this function.
///
/// The unwinder's own frames and this function's frame are dropped, then
/// `skip` further entries. At most [`MAX_CALLER_DEPTH`] raw entries are
/// captured; inlined functions of one entry are expanded innermost-first.
#[inline(never)]
pub fn capture_frames(skip: usize) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(16);
    let mut in_unwinder = true;
    let mut to_skip = skip + 1;
    let mut captured = 0usize;

    backtrace::trace(|entry| {
        let pc = entry.ip() as usize;
        let mut symbols: Vec<Frame> = Vec::with_capacity(1);
        backtrace::resolve_frame(entry, |symbol| {
            let function = symbol
                .name()
                .map(|name| format!("{name:#}"))
                .unwrap_or_default();
            let file = symbol
                .filename()
                .map(|path| path.to_string_lossy().into_owned())
                .unwrap_or_default();
            symbols.push(Frame::new(function, file, symbol.lineno().unwrap_or(0)).with_pc(pc));
        });
        if symbols.is_empty() {
            symbols.push(Frame::default().with_pc(pc));
        }

        if in_unwinder {
            if symbols.iter().all(is_runtime_frame) {
                return true;
            }
            in_unwinder = false;
        }
        if to_skip > 0 {
            to_skip -= 1;
            return true;
        }

        frames.append(&mut symbols);
        captured += 1;
        captured < MAX_CALLER_DEPTH
    });

    frames
}

/// Returns the first frame of `frames` that may be reported as the caller.
///
/// At most [`MAX_CALLER_DEPTH`] frames are examined. In
/// [`ResolveMode::TestAware`] a frame from test code is accepted even when a
/// registry rule matches it, and once a harness frame has been passed the next
/// non-runtime frame is accepted.
pub fn first_external<I>(frames: I, prefixes: &PrefixSet, mode: ResolveMode) -> Option<Frame>
where
    I: IntoIterator<Item = Frame>,
{
    let mut past_harness = false;
    for frame in frames.into_iter().take(MAX_CALLER_DEPTH) {
        match classify(&frame, prefixes, mode) {
            FrameClass::External => return Some(frame),
            FrameClass::TestHarness => past_harness = true,
            FrameClass::Runtime => {}
            FrameClass::Internal(_) => {
                if mode.is_test_aware() && (past_harness || is_test_source(&frame)) {
                    return Some(frame);
                }
            }
        }
    }
    None
}

/// Resolves call sites against a registry.
#[derive(Clone, Debug)]
pub struct CallerResolver {
    packages: Arc<InternalPackages>,
    mode: ResolveMode,
}

impl CallerResolver {
    /// Creates a resolver over `packages`.
    pub fn new(packages: Arc<InternalPackages>, mode: ResolveMode) -> Self {
        Self { packages, mode }
    }

    /// Creates a resolver over the process-wide registry.
    pub fn global(mode: ResolveMode) -> Self {
        Self::new(Arc::clone(registry::global()), mode)
    }

    /// The registry consulted on every resolution.
    pub fn packages(&self) -> &Arc<InternalPackages> {
        &self.packages
    }

    /// The resolution mode.
    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Returns the same resolver with a different mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolves the first external frame above the caller of this method,
    /// after dropping `skip` additional entries.
    #[inline(never)]
    pub fn resolve(&self, skip: usize) -> Option<Frame> {
        let frames = capture_frames(skip + 1);
        let prefixes = self.packages.snapshot();
        first_external(frames, &prefixes, self.mode)
    }
}

impl Default for CallerResolver {
    fn default() -> Self {
        Self::global(ResolveMode::Standard)
    }
}

/// Resolves the caller against the process-wide registry.
#[inline(never)]
pub fn resolve_caller(skip: usize) -> Option<Frame> {
    let frames = capture_frames(skip + 1);
    first_external(frames, &registry::global().snapshot(), ResolveMode::Standard)
}
