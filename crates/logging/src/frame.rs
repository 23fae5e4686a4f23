//! crates/logging/src/frame.rs
//! A single symbolized stack frame.

use std::path::Path;

/// One symbolized stack entry.
///
/// Frames are produced by the caller resolver while walking the stack and are
/// never mutated afterwards. An empty `function` or `file` means the unwinder
/// could not symbolize that part of the entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Demangled function path without the trailing hash, e.g. `my_app::run`.
    pub function: String,
    /// Source file path as recorded in the debug info.
    pub file: String,
    /// 1-based source line, or 0 when unknown.
    pub line: u32,
    /// Instruction address of the entry.
    pub pc: usize,
}

impl Frame {
    /// Creates a frame from its parts.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
            pc: 0,
        }
    }

    /// Sets the instruction address.
    pub fn with_pc(mut self, pc: usize) -> Self {
        self.pc = pc;
        self
    }

    /// Reports whether the unwinder produced no symbol information at all.
    pub fn is_unresolved(&self) -> bool {
        self.function.is_empty() && self.file.is_empty()
    }

    /// Returns the final component of [`file`](Self::file).
    pub fn basename(&self) -> &str {
        basename(&self.file)
    }
}

/// Returns the final path component of `file`, accepting either separator.
pub fn basename(file: &str) -> &str {
    let tail = file.rsplit(['/', '\\']).next().unwrap_or(file);
    if tail.is_empty() {
        Path::new(file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file)
    } else {
        tail
    }
}
