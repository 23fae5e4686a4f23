//! crates/logging-sink/src/line_mode.rs
//! Record terminator policy.

/// How a [`WriterSink`](crate::WriterSink) ends each rendered record.
///
/// Records are newline-delimited by default. Hosts that frame records
/// themselves, or that print a record as the tail of a line they already
/// started, switch to [`LineMode::WithoutNewline`], usually for a scope via
/// [`WriterSink::scoped_line_mode`](crate::WriterSink::scoped_line_mode).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineMode {
    /// One record per line.
    #[default]
    WithNewline,
    /// Records are written back to back.
    WithoutNewline,
}

impl LineMode {
    /// Reports whether records end with `\n`.
    #[must_use]
    pub const fn append_newline(self) -> bool {
        matches!(self, Self::WithNewline)
    }

    /// Appends this mode's terminator to a rendered record.
    ///
    /// ```
    /// use logging_sink::LineMode;
    ///
    /// let mut line = b"INFO  ready".to_vec();
    /// LineMode::WithNewline.terminate(&mut line);
    /// assert_eq!(line, b"INFO  ready\n");
    /// ```
    pub fn terminate(self, rendered: &mut Vec<u8>) {
        if self.append_newline() && rendered.last() != Some(&b'\n') {
            rendered.push(b'\n');
        }
    }
}
