//! crates/logging/src/filter.rs
//! Two-phase admission control: global severity plus per-file verbosity.
//!
//! Phase one, [`VerbosityFilter::might_emit`], needs only the level and costs a
//! single atomic load. It rejects records that no per-file override could
//! rescue. Phase two, [`VerbosityFilter::should_emit`], runs after the caller
//! has been attributed and consults the vmodule table with the basename of the
//! caller's source file.
//!
//! Severity levels (`INFO` and above) are admitted iff they reach the global
//! minimum. Verbose levels (below `INFO`) are admitted iff they are no more
//! verbose than the threshold for their source file: the vmodule override when
//! one exists, the default verbosity otherwise.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::frame::basename;
use crate::level::{Level, LevelParseError};

/// Global severity threshold and default verbosity, published together.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Verbosity {
    /// Records at or above this level are always admitted.
    pub min_severity: Level,
    /// Threshold for verbose records from files without an override.
    pub default_verbosity: Level,
}

impl Verbosity {
    /// Uses `level` for both the severity threshold and the default verbosity.
    #[must_use]
    pub const fn uniform(level: Level) -> Self {
        Self {
            min_severity: level,
            default_verbosity: level,
        }
    }

    const fn pack(self) -> u16 {
        let [severity] = self.min_severity.value().to_ne_bytes();
        let [verbosity] = self.default_verbosity.value().to_ne_bytes();
        u16::from_be_bytes([severity, verbosity])
    }

    const fn unpack(packed: u16) -> Self {
        let [severity, verbosity] = packed.to_be_bytes();
        Self {
            min_severity: Level::new(i8::from_ne_bytes([severity])),
            default_verbosity: Level::new(i8::from_ne_bytes([verbosity])),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::uniform(Level::INFO)
    }
}

/// A malformed `pattern=level` entry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VmoduleError {
    /// The entry has no `=`.
    #[error("vmodule entry '{entry}' is missing '='")]
    MissingSeparator {
        /// The offending entry.
        entry: String,
    },
    /// Nothing precedes the `=`.
    #[error("vmodule entry '{entry}' has an empty file pattern")]
    EmptyPattern {
        /// The offending entry.
        entry: String,
    },
    /// The level is not an integer in range.
    #[error("vmodule entry '{entry}' has an invalid level: {source}")]
    InvalidLevel {
        /// The offending entry.
        entry: String,
        /// Why the level was rejected.
        #[source]
        source: LevelParseError,
    },
}

/// Per-file verbosity overrides keyed by source-file basename.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VmoduleTable {
    overrides: FxHashMap<String, Level>,
}

impl VmoduleTable {
    /// Parses a comma-separated list of `pattern=level` entries, failing on the
    /// first malformed one. Empty entries are ignored.
    pub fn parse_strict(spec: &str) -> Result<Self, VmoduleError> {
        let mut table = Self::default();
        for entry in entries(spec) {
            let (pattern, level) = parse_entry(entry)?;
            table.overrides.insert(pattern.to_owned(), level);
        }
        Ok(table)
    }

    /// Parses like [`parse_strict`](Self::parse_strict) but skips malformed
    /// entries, returning them alongside the table.
    pub fn parse_lenient(spec: &str) -> (Self, Vec<VmoduleError>) {
        let mut table = Self::default();
        let mut rejected = Vec::new();
        for entry in entries(spec) {
            match parse_entry(entry) {
                Ok((pattern, level)) => {
                    table.overrides.insert(pattern.to_owned(), level);
                }
                Err(error) => rejected.push(error),
            }
        }
        (table, rejected)
    }

    /// Returns the override for a file basename.
    pub fn get(&self, file_basename: &str) -> Option<Level> {
        self.overrides.get(file_basename).copied()
    }

    /// Inserts or replaces one override.
    pub fn insert(&mut self, pattern: impl Into<String>, level: Level) {
        self.overrides.insert(pattern.into(), level);
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Reports whether the table has no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Iterates over `(pattern, level)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Level)> {
        self.overrides
            .iter()
            .map(|(pattern, level)| (pattern.as_str(), *level))
    }

    fn merged(&self, other: &Self) -> Self {
        let mut next = self.clone();
        next.overrides.extend(
            other
                .overrides
                .iter()
                .map(|(pattern, level)| (pattern.clone(), *level)),
        );
        next
    }
}

/// Renders the table back into `pattern=level` form, sorted by pattern.
impl fmt::Display for VmoduleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (index, (pattern, level)) in pairs.into_iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{pattern}={}", level.value())?;
        }
        Ok(())
    }
}

fn entries(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

fn parse_entry(entry: &str) -> Result<(&str, Level), VmoduleError> {
    let Some((pattern, level)) = entry.split_once('=') else {
        return Err(VmoduleError::MissingSeparator {
            entry: entry.to_owned(),
        });
    };
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(VmoduleError::EmptyPattern {
            entry: entry.to_owned(),
        });
    }
    let level = Level::parse_numeric(level).map_err(|source| VmoduleError::InvalidLevel {
        entry: entry.to_owned(),
        source,
    })?;
    Ok((pattern, level))
}

/// Shared admission state consulted on every log call.
#[derive(Debug)]
pub struct VerbosityFilter {
    verbosity: AtomicU16,
    vmodule: ArcSwap<VmoduleTable>,
}

impl VerbosityFilter {
    /// Creates a filter with no file overrides.
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity: AtomicU16::new(verbosity.pack()),
            vmodule: ArcSwap::from_pointee(VmoduleTable::default()),
        }
    }

    /// Current severity threshold and default verbosity.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::unpack(self.verbosity.load(Ordering::Acquire))
    }

    /// Sets both the severity threshold and the default verbosity to `level`.
    pub fn set_verbosity(&self, level: Level) {
        self.set(Verbosity::uniform(level));
    }

    /// Publishes a new severity threshold and default verbosity.
    pub fn set(&self, verbosity: Verbosity) {
        self.verbosity.store(verbosity.pack(), Ordering::Release);
    }

    /// Merges `pattern=level` entries into the vmodule table.
    ///
    /// Malformed entries are skipped and reported as debug events. Returns the
    /// number of entries applied.
    pub fn set_file_verbosity(&self, spec: &str) -> usize {
        let (table, rejected) = VmoduleTable::parse_lenient(spec);
        for error in &rejected {
            tracing::debug!(target: "logging::filter", %error, "skipping vmodule entry");
        }
        let applied = table.len();
        if applied > 0 {
            self.merge_file_overrides(&table);
        }
        applied
    }

    /// Merges an already parsed table into the vmodule table.
    pub fn merge_file_overrides(&self, table: &VmoduleTable) {
        self.vmodule.rcu(|current| current.merged(table));
        let current = self.vmodule.load_full();
        tracing::debug!(
            target: "logging::filter",
            vmodule = %current,
            "file verbosity updated"
        );
    }

    /// Removes every file override.
    pub fn reset_file_verbosity(&self) {
        self.vmodule.store(Arc::new(VmoduleTable::default()));
    }

    /// Snapshot of the current vmodule table.
    pub fn file_overrides(&self) -> Arc<VmoduleTable> {
        self.vmodule.load_full()
    }

    /// Reports whether any file override is installed.
    pub fn has_file_overrides(&self) -> bool {
        !self.vmodule.load().is_empty()
    }

    /// Cheap pre-check: `false` means the record is rejected whatever its
    /// source file.
    #[inline]
    pub fn might_emit(&self, level: Level) -> bool {
        level >= self.verbosity().min_severity || level.is_verbose()
    }

    /// Final decision for a record attributed to `caller_file`.
    pub fn should_emit(&self, level: Level, caller_file: Option<&str>) -> bool {
        let verbosity = self.verbosity();
        if level >= verbosity.min_severity {
            return true;
        }
        if !level.is_verbose() {
            return false;
        }
        let threshold = caller_file
            .and_then(|file| self.vmodule.load().get(basename(file)))
            .unwrap_or(verbosity.default_verbosity);
        level.within(threshold)
    }
}

impl Default for VerbosityFilter {
    fn default() -> Self {
        Self::new(Verbosity::default())
    }
}
