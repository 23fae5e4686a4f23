//! crates/logging/src/level.rs
//! Severity levels shared by the filter, the logger, and the sinks.

use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Levels are signed: larger values are more severe. Everything below
/// [`Level::INFO`] is a *verbose* level whose admission is decided per source
/// file by the [`VerbosityFilter`](crate::VerbosityFilter). Integers without a
/// name are valid levels, which lets hosts use fine-grained verbosity steps
/// between the named ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Level(i8);

impl Level {
    /// Very fine-grained tracing output.
    pub const TRACE: Self = Self(-8);
    /// Debugging output.
    pub const DEBUG: Self = Self(-4);
    /// Informational messages; the boundary between verbose and severity logs.
    pub const INFO: Self = Self(0);
    /// Recoverable problems.
    pub const WARN: Self = Self(4);
    /// Failures.
    pub const ERROR: Self = Self(8);
    /// Critical failures.
    pub const CRIT: Self = Self(12);

    /// Creates a level from its raw value.
    #[must_use]
    pub const fn new(value: i8) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> i8 {
        self.0
    }

    /// Reports whether the level sits below [`Level::INFO`].
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        self.0 < Self::INFO.0
    }

    /// Reports whether a record at this level is no more verbose than `threshold`.
    ///
    /// This is the admission rule for verbose records: a `DEBUG` record passes a
    /// `DEBUG` or `TRACE` threshold but not a `WARN` one.
    #[must_use]
    pub const fn within(self, threshold: Self) -> bool {
        self.0 >= threshold.0
    }

    /// Returns the canonical name, or `None` for unnamed levels.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            -8 => Some("TRACE"),
            -4 => Some("DEBUG"),
            0 => Some("INFO"),
            4 => Some("WARN"),
            8 => Some("ERROR"),
            12 => Some("CRIT"),
            _ => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<i8> for Level {
    fn from(value: i8) -> Self {
        Self(value)
    }
}

impl From<Level> for i8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

/// Error returned when a string names no level.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelParseError {
    /// The input was neither a level name nor an integer.
    #[error("unknown level: '{0}'")]
    Unknown(String),
    /// The input was an integer outside the `i8` range.
    #[error("level out of range: {0}")]
    OutOfRange(i64),
}

impl Level {
    /// Parses an integer level, the only form accepted in vmodule specs.
    pub fn parse_numeric(input: &str) -> Result<Self, LevelParseError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| LevelParseError::Unknown(input.to_owned()))?;
        i8::try_from(value)
            .map(Self)
            .map_err(|_| LevelParseError::OutOfRange(value))
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::TRACE),
            "debug" => Some(Self::DEBUG),
            "info" => Some(Self::INFO),
            "warn" | "warning" => Some(Self::WARN),
            "error" => Some(Self::ERROR),
            "crit" | "critical" | "fatal" => Some(Self::CRIT),
            _ => None,
        };
        match named {
            Some(level) => Ok(level),
            None => Self::parse_numeric(trimmed),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = LevelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.to_string()
    }
}
