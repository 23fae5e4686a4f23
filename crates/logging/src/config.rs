//! crates/logging/src/config.rs
//! Process configuration for the filter, the registry, and attribution.

use crate::classifier::ResolveMode;
use crate::filter::{Verbosity, VerbosityFilter, VmoduleError, VmoduleTable};
use crate::level::{Level, LevelParseError};
use crate::logger::LoggerBuilder;
use crate::registry::InternalPackages;

/// Environment variable holding the severity threshold and default verbosity.
pub const ENV_VERBOSITY: &str = "SITELOG_VERBOSITY";
/// Environment variable holding `pattern=level` overrides.
pub const ENV_VMODULE: &str = "SITELOG_VMODULE";
/// Environment variable holding comma-separated internal package prefixes.
pub const ENV_INTERNAL_PACKAGES: &str = "SITELOG_INTERNAL_PACKAGES";
/// Environment variable enabling test-aware caller resolution.
pub const ENV_TEST_AWARE: &str = "SITELOG_TEST_AWARE";
/// Environment variable enabling or disabling caller attribution.
pub const ENV_CALLER: &str = "SITELOG_CALLER";

/// Invalid configuration value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A level could not be parsed.
    #[error("invalid {var}: {source}")]
    Level {
        /// Variable or key that held the value.
        var: &'static str,
        /// Parse failure.
        #[source]
        source: LevelParseError,
    },
    /// A vmodule list had a malformed entry.
    #[error("invalid {var}: {source}")]
    Vmodule {
        /// Variable or key that held the value.
        var: &'static str,
        /// First malformed entry.
        #[source]
        source: VmoduleError,
    },
    /// A flag was not a recognised boolean.
    #[error("invalid {var}: expected a boolean, found '{value}'")]
    Bool {
        /// Variable or key that held the value.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Combined logging configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LogConfig {
    /// Severity threshold and default verbosity.
    pub verbosity: Verbosity,
    /// Per-file overrides in `pattern=level` form.
    pub vmodule: String,
    /// Prefixes added to the internal-package registry.
    pub internal_packages: Vec<String>,
    /// Caller resolution mode.
    pub mode: ResolveMode,
    /// Whether records carry caller metadata.
    pub caller: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            vmodule: String::new(),
            internal_packages: Vec::new(),
            mode: ResolveMode::Standard,
            caller: true,
        }
    }
}

impl LogConfig {
    /// Maps a `-v` count to a configuration.
    ///
    /// Zero keeps the defaults, one admits `DEBUG` records everywhere, two or
    /// more admit `TRACE` records.
    pub fn from_verbose_level(level: u8) -> Self {
        let default_verbosity = match level {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            verbosity: Verbosity {
                min_severity: Level::INFO,
                default_verbosity,
            },
            ..Self::default()
        }
    }

    /// Reads the `SITELOG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unset and blank keys keep their defaults.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(ENV_VERBOSITY) {
            let level = value.parse::<Level>().map_err(|source| ConfigError::Level {
                var: ENV_VERBOSITY,
                source,
            })?;
            config.verbosity = Verbosity::uniform(level);
        }
        if let Some(value) = get(ENV_VMODULE) {
            VmoduleTable::parse_strict(&value).map_err(|source| ConfigError::Vmodule {
                var: ENV_VMODULE,
                source,
            })?;
            config.vmodule = value;
        }
        if let Some(value) = get(ENV_INTERNAL_PACKAGES) {
            config.internal_packages = value
                .split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(value) = get(ENV_TEST_AWARE) {
            if parse_bool(ENV_TEST_AWARE, &value)? {
                config.mode = ResolveMode::TestAware;
            }
        }
        if let Some(value) = get(ENV_CALLER) {
            config.caller = parse_bool(ENV_CALLER, &value)?;
        }
        Ok(config)
    }

    /// Pushes the configuration into live components.
    pub fn apply(&self, filter: &VerbosityFilter, packages: &InternalPackages) {
        filter.set(self.verbosity);
        if !self.vmodule.is_empty() {
            filter.set_file_verbosity(&self.vmodule);
        }
        if !self.internal_packages.is_empty() {
            packages.register(self.internal_packages.iter().cloned());
        }
        tracing::debug!(
            target: "logging::config",
            min_severity = %self.verbosity.min_severity,
            default_verbosity = %self.verbosity.default_verbosity,
            vmodule = %self.vmodule,
            mode = ?self.mode,
            caller = self.caller,
            "logging configuration applied"
        );
    }

    /// Returns a builder with this configuration's attribution settings.
    pub fn logger_builder(&self) -> LoggerBuilder {
        LoggerBuilder::default()
            .mode(self.mode)
            .caller(self.caller)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Bool {
            var,
            value: value.to_owned(),
        }),
    }
}
