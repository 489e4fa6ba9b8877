//! Tool configuration (`lmsp.toml`).
//!
//! Defines the typed configuration for output handling and merge tunables.
//! Missing file → all defaults (no error).

use std::fmt;
use std::path::Path;

use lmsp_archive::DEFAULT_BACKUP_SUFFIX;
use lmsp_core::merge::{DEFAULT_ID_LENGTH, DEFAULT_MAX_ID_ATTEMPTS};
use lmsp_core::MergeOptions;
use serde::Deserialize;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lmsp.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LmspConfig {
    /// How merged projects are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Merge engine tunables.
    #[serde(default)]
    pub merge: MergeConfig,
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Output file handling.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Suffix appended to the name of a replaced output file
    /// (default: `".bak"`). The old file is always kept.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Indent `*.json` output.
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backup_suffix: default_backup_suffix(),
            pretty_json: default_pretty_json(),
        }
    }
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_owned()
}

const fn default_pretty_json() -> bool {
    true
}

// ---------------------------------------------------------------------------
// MergeConfig
// ---------------------------------------------------------------------------

/// Id generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Length of generated block and symbol ids.
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// Random draws per id before the merge gives up.
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            id_length: default_id_length(),
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

impl MergeConfig {
    #[must_use]
    pub const fn options(&self) -> MergeOptions {
        MergeOptions {
            id_length: self.id_length,
            max_id_attempts: self.max_id_attempts,
        }
    }
}

const fn default_id_length() -> usize {
    DEFAULT_ID_LENGTH
}

const fn default_max_id_attempts() -> usize {
    DEFAULT_MAX_ID_ATTEMPTS
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A configuration file that could not be loaded.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl LmspConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields defaults. Invalid TOML, unknown keys and
    /// out-of-range values are errors.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or a zero id
    /// length / attempt budget.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError {
            path: None,
            message: message.to_owned(),
        };
        if self.merge.id_length == 0 {
            return Err(invalid("merge.id_length must be at least 1"));
        }
        if self.merge.max_id_attempts == 0 {
            return Err(invalid("merge.max_id_attempts must be at least 1"));
        }
        if self.output.backup_suffix.is_empty() {
            return Err(invalid("output.backup_suffix must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
