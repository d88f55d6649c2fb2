//! Catcher configuration.
//!
//! Everything can be set in code through the [`Catcher`](crate::Catcher)
//! setters or loaded from TOML with [`ConfigLoader`].
//!
//! # TOML Example
//!
//! ```toml
//! intercept_exceptions = true
//! intercept_errors = true
//!
//! [policy]
//! halt_on_fatal = true
//! allow_recoverable_continuation = false
//! halt_on_unknown_severity = true
//! exit_code = 255
//!
//! [output]
//! console = true
//! markup = false
//! backtrace = true
//! log_file = "/var/log/app/faults.log"
//!
//! [output.mail]
//! to = "ops@example.org"
//! from = "app@example.org"
//! subject = "Application fault"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Exit code used by a halt unless configured otherwise.
pub const DEFAULT_EXIT_CODE: i32 = 255;

/// When a diagnostic terminates the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaltPolicy {
    /// Halt on `Error`, and on `RecoverableError` unless continuation is allowed.
    pub halt_on_fatal: bool,
    /// Let `RecoverableError` resume. Only consulted when `halt_on_fatal` is set.
    pub allow_recoverable_continuation: bool,
    /// Halt on codes outside the recognised set.
    pub halt_on_unknown_severity: bool,
    /// Process exit code of a halt.
    pub exit_code: i32,
}

impl Default for HaltPolicy {
    fn default() -> Self {
        Self {
            halt_on_fatal: true,
            allow_recoverable_continuation: false,
            halt_on_unknown_severity: true,
            exit_code: DEFAULT_EXIT_CODE,
        }
    }
}

/// Mail sink settings. The sink is active only when `to`, `from` and
/// `subject` are all present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    /// Mail submission program; `/usr/sbin/sendmail` when unset.
    pub sendmail: Option<PathBuf>,
}

impl MailConfig {
    /// `(to, from, subject)` when the sink is active.
    pub fn active(&self) -> Option<(&str, &str, &str)> {
        let to = non_empty(&self.to)?;
        let from = non_empty(&self.from)?;
        let subject = non_empty(&self.subject)?;
        Some((to, from, subject))
    }

    fn configured_fields(&self) -> usize {
        [&self.to, &self.from, &self.subject]
            .into_iter()
            .filter(|field| non_empty(field).is_some())
            .count()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write reports to the console.
    pub console: bool,
    /// Convert line breaks to display markup on the console.
    pub markup: bool,
    /// Append a backtrace block to error reports.
    pub backtrace: bool,
    pub mail: MailConfig,
    /// Append reports to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            markup: true,
            backtrace: false,
            mail: MailConfig::default(),
            log_file: None,
        }
    }
}

/// Full catcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatcherConfig {
    /// Take over the exception (panic) hook.
    pub intercept_exceptions: bool,
    /// Take over the diagnostic hook.
    pub intercept_errors: bool,
    pub policy: HaltPolicy,
    pub output: OutputConfig,
}

impl Default for CatcherConfig {
    fn default() -> Self {
        Self {
            intercept_exceptions: true,
            intercept_errors: true,
            policy: HaltPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CatcherConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `output.log_file` is an empty path
    /// - `output.mail` sets some, but not all, of `to`/`from`/`subject`
    /// - `policy.exit_code` is outside `0..=255`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .output
            .log_file
            .as_deref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "output.log_file cannot be empty".to_string(),
            ));
        }
        let mail_fields = self.output.mail.configured_fields();
        if mail_fields != 0 && mail_fields != 3 {
            return Err(ConfigError::ValidationError(
                "output.mail needs all of to, from and subject".to_string(),
            ));
        }
        if !(0..=255).contains(&self.policy.exit_code) {
            return Err(ConfigError::ValidationError(format!(
                "policy.exit_code {} out of range 0..=255",
                self.policy.exit_code
            )));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
