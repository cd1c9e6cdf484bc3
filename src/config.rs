//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. The device identification constants are not
//! configurable.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::diagnostic::render::RenderFormat;
use crate::error::{PadError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub diagnostic: DiagnosticConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device discovery and virtual device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Node prefix; nodes are `<root>0`, `<root>1`, ...
    #[serde(default = "default_device_root")]
    pub root: String,

    /// Display name of the virtual joystick
    #[serde(default = "default_joypad_name")]
    pub name: String,
}

/// Diagnostic poller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticConfig {
    #[serde(default)]
    pub format: RenderFormat,

    /// Stop after this many reports; 0 polls until interrupted
    #[serde(default)]
    pub max_reports: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files; empty logs to stderr only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_device_root() -> String { crate::device::hidraw::DEFAULT_HIDRAW_ROOT.to_string() }
fn default_joypad_name() -> String { crate::input::virtual_device::JOYPAD_NAME.to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { root: default_device_root(), name: default_joypad_name() }
    }
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self { format: RenderFormat::default(), max_reports: 0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), log_dir: String::new() }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Longest name uinput accepts (UINPUT_MAX_NAME_SIZE minus the NUL)
const MAX_DEVICE_NAME_LEN: usize = 79;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use powershell_pad::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Report limit for the diagnostic poller, `None` when unbounded
    pub fn max_reports(&self) -> Option<u64> {
        match self.diagnostic.max_reports {
            0 => None,
            n => Some(n),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.root.is_empty() {
            return Err(invalid("device root cannot be empty"));
        }

        if self.device.name.is_empty() {
            return Err(invalid("device name cannot be empty"));
        }

        if self.device.name.len() > MAX_DEVICE_NAME_LEN {
            return Err(invalid(format!(
                "device name must be at most {} bytes",
                MAX_DEVICE_NAME_LEN
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> PadError {
    PadError::Config(toml::de::Error::custom(msg))
}
