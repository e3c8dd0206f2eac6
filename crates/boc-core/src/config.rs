//! Configuration for the BOC interpreter
//!
//! Defaults applied to beliefs whose source does not spell out a decay curve,
//! plus the log level used by the command-line front-end. Values come from
//! built-in defaults, a TOML file, or `BOC_*` environment variables.

use crate::belief::{DecayCurve, DecaySettings, DEFAULT_DECAY_PERIOD, DEFAULT_DECAY_RATE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Environment variable error: {message}")]
    EnvError { message: String },

    #[error("IO error reading config file: {message}")]
    IoError { message: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },
}

pub const ENV_DECAY_CURVE: &str = "BOC_DEFAULT_DECAY_CURVE";
pub const ENV_DECAY_RATE: &str = "BOC_DEFAULT_DECAY_RATE";
pub const ENV_DECAY_PERIOD: &str = "BOC_DEFAULT_DECAY_PERIOD";
pub const ENV_LOG_LEVEL: &str = "BOC_LOG_LEVEL";

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BocConfig {
    /// Decay applied to new beliefs
    pub decay: DecayConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub curve: DecayCurve,
    pub rate: f64,
    #[serde(with = "humantime_serde")]
    pub period: Duration,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            curve: DecayCurve::Exponential,
            rate: DEFAULT_DECAY_RATE,
            period: DEFAULT_DECAY_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BocConfig {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `BOC_*` environment variables onto this configuration
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(curve) = read_env(ENV_DECAY_CURVE)? {
            self.decay.curve = curve.parse().map_err(|e: crate::error::BocError| {
                ConfigError::InvalidValue {
                    key: ENV_DECAY_CURVE.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(rate) = read_env(ENV_DECAY_RATE)? {
            self.decay.rate = rate.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_DECAY_RATE.to_string(),
                reason: format!("'{}' is not a number", rate),
            })?;
        }

        if let Some(period) = read_env(ENV_DECAY_PERIOD)? {
            self.decay.period =
                humantime::parse_duration(period.trim()).map_err(|e| ConfigError::InvalidValue {
                    key: ENV_DECAY_PERIOD.to_string(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(level) = read_env(ENV_LOG_LEVEL)? {
            self.logging.level = level.trim().to_lowercase();
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.decay.rate.is_finite() || self.decay.rate < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "decay.rate".to_string(),
                reason: "Decay rate must be a non-negative number".to_string(),
            });
        }

        if self.decay.period.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "decay.period".to_string(),
                reason: "Decay period must be greater than zero".to_string(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                reason: format!("Must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Decay settings for beliefs that do not name their own
    pub fn default_decay(&self) -> DecaySettings {
        DecaySettings {
            curve: self.decay.curve.clone(),
            rate: self.decay.rate,
            period: self.decay.period,
        }
    }
}

fn read_env(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvError {
            message: format!("{}: {}", key, e),
        }),
    }
}
