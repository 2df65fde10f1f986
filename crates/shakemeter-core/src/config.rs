//! TOML-based configuration.
//!
//! Holds every tunable of the meter:
//! - Shake filter threshold and rate window
//! - Counter bounds, hot threshold and drive tick cadence
//! - Sensor sample interval
//! - Feedback (looping victory effect) preferences
//!
//! Configuration is stored at `~/.config/shakemeter/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns `~/.config/shakemeter[-dev]/` based on SHAKEMETER_ENV.
///
/// Set SHAKEMETER_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SHAKEMETER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("shakemeter-dev")
    } else {
        base_dir.join("shakemeter")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Counter and shake-detection tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Acceleration magnitude (g) a sample must exceed to count as a shake.
    #[serde(default = "default_shake_magnitude_threshold")]
    pub shake_magnitude_threshold: f64,
    /// Length of the trailing window shake events are counted over.
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,
    /// Shakes per window needed for the counter to rise.
    #[serde(default = "default_rate_threshold")]
    pub rate_threshold: u32,
    #[serde(default = "default_drive_tick_ms")]
    pub drive_tick_ms: u64,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    /// Count at which the looping effect starts. Must not exceed `max_count`.
    #[serde(default = "default_hot_threshold")]
    pub hot_threshold: u32,
    #[serde(default = "default_energy_per_unit")]
    pub energy_per_unit: f64,
}

/// Sensor sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

/// Feedback effect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub haptics: bool,
    /// Path to a custom victory sound (optional).
    #[serde(default)]
    pub sound: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/shakemeter/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub meter: MeterConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

// Default functions
fn default_shake_magnitude_threshold() -> f64 {
    1.5
}
fn default_rate_window_ms() -> u64 {
    1000
}
fn default_rate_threshold() -> u32 {
    3
}
fn default_drive_tick_ms() -> u64 {
    50
}
fn default_max_count() -> u32 {
    100
}
fn default_hot_threshold() -> u32 {
    90
}
fn default_energy_per_unit() -> f64 {
    0.5
}
fn default_sample_interval_ms() -> u64 {
    100
}
fn default_true() -> bool {
    true
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            shake_magnitude_threshold: default_shake_magnitude_threshold(),
            rate_window_ms: default_rate_window_ms(),
            rate_threshold: default_rate_threshold(),
            drive_tick_ms: default_drive_tick_ms(),
            max_count: default_max_count(),
            hot_threshold: default_hot_threshold(),
            energy_per_unit: default_energy_per_unit(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            haptics: true,
            sound: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meter: MeterConfig::default(),
            sensor: SensorConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Check that the tunables describe a usable meter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.shake_magnitude_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::invalid(
                "meter.shake_magnitude_threshold",
                format!("must be a positive number, got {t}"),
            ));
        }
        if self.rate_window_ms == 0 {
            return Err(ConfigError::invalid("meter.rate_window_ms", "must be greater than 0"));
        }
        if self.rate_threshold == 0 {
            return Err(ConfigError::invalid("meter.rate_threshold", "must be greater than 0"));
        }
        if self.drive_tick_ms == 0 {
            return Err(ConfigError::invalid("meter.drive_tick_ms", "must be greater than 0"));
        }
        if self.max_count == 0 {
            return Err(ConfigError::invalid("meter.max_count", "must be greater than 0"));
        }
        if self.hot_threshold == 0 || self.hot_threshold > self.max_count {
            return Err(ConfigError::invalid(
                "meter.hot_threshold",
                format!(
                    "must be in 1..={}, got {}",
                    self.max_count, self.hot_threshold
                ),
            ));
        }
        let e = self.energy_per_unit;
        if !e.is_finite() || e < 0.0 {
            return Err(ConfigError::invalid(
                "meter.energy_per_unit",
                format!("must be a non-negative number, got {e}"),
            ));
        }
        Ok(())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| ConfigError::invalid(key, e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    ConfigError::invalid(key, format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(ConfigError::invalid(
                                key,
                                format!("cannot parse '{value}' as number"),
                            ));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(content)?;
        cfg.meter.validate()?;
        if cfg.sensor.sample_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "sensor.sample_interval_ms",
                "must be greater than 0",
            ));
        }
        Ok(cfg)
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// The updated config is validated before it replaces `self`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.meter.validate()?;
        if updated.sensor.sample_interval_ms == 0 {
            return Err(ConfigError::invalid(key, "must be greater than 0"));
        }
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// or fails validation, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
