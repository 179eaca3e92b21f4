//! Configuration management for PVPC Bot
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{PvpcError, Result};
use crate::esios::Zone;
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telegram bot configuration
    pub telegram: TelegramConfig,

    /// Upstream price API configuration
    pub esios: EsiosConfig,

    /// On-disk storage locations
    pub storage: StorageConfig,

    /// Statistical summary parameters
    pub analysis: AnalysisConfig,

    /// Daily push configuration
    pub schedule: ScheduleConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Bound of the background cache write queue
    pub cache_writer_capacity: usize,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token
    pub token: String,

    /// Public bot username, shown in the welcome message
    pub username: String,

    /// Whether admin commands are registered at all
    pub admin_enabled: bool,

    /// Chat ids granted admin rights at startup
    pub admins: Vec<i64>,

    /// Sticker file id sent after the welcome message
    pub welcome_sticker: String,
}

/// Upstream (ESIOS) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EsiosConfig {
    /// Optional API token; empty means anonymous requests without date range
    pub token: String,

    /// API base URL
    pub base_url: String,

    /// Indicator id for hourly prices
    pub prices_indicator: u32,

    /// Indicator id for tariff sections
    pub sections_indicator: u32,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory
    pub data_dir: String,
}

/// Summary computation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Low percentile threshold (0-100)
    pub low_percentile: u8,

    /// High percentile threshold (0-100)
    pub high_percentile: u8,

    /// Decimals shown in reports
    pub round_decimals: usize,

    /// Zone used for users without settings
    pub default_zone: Zone,
}

/// Daily push schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Whether the daily push runs
    pub enabled: bool,

    /// Local time of the daily push in HH:MM format
    pub daily_push_time: String,

    /// IANA timezone the push time is expressed in
    pub timezone: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for the console layer
    pub console_level: Option<String>,

    /// Optional override for the general log file
    pub file_level: Option<String>,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Number of rotated files to keep per kind
    pub backup_count: u32,
}

impl StorageConfig {
    /// Directory holding cached upstream documents
    pub fn cache_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("cache")
    }

    /// Directory holding per-user settings files
    pub fn settings_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("settings")
    }

    /// Directory holding rotated log files
    pub fn logs_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("logs")
    }
}

impl ScheduleConfig {
    /// Parse the configured push time
    pub fn push_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_push_time, "%H:%M").map_err(|e| {
            PvpcError::validation("schedule.daily_push_time".to_string(), e.to_string())
        })
    }

    /// Parse the configured timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            PvpcError::validation("schedule.timezone".to_string(), e.to_string())
        })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from an explicit path or the default locations,
    /// then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_paths = [
                    "pvpc_config.yaml",
                    "/data/pvpc_config.yaml",
                    "/etc/pvpc-bot/config.yaml",
                ];
                match default_paths.iter().find(|p| Path::new(p).exists()) {
                    Some(path) => Self::from_file(path)?,
                    None => Config::default(),
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override secrets and paths from the environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("PVPC_TELEGRAM_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.token = token;
        }
        if let Some(token) = lookup("PVPC_ESIOS_TOKEN").filter(|v| !v.is_empty()) {
            self.esios.token = token;
        }
        if let Some(dir) = lookup("PVPC_DATA_DIR").filter(|v| !v.is_empty()) {
            self.storage.data_dir = dir;
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(PvpcError::validation(
                "telegram.token",
                "Bot token cannot be empty",
            ));
        }

        if self.analysis.low_percentile > 100 || self.analysis.high_percentile > 100 {
            return Err(PvpcError::validation(
                "analysis.percentiles",
                "Must be within 0..=100",
            ));
        }

        if self.analysis.low_percentile > self.analysis.high_percentile {
            return Err(PvpcError::validation(
                "analysis.low_percentile",
                "Must not exceed high_percentile",
            ));
        }

        if self.esios.timeout_seconds == 0 {
            return Err(PvpcError::validation(
                "esios.timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.cache_writer_capacity == 0 {
            return Err(PvpcError::validation(
                "cache_writer_capacity",
                "Must be greater than 0",
            ));
        }

        self.schedule.push_time()?;
        self.schedule.tz()?;

        Ok(())
    }
}
