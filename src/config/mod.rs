//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::error::ConfigError;
use crate::nvml::device::PCI_DEVICES_DIR;
use crate::services::MonitorConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Host filesystem locations
    pub sysfs: SysfsConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Status watch interval in seconds
    pub interval_seconds: u64,
    /// Retry a failed status round instead of exiting
    pub retry: bool,
    /// Retry interval in seconds
    pub retry_interval_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            interval_seconds: 5,
            retry: false,
            retry_interval_seconds: 10,
        }
    }
}

/// Sysfs configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SysfsConfig {
    /// Directory holding one entry per PCI device
    pub pci_devices_dir: PathBuf,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            pci_devices_dir: PathBuf::from(PCI_DEVICES_DIR),
        }
    }
}

impl Config {
    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "general.interval_seconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.general.retry && self.general.retry_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "general.retry_interval_seconds".to_string(),
                message: "must be at least 1 when retry is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// Monitor settings for a watch of `count` rounds
    pub fn to_monitor_config(&self, count: Option<u64>) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_secs(self.general.interval_seconds),
            count,
            retry: self.general.retry,
            retry_interval: Duration::from_secs(self.general.retry_interval_seconds),
        }
    }
}
