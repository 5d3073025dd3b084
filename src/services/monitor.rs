//! Status watch loop
//!
//! Samples a fixed set of devices at regular intervals, one device after the
//! other on the calling thread.

use crate::domain::DeviceStatus;
use crate::error::{AppError, NvmlError};
use crate::nvml::{Device, NvmlProvider};

use std::time::Duration;

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between sampling rounds
    pub interval: Duration,
    /// Stop after this many rounds, run forever when `None`
    pub count: Option<u64>,
    /// Whether to retry a failed round
    pub retry: bool,
    /// Interval between retries
    pub retry_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            count: None,
            retry: false,
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// One sampling round: (device index, status) per device
pub type Round = Vec<(u32, DeviceStatus)>;

/// Periodic status sampler
pub struct StatusMonitor {
    config: MonitorConfig,
}

impl StatusMonitor {
    /// Create a new monitor with the given configuration
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Sample every device once
    pub fn sample<P: NvmlProvider>(&self, devices: &[Device<'_, P>]) -> Result<Round, NvmlError> {
        devices
            .iter()
            .map(|d| d.status().map(|status| (d.info().index, status)))
            .collect()
    }

    /// Run the sampling loop, handing each round to `on_round`
    pub fn run<P, F>(&self, devices: &[Device<'_, P>], mut on_round: F) -> Result<(), AppError>
    where
        P: NvmlProvider,
        F: FnMut(&Round) -> Result<(), AppError>,
    {
        let mut completed = 0u64;

        loop {
            match self.sample(devices) {
                Ok(round) => on_round(&round)?,
                Err(e) if self.config.retry => {
                    log::warn!("Status sample failed: {}", e);
                    log::info!("Retrying in {:?}...", self.config.retry_interval);
                    std::thread::sleep(self.config.retry_interval);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            completed += 1;
            if self.config.count.is_some_and(|count| completed >= count) {
                log::debug!("Sampled {} round(s), exiting", completed);
                break;
            }

            std::thread::sleep(self.config.interval);
        }

        Ok(())
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}
