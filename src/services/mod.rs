//! Service layer built on the NVML session
//!
//! Discovery with populated topology, and the periodic status monitor.

pub mod discovery;
pub mod monitor;

pub use discovery::lookup_devices;
pub use monitor::{MonitorConfig, StatusMonitor};
