//! Live status domain types
//!
//! A `DeviceStatus` is a point-in-time sample. Metrics the hardware cannot
//! report are zero, not absent.

use crate::domain::gpu::ClockInfo;
use serde::{Deserialize, Serialize};

/// Utilization percentages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationInfo {
    pub gpu: u32,
    pub memory: u32,
    pub encoder: u32,
    pub decoder: u32,
}

/// Uncorrected volatile ECC error counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EccErrorsInfo {
    pub l1_cache: u64,
    pub l2_cache: u64,
    pub global: u64,
}

impl EccErrorsInfo {
    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.l1_cache
            .saturating_add(self.l2_cache)
            .saturating_add(self.global)
    }
}

/// Memory usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Used device memory in MB
    pub global_used: u64,
    pub ecc_errors: EccErrorsInfo,
}

/// PCIe throughput in MB/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciThroughputInfo {
    pub rx: u32,
    pub tx: u32,
}

/// PCI usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciStatusInfo {
    /// Used BAR1 memory in MB
    pub bar1_used: u64,
    pub throughput: PciThroughputInfo,
}

/// A compute process running on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// GPU memory used in MB
    pub memory_used: u64,
}

/// Point-in-time status of a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Power draw in watts
    pub power: u32,
    /// GPU temperature in °C
    pub temperature: u32,
    pub utilization: UtilizationInfo,
    pub memory: MemoryInfo,
    /// Current clocks in MHz
    pub clocks: ClockInfo,
    pub pci: PciStatusInfo,
    pub processes: Vec<ProcessInfo>,
}

impl DeviceStatus {
    /// Memory used by the reported processes in MB
    pub fn process_memory_used(&self) -> u64 {
        self.processes
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.memory_used))
    }
}
