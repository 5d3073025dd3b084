//! Trait definitions for the NVML capability provider
//!
//! `NvmlProvider` is the narrow set of NVML primitives the descriptor
//! builder, status sampler and topology classifier are written against. The
//! production implementation is [`NvmlLibrary`](crate::nvml::NvmlLibrary);
//! tests use the fake provider in `mock`.

use crate::error::NvmlError;

use std::fmt::Debug;

/// Clock domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockKind {
    /// Streaming multiprocessor (core) clock
    Sm,
    /// Memory clock
    Memory,
}

/// Memory location of an ECC counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EccLocation {
    L1Cache,
    L2Cache,
    DeviceMemory,
}

/// Direction of a PCIe throughput counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcieDirection {
    Rx,
    Tx,
}

/// BAR1 memory, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bar1Memory {
    pub total: u64,
    pub used: u64,
}

/// Utilization rates, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtilizationRates {
    pub gpu: u32,
    pub memory: u32,
}

/// A process as NVML reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningProcess {
    pub pid: u32,
    /// Used GPU memory in bytes, `None` when NVML cannot tell
    pub used_gpu_memory: Option<u64>,
}

/// Raw topology levels (`nvmlGpuTopologyLevel_t`)
pub mod topology_level {
    pub const INTERNAL: u32 = 0;
    pub const SINGLE: u32 = 10;
    pub const MULTIPLE: u32 = 20;
    pub const HOSTBRIDGE: u32 = 30;
    /// Also reported as NODE by newer drivers
    pub const CPU: u32 = 40;
    pub const SYSTEM: u32 = 50;
}

/// NVML capability provider
///
/// Every method is a single NVML query. Values are returned in NVML's native
/// units; conversion happens in the callers.
pub trait NvmlProvider {
    /// Opaque device handle, valid while the provider is initialized
    type Handle: Copy + Debug;

    /// Release the library
    fn shutdown(self) -> Result<(), NvmlError>
    where
        Self: Sized;

    fn device_count(&self) -> Result<u32, NvmlError>;

    fn driver_version(&self) -> Result<String, NvmlError>;

    fn handle_by_index(&self, index: u32) -> Result<Self::Handle, NvmlError>;

    fn name(&self, device: Self::Handle) -> Result<String, NvmlError>;

    fn uuid(&self, device: Self::Handle) -> Result<String, NvmlError>;

    /// PCI bus id string
    fn pci_bus_id(&self, device: Self::Handle) -> Result<String, NvmlError>;

    fn minor_number(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    fn bar1_memory(&self, device: Self::Handle) -> Result<Bar1Memory, NvmlError>;

    /// Power management limit in milliwatts
    fn power_limit(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    /// Power draw in milliwatts
    fn power_usage(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    /// Maximum clock in MHz
    fn max_clock(&self, device: Self::Handle, kind: ClockKind) -> Result<u32, NvmlError>;

    /// Current clock in MHz
    fn clock(&self, device: Self::Handle, kind: ClockKind) -> Result<u32, NvmlError>;

    fn max_pcie_link_gen(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    fn max_pcie_link_width(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    /// GPU die temperature in °C
    fn temperature(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    fn utilization(&self, device: Self::Handle) -> Result<UtilizationRates, NvmlError>;

    /// Encoder utilization in percent
    fn encoder_utilization(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    /// Decoder utilization in percent
    fn decoder_utilization(&self, device: Self::Handle) -> Result<u32, NvmlError>;

    /// Used device memory in bytes
    fn memory_used(&self, device: Self::Handle) -> Result<u64, NvmlError>;

    /// Uncorrected volatile ECC error count at `location`
    fn ecc_errors(&self, device: Self::Handle, location: EccLocation) -> Result<u64, NvmlError>;

    /// PCIe throughput in KB/s
    fn pcie_throughput(
        &self,
        device: Self::Handle,
        direction: PcieDirection,
    ) -> Result<u32, NvmlError>;

    fn compute_processes(&self, device: Self::Handle) -> Result<Vec<RunningProcess>, NvmlError>;

    /// Name of a process, at most `max_len - 1` bytes
    fn process_name(&self, pid: u32, max_len: usize) -> Result<String, NvmlError>;

    /// Raw common-ancestor level of two devices (see [`topology_level`])
    fn topology_common_ancestor(
        &self,
        first: Self::Handle,
        second: Self::Handle,
    ) -> Result<u32, NvmlError>;
}
