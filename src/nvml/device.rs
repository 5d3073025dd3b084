//! GPU device descriptor and status sampler
//!
//! A [`Device`] is built once per index from a dozen NVML queries and keeps
//! the native handle for later [`Device::status`] calls.

use crate::domain::units::{
    bytes_to_mib, fixed_buffer_text, kbps_to_mbps, milliwatts_to_watts, pcie_bandwidth,
    DEVICE_NAME_BUFFER_SIZE, DEVICE_UUID_BUFFER_SIZE, PROCESS_NAME_BUFFER_SIZE,
};
use crate::domain::{
    ClockInfo, DeviceInfo, DeviceStatus, EccErrorsInfo, MemoryInfo, P2PLink, PciInfo,
    PciStatusInfo, PciThroughputInfo, ProcessInfo, UtilizationInfo,
};
use crate::error::{AffinityError, DeviceError, NvmlError};
use crate::nvml::traits::{ClockKind, EccLocation, NvmlProvider, PcieDirection};

use std::path::Path;

/// Maximum number of compute processes reported per sample
pub const MAX_PROCESSES: usize = 32;

/// Prefix of the device special files
pub const DEVICE_PATH_PREFIX: &str = "/dev/nvidia";

/// Default sysfs directory of PCI devices
pub const PCI_DEVICES_DIR: &str = "/sys/bus/pci/devices";

/// Device special file for a minor number
pub fn device_path(minor: u32) -> String {
    format!("{}{}", DEVICE_PATH_PREFIX, minor)
}

/// A GPU discovered through a provider
///
/// Borrows the provider it was built from, so it cannot outlive the
/// [`Session`](crate::nvml::Session) that owns it.
pub struct Device<'s, P: NvmlProvider> {
    provider: &'s P,
    handle: P::Handle,
    info: DeviceInfo,
}

impl<'s, P: NvmlProvider> Device<'s, P> {
    /// Build the descriptor of the device at `index`
    ///
    /// The first failing query aborts construction.
    pub(crate) fn new(
        provider: &'s P,
        index: u32,
        pci_devices_dir: &Path,
    ) -> Result<Self, DeviceError> {
        let handle = provider.handle_by_index(index)?;
        let model = provider.name(handle)?;
        let uuid = provider.uuid(handle)?;
        let bus_id = provider.pci_bus_id(handle)?;
        let minor = provider.minor_number(handle)?;
        let bar1 = provider.bar1_memory(handle)?;
        let power = provider.power_limit(handle)?;
        let max_cores = provider.max_clock(handle, ClockKind::Sm)?;
        let max_memory = provider.max_clock(handle, ClockKind::Memory)?;
        let pcie_gen = provider.max_pcie_link_gen(handle)?;
        let pcie_width = provider.max_pcie_link_width(handle)?;

        let cpu_affinity =
            numa_node(pci_devices_dir, &bus_id).map_err(DeviceError::CpuAffinity)?;

        log::debug!(
            "Discovered GPU {} at {} (NUMA node {})",
            index,
            bus_id,
            cpu_affinity
        );

        Ok(Self {
            provider,
            handle,
            info: DeviceInfo {
                index,
                model: fixed_buffer_text(&model, DEVICE_NAME_BUFFER_SIZE),
                uuid: fixed_buffer_text(&uuid, DEVICE_UUID_BUFFER_SIZE),
                path: device_path(minor),
                power: milliwatts_to_watts(power),
                cpu_affinity,
                pci: PciInfo {
                    bus_id,
                    bar1: bytes_to_mib(bar1.total),
                    bandwidth: pcie_bandwidth(pcie_gen, pcie_width),
                },
                clocks: ClockInfo {
                    cores: max_cores,
                    memory: max_memory,
                },
                topology: Vec::new(),
            },
        })
    }

    /// Static descriptor
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Consume the device, keeping only its descriptor
    pub fn into_info(self) -> DeviceInfo {
        self.info
    }

    /// Replace the topology list
    pub fn set_topology(&mut self, links: Vec<P2PLink>) {
        self.info.topology = links;
    }

    pub(crate) fn handle(&self) -> P::Handle {
        self.handle
    }

    /// Whether this device was built from `provider`
    pub(crate) fn belongs_to(&self, provider: &P) -> bool {
        std::ptr::eq(self.provider, provider)
    }

    /// Sample the live status of the device
    ///
    /// ECC counters and PCIe throughput are zero when the hardware does not
    /// support them; every other query must succeed.
    pub fn status(&self) -> Result<DeviceStatus, NvmlError> {
        let p = self.provider;
        let h = self.handle;

        let power = p.power_usage(h)?;
        let temperature = p.temperature(h)?;
        let usage = p.utilization(h)?;
        let encoder = p.encoder_utilization(h)?;
        let decoder = p.decoder_utilization(h)?;
        let memory_used = p.memory_used(h)?;
        let clock_cores = p.clock(h, ClockKind::Sm)?;
        let clock_memory = p.clock(h, ClockKind::Memory)?;
        let bar1 = p.bar1_memory(h)?;
        let mut running = p.compute_processes(h)?;
        running.truncate(MAX_PROCESSES);

        // Only Tesla-class boards report ECC counters
        let ecc_errors = match p.ecc_errors(h, EccLocation::L1Cache) {
            Err(NvmlError::NotSupported) => {
                log::trace!("ECC counters not supported on {}", self.info.pci.bus_id);
                EccErrorsInfo::default()
            }
            l1 => EccErrorsInfo {
                l1_cache: l1?,
                l2_cache: p.ecc_errors(h, EccLocation::L2Cache)?,
                global: p.ecc_errors(h, EccLocation::DeviceMemory)?,
            },
        };

        // Maxwell or newer
        let throughput = match p.pcie_throughput(h, PcieDirection::Rx) {
            Err(NvmlError::NotSupported) => {
                log::trace!("PCIe throughput not supported on {}", self.info.pci.bus_id);
                PciThroughputInfo::default()
            }
            rx => PciThroughputInfo {
                rx: kbps_to_mbps(rx?),
                tx: kbps_to_mbps(p.pcie_throughput(h, PcieDirection::Tx)?),
            },
        };

        let processes = running
            .into_iter()
            .map(|process| -> Result<ProcessInfo, NvmlError> {
                let name = p.process_name(process.pid, PROCESS_NAME_BUFFER_SIZE)?;
                Ok(ProcessInfo {
                    pid: process.pid,
                    name: fixed_buffer_text(&name, PROCESS_NAME_BUFFER_SIZE),
                    memory_used: bytes_to_mib(process.used_gpu_memory.unwrap_or(0)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DeviceStatus {
            power: milliwatts_to_watts(power),
            temperature,
            utilization: UtilizationInfo {
                gpu: usage.gpu,
                memory: usage.memory,
                encoder,
                decoder,
            },
            memory: MemoryInfo {
                global_used: bytes_to_mib(memory_used),
                ecc_errors,
            },
            clocks: ClockInfo {
                cores: clock_cores,
                memory: clock_memory,
            },
            pci: PciStatusInfo {
                bar1_used: bytes_to_mib(bar1.used),
                throughput,
            },
            processes,
        })
    }
}

impl<P: NvmlProvider> std::fmt::Debug for Device<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.handle)
            .field("info", &self.info)
            .finish()
    }
}

/// Read the NUMA node of a PCI device from sysfs
///
/// NUMA_NO_NODE (-1), and any other negative value, is reported as node 0.
pub fn numa_node(pci_devices_dir: &Path, bus_id: &str) -> Result<u32, AffinityError> {
    let path = pci_devices_dir
        .join(bus_id.to_lowercase())
        .join("numa_node");
    let content = std::fs::read_to_string(&path)?;
    let node: i8 = content.trim().parse()?;
    Ok(node.max(0) as u32)
}
