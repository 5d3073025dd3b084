//! Fake NVML provider for testing
//!
//! Provides a scripted [`NvmlProvider`] with per-query call counters and
//! failure injection, for unit testing without real hardware.

use crate::error::NvmlError;
use crate::nvml::traits::{
    Bar1Memory, ClockKind, EccLocation, NvmlProvider, PcieDirection, RunningProcess,
    UtilizationRates,
};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Scripted GPU
#[derive(Debug, Clone)]
pub struct FakeDevice {
    name: String,
    uuid: String,
    bus_id: String,
    minor: u32,
    numa_node: String,
    bar1: Bar1Memory,
    power_limit: u32,
    power_usage: u32,
    max_clocks: (u32, u32),
    clocks: (u32, u32),
    pcie: (u32, u32),
    temperature: u32,
    utilization: UtilizationRates,
    encoder: u32,
    decoder: u32,
    memory_used: u64,
    ecc: Option<[u64; 3]>,
    pcie_throughput: Option<(u32, u32)>,
    processes: Vec<RunningProcess>,
}

impl FakeDevice {
    /// Create a new fake device with default values
    ///
    /// ECC counters and PCIe throughput are not supported by default.
    pub fn new(index: u32) -> Self {
        Self {
            name: format!("Fake GPU {}", index),
            uuid: format!("GPU-FAKE-{:04}", index),
            bus_id: format!("0000:{:02X}:00.0", 0x0A + index),
            minor: index,
            numa_node: "1\n".to_string(),
            bar1: Bar1Memory {
                total: 256 * 1024 * 1024,
                used: 0,
            },
            power_limit: 250_000,
            power_usage: 100_000,
            max_clocks: (1530, 877),
            clocks: (1200, 850),
            pcie: (3, 16),
            temperature: 65,
            utilization: UtilizationRates {
                gpu: 40,
                memory: 20,
            },
            encoder: 5,
            decoder: 7,
            memory_used: 0,
            ecc: None,
            pcie_throughput: None,
            processes: Vec::new(),
        }
    }

    /// Builder: set model name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set PCI bus id
    pub fn with_bus_id(mut self, bus_id: impl Into<String>) -> Self {
        self.bus_id = bus_id.into();
        self
    }

    /// Builder: set minor number
    pub fn with_minor(mut self, minor: u32) -> Self {
        self.minor = minor;
        self
    }

    /// Builder: set raw numa_node file content
    pub fn with_numa_node(mut self, content: impl Into<String>) -> Self {
        self.numa_node = content.into();
        self
    }

    /// Builder: set BAR1 total/used bytes
    pub fn with_bar1(mut self, total: u64, used: u64) -> Self {
        self.bar1 = Bar1Memory { total, used };
        self
    }

    /// Builder: set power limit in milliwatts
    pub fn with_power_limit(mut self, mw: u32) -> Self {
        self.power_limit = mw;
        self
    }

    /// Builder: set power usage in milliwatts
    pub fn with_power_usage(mut self, mw: u32) -> Self {
        self.power_usage = mw;
        self
    }

    /// Builder: set max PCIe generation and width
    pub fn with_pcie(mut self, generation: u32, width: u32) -> Self {
        self.pcie = (generation, width);
        self
    }

    /// Builder: set used memory in bytes
    pub fn with_memory_used(mut self, bytes: u64) -> Self {
        self.memory_used = bytes;
        self
    }

    /// Builder: report ECC counters (L1, L2, device memory)
    pub fn with_ecc(mut self, counters: [u64; 3]) -> Self {
        self.ecc = Some(counters);
        self
    }

    /// Builder: report PCIe throughput in KB/s
    pub fn with_pcie_throughput(mut self, rx: u32, tx: u32) -> Self {
        self.pcie_throughput = Some((rx, tx));
        self
    }

    /// Builder: set running compute processes as (pid, used bytes)
    pub fn with_processes(mut self, processes: Vec<(u32, Option<u64>)>) -> Self {
        self.processes = processes
            .into_iter()
            .map(|(pid, used_gpu_memory)| RunningProcess {
                pid,
                used_gpu_memory,
            })
            .collect();
        self
    }
}

/// Scripted NVML provider
pub struct FakeProvider {
    devices: Vec<FakeDevice>,
    driver_version: String,
    process_names: HashMap<u32, String>,
    topology: HashMap<(u32, u32), Result<u32, NvmlError>>,
    failures: HashMap<String, NvmlError>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeProvider {
    /// Create a provider with `device_count` default devices
    pub fn new(device_count: u32) -> Self {
        Self::with_devices((0..device_count).map(FakeDevice::new).collect())
    }

    /// Create a provider with custom devices
    pub fn with_devices(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            driver_version: "535.154.05".to_string(),
            process_names: HashMap::new(),
            topology: HashMap::new(),
            failures: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Make every call of `query` fail with `err`
    ///
    /// Queries taking a location or direction are keyed as
    /// `"ecc_errors:L2Cache"` or `"pcie_throughput:Tx"`.
    pub fn fail(mut self, query: &str, err: NvmlError) -> Self {
        self.failures.insert(query.to_string(), err);
        self
    }

    /// Set the name reported for a PID
    pub fn with_process_name(mut self, pid: u32, name: impl Into<String>) -> Self {
        self.process_names.insert(pid, name.into());
        self
    }

    /// Set the driver version string
    pub fn with_driver_version(mut self, version: impl Into<String>) -> Self {
        self.driver_version = version.into();
        self
    }

    /// Set the common-ancestor answer for a device pair, both directions
    ///
    /// Pairs without an answer report `FunctionNotFound`.
    pub fn with_topology(mut self, a: u32, b: u32, level: Result<u32, NvmlError>) -> Self {
        self.topology.insert((a, b), level.clone());
        self.topology.insert((b, a), level);
        self
    }

    /// Number of times `query` was called
    pub fn calls(&self, query: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(query)
            .copied()
            .unwrap_or(0)
    }

    /// Write a numa_node file for every device under `dir`
    pub fn write_sysfs(&self, dir: &Path) -> std::io::Result<()> {
        for device in &self.devices {
            let device_dir = dir.join(device.bus_id.to_lowercase());
            std::fs::create_dir_all(&device_dir)?;
            std::fs::write(device_dir.join("numa_node"), &device.numa_node)?;
        }
        Ok(())
    }

    /// Scratch sysfs tree matching the fake devices
    #[cfg(test)]
    pub fn sysfs_tree(&self) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        self.write_sysfs(dir.path()).unwrap();
        dir
    }

    fn record(&self, query: &str) -> Result<(), NvmlError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(query.to_string())
            .or_insert(0) += 1;

        match self.failures.get(query) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn device(&self, handle: u32) -> &FakeDevice {
        &self.devices[handle as usize]
    }
}

impl NvmlProvider for FakeProvider {
    type Handle = u32;

    fn shutdown(self) -> Result<(), NvmlError> {
        self.record("shutdown")
    }

    fn device_count(&self) -> Result<u32, NvmlError> {
        self.record("device_count")?;
        Ok(self.devices.len() as u32)
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        self.record("driver_version")?;
        Ok(self.driver_version.clone())
    }

    fn handle_by_index(&self, index: u32) -> Result<u32, NvmlError> {
        self.record("handle_by_index")?;
        if (index as usize) < self.devices.len() {
            Ok(index)
        } else {
            Err(NvmlError::Provider("Invalid Argument".to_string()))
        }
    }

    fn name(&self, device: u32) -> Result<String, NvmlError> {
        self.record("name")?;
        Ok(self.device(device).name.clone())
    }

    fn uuid(&self, device: u32) -> Result<String, NvmlError> {
        self.record("uuid")?;
        Ok(self.device(device).uuid.clone())
    }

    fn pci_bus_id(&self, device: u32) -> Result<String, NvmlError> {
        self.record("pci_bus_id")?;
        Ok(self.device(device).bus_id.clone())
    }

    fn minor_number(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("minor_number")?;
        Ok(self.device(device).minor)
    }

    fn bar1_memory(&self, device: u32) -> Result<Bar1Memory, NvmlError> {
        self.record("bar1_memory")?;
        Ok(self.device(device).bar1)
    }

    fn power_limit(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("power_limit")?;
        Ok(self.device(device).power_limit)
    }

    fn power_usage(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("power_usage")?;
        Ok(self.device(device).power_usage)
    }

    fn max_clock(&self, device: u32, kind: ClockKind) -> Result<u32, NvmlError> {
        self.record("max_clock")?;
        let (sm, mem) = self.device(device).max_clocks;
        Ok(match kind {
            ClockKind::Sm => sm,
            ClockKind::Memory => mem,
        })
    }

    fn clock(&self, device: u32, kind: ClockKind) -> Result<u32, NvmlError> {
        self.record("clock")?;
        let (sm, mem) = self.device(device).clocks;
        Ok(match kind {
            ClockKind::Sm => sm,
            ClockKind::Memory => mem,
        })
    }

    fn max_pcie_link_gen(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("max_pcie_link_gen")?;
        Ok(self.device(device).pcie.0)
    }

    fn max_pcie_link_width(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("max_pcie_link_width")?;
        Ok(self.device(device).pcie.1)
    }

    fn temperature(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("temperature")?;
        Ok(self.device(device).temperature)
    }

    fn utilization(&self, device: u32) -> Result<UtilizationRates, NvmlError> {
        self.record("utilization")?;
        Ok(self.device(device).utilization)
    }

    fn encoder_utilization(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("encoder_utilization")?;
        Ok(self.device(device).encoder)
    }

    fn decoder_utilization(&self, device: u32) -> Result<u32, NvmlError> {
        self.record("decoder_utilization")?;
        Ok(self.device(device).decoder)
    }

    fn memory_used(&self, device: u32) -> Result<u64, NvmlError> {
        self.record("memory_used")?;
        Ok(self.device(device).memory_used)
    }

    fn ecc_errors(&self, device: u32, location: EccLocation) -> Result<u64, NvmlError> {
        self.record(&format!("ecc_errors:{:?}", location))?;
        let counters = self.device(device).ecc.ok_or(NvmlError::NotSupported)?;
        Ok(match location {
            EccLocation::L1Cache => counters[0],
            EccLocation::L2Cache => counters[1],
            EccLocation::DeviceMemory => counters[2],
        })
    }

    fn pcie_throughput(&self, device: u32, direction: PcieDirection) -> Result<u32, NvmlError> {
        self.record(&format!("pcie_throughput:{:?}", direction))?;
        let (rx, tx) = self
            .device(device)
            .pcie_throughput
            .ok_or(NvmlError::NotSupported)?;
        Ok(match direction {
            PcieDirection::Rx => rx,
            PcieDirection::Tx => tx,
        })
    }

    fn compute_processes(&self, device: u32) -> Result<Vec<RunningProcess>, NvmlError> {
        self.record("compute_processes")?;
        Ok(self.device(device).processes.clone())
    }

    fn process_name(&self, pid: u32, _max_len: usize) -> Result<String, NvmlError> {
        self.record("process_name")?;
        Ok(self
            .process_names
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| format!("proc-{}", pid)))
    }

    fn topology_common_ancestor(&self, first: u32, second: u32) -> Result<u32, NvmlError> {
        self.record("topology_common_ancestor")?;
        self.topology
            .get(&(first, second))
            .cloned()
            .unwrap_or(Err(NvmlError::FunctionNotFound))
    }
}
