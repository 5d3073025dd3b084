//! NVML provider implementation
//!
//! Production [`NvmlProvider`] over nvml-wrapper. Handles are the raw
//! `nvmlDevice_t` pointers NVML hands out, rewrapped into a borrowed
//! `nvml_wrapper::Device` for each query.

use crate::error::NvmlError;
use crate::nvml::traits::{
    Bar1Memory, ClockKind, EccLocation, NvmlProvider, PcieDirection, RunningProcess,
    UtilizationRates,
};

use nvml_wrapper::enum_wrappers::device::{
    Clock, EccCounter, MemoryError, MemoryLocation, PcieUtilCounter, TemperatureSensor,
};
use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::error::NvmlError as WrapperError;
use nvml_wrapper::{Device, Nvml};
use nvml_wrapper_sys::bindings::nvmlDevice_t;

/// Raw NVML device handle
///
/// Only meaningful while the [`NvmlLibrary`] it came from is initialized.
#[derive(Debug, Clone, Copy)]
pub struct RawHandle(nvmlDevice_t);

/// Initialized NVML library
pub struct NvmlLibrary {
    nvml: Nvml,
}

impl NvmlLibrary {
    /// Load and initialize NVML
    pub fn init() -> Result<Self, NvmlError> {
        let nvml = Nvml::init().map_err(convert_error)?;
        Ok(Self { nvml })
    }

    fn device(&self, handle: RawHandle) -> Device<'_> {
        // SAFETY: handles only come from `handle_by_index` on this instance,
        // and `shutdown` consumes the instance, so the pointer is still valid.
        unsafe { Device::new(handle.0, &self.nvml) }
    }
}

/// Translate an nvml-wrapper error into ours
///
/// The one place NVML status codes are interpreted.
pub fn convert_error(err: WrapperError) -> NvmlError {
    match err {
        WrapperError::NotSupported => NvmlError::NotSupported,
        WrapperError::FunctionNotFound | WrapperError::FailedToLoadSymbol(_) => {
            NvmlError::FunctionNotFound
        }
        WrapperError::LibraryNotFound | WrapperError::LibloadingError(_) => {
            NvmlError::LibraryNotFound
        }
        other => NvmlError::Provider(other.to_string()),
    }
}

fn wrapper_clock(kind: ClockKind) -> Clock {
    match kind {
        ClockKind::Sm => Clock::SM,
        ClockKind::Memory => Clock::Memory,
    }
}

impl NvmlProvider for NvmlLibrary {
    type Handle = RawHandle;

    fn shutdown(self) -> Result<(), NvmlError> {
        self.nvml.shutdown().map_err(convert_error)
    }

    fn device_count(&self) -> Result<u32, NvmlError> {
        self.nvml.device_count().map_err(convert_error)
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        self.nvml.sys_driver_version().map_err(convert_error)
    }

    fn handle_by_index(&self, index: u32) -> Result<RawHandle, NvmlError> {
        let device = self.nvml.device_by_index(index).map_err(convert_error)?;
        // SAFETY: the pointer is copied out, not dereferenced
        Ok(RawHandle(unsafe { device.handle() }))
    }

    fn name(&self, device: RawHandle) -> Result<String, NvmlError> {
        self.device(device).name().map_err(convert_error)
    }

    fn uuid(&self, device: RawHandle) -> Result<String, NvmlError> {
        self.device(device).uuid().map_err(convert_error)
    }

    fn pci_bus_id(&self, device: RawHandle) -> Result<String, NvmlError> {
        self.device(device)
            .pci_info()
            .map(|pci| pci.bus_id)
            .map_err(convert_error)
    }

    fn minor_number(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device).minor_number().map_err(convert_error)
    }

    fn bar1_memory(&self, device: RawHandle) -> Result<Bar1Memory, NvmlError> {
        let bar1 = self
            .device(device)
            .bar1_memory_info()
            .map_err(convert_error)?;
        Ok(Bar1Memory {
            total: bar1.total,
            used: bar1.used,
        })
    }

    fn power_limit(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .power_management_limit()
            .map_err(convert_error)
    }

    fn power_usage(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device).power_usage().map_err(convert_error)
    }

    fn max_clock(&self, device: RawHandle, kind: ClockKind) -> Result<u32, NvmlError> {
        self.device(device)
            .max_clock_info(wrapper_clock(kind))
            .map_err(convert_error)
    }

    fn clock(&self, device: RawHandle, kind: ClockKind) -> Result<u32, NvmlError> {
        self.device(device)
            .clock_info(wrapper_clock(kind))
            .map_err(convert_error)
    }

    fn max_pcie_link_gen(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .max_pcie_link_gen()
            .map_err(convert_error)
    }

    fn max_pcie_link_width(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .max_pcie_link_width()
            .map_err(convert_error)
    }

    fn temperature(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .temperature(TemperatureSensor::Gpu)
            .map_err(convert_error)
    }

    fn utilization(&self, device: RawHandle) -> Result<UtilizationRates, NvmlError> {
        let util = self
            .device(device)
            .utilization_rates()
            .map_err(convert_error)?;
        Ok(UtilizationRates {
            gpu: util.gpu,
            memory: util.memory,
        })
    }

    fn encoder_utilization(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .encoder_utilization()
            .map(|u| u.utilization)
            .map_err(convert_error)
    }

    fn decoder_utilization(&self, device: RawHandle) -> Result<u32, NvmlError> {
        self.device(device)
            .decoder_utilization()
            .map(|u| u.utilization)
            .map_err(convert_error)
    }

    fn memory_used(&self, device: RawHandle) -> Result<u64, NvmlError> {
        self.device(device)
            .memory_info()
            .map(|mem| mem.used)
            .map_err(convert_error)
    }

    fn ecc_errors(&self, device: RawHandle, location: EccLocation) -> Result<u64, NvmlError> {
        let location = match location {
            EccLocation::L1Cache => MemoryLocation::L1Cache,
            EccLocation::L2Cache => MemoryLocation::L2Cache,
            EccLocation::DeviceMemory => MemoryLocation::Device,
        };
        self.device(device)
            .memory_error_counter(MemoryError::Uncorrected, EccCounter::Volatile, location)
            .map_err(convert_error)
    }

    fn pcie_throughput(
        &self,
        device: RawHandle,
        direction: PcieDirection,
    ) -> Result<u32, NvmlError> {
        let counter = match direction {
            PcieDirection::Rx => PcieUtilCounter::Receive,
            PcieDirection::Tx => PcieUtilCounter::Send,
        };
        self.device(device)
            .pcie_throughput(counter)
            .map_err(convert_error)
    }

    fn compute_processes(&self, device: RawHandle) -> Result<Vec<RunningProcess>, NvmlError> {
        let processes = self
            .device(device)
            .running_compute_processes()
            .map_err(convert_error)?;

        Ok(processes
            .into_iter()
            .map(|p| RunningProcess {
                pid: p.pid,
                used_gpu_memory: match p.used_gpu_memory {
                    UsedGpuMemory::Used(bytes) => Some(bytes),
                    UsedGpuMemory::Unavailable => None,
                },
            })
            .collect())
    }

    fn process_name(&self, pid: u32, max_len: usize) -> Result<String, NvmlError> {
        self.nvml
            .sys_process_name(pid, max_len)
            .map_err(convert_error)
    }

    fn topology_common_ancestor(
        &self,
        first: RawHandle,
        second: RawHandle,
    ) -> Result<u32, NvmlError> {
        match self
            .device(first)
            .topology_common_ancestor(self.device(second))
        {
            Ok(level) => Ok(level.as_c()),
            // Levels this nvml-wrapper does not know are classified upstream
            Err(WrapperError::UnexpectedVariant(raw)) => Ok(raw),
            Err(e) => Err(convert_error(e)),
        }
    }
}
