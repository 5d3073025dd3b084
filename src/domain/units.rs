//! Unit conversions from NVML encodings
//!
//! All conversions truncate. Consumers compare these values against physical
//! limits, so no rounding is ever applied.

/// Capacity of the device name buffer (`NVML_DEVICE_NAME_BUFFER_SIZE`)
pub const DEVICE_NAME_BUFFER_SIZE: usize = 64;

/// Capacity of the device UUID buffer (`NVML_DEVICE_UUID_BUFFER_SIZE`)
pub const DEVICE_UUID_BUFFER_SIZE: usize = 80;

/// Capacity of the driver version buffer (`NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE`)
pub const DRIVER_VERSION_BUFFER_SIZE: usize = 80;

/// Capacity of the process name buffer
pub const PROCESS_NAME_BUFFER_SIZE: usize = 64;

const MIB: u64 = 1024 * 1024;

/// Per-lane PCIe bandwidth in MB/s, indexed by link generation
const PCIE_GEN_BANDWIDTH: [(u32, u32); 4] = [(1, 250), (2, 500), (3, 985), (4, 1969)];

/// Milliwatts to whole watts
#[inline]
pub const fn milliwatts_to_watts(mw: u32) -> u32 {
    mw / 1000
}

/// Bytes to whole MiB
#[inline]
pub const fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / MIB
}

/// KB/s to whole MB/s
#[inline]
pub const fn kbps_to_mbps(kbps: u32) -> u32 {
    kbps / 1000
}

/// Per-lane bandwidth of a PCIe generation, 0 if unknown
pub fn pcie_lane_bandwidth(generation: u32) -> u32 {
    PCIE_GEN_BANDWIDTH
        .iter()
        .find(|(gen, _)| *gen == generation)
        .map(|(_, mbps)| *mbps)
        .unwrap_or(0)
}

/// Bandwidth ceiling of a PCIe link in MB/s
pub fn pcie_bandwidth(generation: u32, width: u32) -> u32 {
    pcie_lane_bandwidth(generation).saturating_mul(width)
}

/// Clip text to what a null-terminated buffer of `capacity` bytes holds
///
/// The cut never splits a UTF-8 sequence.
pub fn fixed_buffer_text(text: &str, capacity: usize) -> String {
    let text = text.split('\0').next().unwrap_or_default();
    let max = capacity.saturating_sub(1);
    if text.len() <= max {
        return text.to_string();
    }

    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
