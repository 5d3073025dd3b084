//! GPU descriptor domain types
//!
//! Static facts about a device, captured once at discovery time.

use crate::domain::topology::P2PLink;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clock speeds in MHz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInfo {
    /// SM (core) clock
    pub cores: u32,
    /// Memory clock
    pub memory: u32,
}

/// PCI location and bus capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciInfo {
    /// PCI bus id as reported by NVML (e.g. "0000:3B:00.0")
    pub bus_id: String,
    /// BAR1 capacity in MB
    pub bar1: u64,
    /// PCIe bandwidth ceiling in MB/s
    pub bandwidth: u32,
}

/// Static descriptor of a GPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Index the device was discovered at
    pub index: u32,
    /// Model name (e.g. "Tesla V100-SXM2-16GB")
    pub model: String,
    /// Unique GPU UUID
    pub uuid: String,
    /// Device special file
    pub path: String,
    /// Power management limit in watts
    pub power: u32,
    /// NUMA node the device is attached to
    pub cpu_affinity: u32,
    /// PCI location
    pub pci: PciInfo,
    /// Maximum clocks
    pub clocks: ClockInfo,
    /// Links to the other devices, filled in by discovery
    pub topology: Vec<P2PLink>,
}

impl DeviceInfo {
    /// Link to the peer with the given bus id, if known
    pub fn link_to(&self, bus_id: &str) -> Option<&P2PLink> {
        self.topology.iter().find(|l| l.bus_id == bus_id)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.model, self.pci.bus_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::P2PLinkType;

    fn sample() -> DeviceInfo {
        DeviceInfo {
            index: 0,
            model: "Tesla K80".to_string(),
            uuid: "GPU-0000".to_string(),
            path: "/dev/nvidia0".to_string(),
            power: 149,
            cpu_affinity: 0,
            pci: PciInfo {
                bus_id: "0000:04:00.0".to_string(),
                bar1: 16384,
                bandwidth: 15760,
            },
            clocks: ClockInfo {
                cores: 875,
                memory: 2505,
            },
            topology: vec![P2PLink::new("0000:05:00.0", P2PLinkType::SameBoard)],
        }
    }

    #[test]
    fn test_link_to() {
        let info = sample();
        assert_eq!(
            info.link_to("0000:05:00.0").map(|l| l.link),
            Some(P2PLinkType::SameBoard)
        );
        assert!(info.link_to("0000:06:00.0").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "[0] Tesla K80 (0000:04:00.0)");
    }
}
