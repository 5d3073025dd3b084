//! Peer-to-peer topology types
//!
//! Link types are ranked by physical proximity between two GPUs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interconnect class between two devices, weakest first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum P2PLinkType {
    /// Topology could not be queried
    #[default]
    Unknown,
    /// Devices hang off different CPU sockets
    CrossCpu,
    /// Devices share a CPU socket
    SameCpu,
    /// Devices share a host PCI bridge
    HostBridge,
    /// Devices are connected through multiple PCIe switches
    MultiSwitch,
    /// Devices are connected through a single PCIe switch
    SingleSwitch,
    /// Devices sit on the same board
    SameBoard,
}

impl P2PLinkType {
    /// Short label for matrix output
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::CrossCpu => "SYS",
            Self::SameCpu => "NODE",
            Self::HostBridge => "PHB",
            Self::MultiSwitch => "PXB",
            Self::SingleSwitch => "PIX",
            Self::SameBoard => "BRD",
        }
    }
}

impl fmt::Display for P2PLinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CrossCpu => "Cross CPU socket",
            Self::SameCpu => "Same CPU socket",
            Self::HostBridge => "Host PCI bridge",
            Self::MultiSwitch => "Multiple PCI switches",
            Self::SingleSwitch => "Single PCI switch",
            Self::SameBoard => "Same board",
            Self::Unknown => "???",
        };
        write!(f, "{}", s)
    }
}

/// Link from a device to one of its peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PLink {
    /// PCI bus id of the peer device
    pub bus_id: String,
    /// Classified link type
    pub link: P2PLinkType,
}

impl P2PLink {
    pub fn new(bus_id: impl Into<String>, link: P2PLinkType) -> Self {
        Self {
            bus_id: bus_id.into(),
            link,
        }
    }
}
