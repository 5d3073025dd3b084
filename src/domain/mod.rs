//! Domain models for nvprobe
//!
//! Plain data produced by the NVML layer, plus the unit conversions that turn
//! NVML encodings into engineering units.

pub mod gpu;
pub mod status;
pub mod topology;
pub mod units;

pub use gpu::{ClockInfo, DeviceInfo, PciInfo};
pub use status::{
    DeviceStatus, EccErrorsInfo, MemoryInfo, PciStatusInfo, PciThroughputInfo, ProcessInfo,
    UtilizationInfo,
};
pub use topology::{P2PLink, P2PLinkType};
