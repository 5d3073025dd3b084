//! Unified error types for nvprobe
//!
//! Provider failures, descriptor/topology failures and CLI-level failures are
//! kept in separate layers. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from NVML operations
    #[error("{0}")]
    Nvml(#[from] NvmlError),

    /// Error while building a device descriptor or classifying topology
    #[error("{0}")]
    Device(#[from] DeviceError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No GPUs detected in the system
    #[error("No NVIDIA GPUs detected")]
    NoGpusFound,

    /// GPU index out of range
    #[error("GPU index {index} out of range (found {count} device(s))")]
    GpuIndexOutOfRange { index: u32, count: u32 },

    /// IO error (output, file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the capability provider
///
/// Every non-success NVML status lands here. `NotSupported` and
/// `FunctionNotFound` are kept apart so callers can treat them as degraded
/// capability rather than failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NvmlError {
    /// NVML shared library not found
    #[error("Could not load NVML library")]
    LibraryNotFound,

    /// Query not supported by this GPU
    #[error("nvml: Not Supported")]
    NotSupported,

    /// Entry point missing from the loaded library (older driver)
    #[error("nvml: Function Not Found")]
    FunctionNotFound,

    /// Any other provider status, with the provider's message
    #[error("nvml: {0}")]
    Provider(String),
}

/// Failure to resolve the NUMA node of a device
#[derive(Error, Debug)]
pub enum AffinityError {
    /// The numa_node attribute could not be read
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The numa_node attribute did not hold a small signed integer
    #[error("{0}")]
    Parse(#[from] std::num::ParseIntError),
}

/// Errors from building a device descriptor or classifying a P2P link
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Provider query failed
    #[error(transparent)]
    Nvml(#[from] NvmlError),

    /// CPU affinity could not be resolved from sysfs
    #[error("failed to retrieve CPU affinity: {0}")]
    CpuAffinity(#[source] AffinityError),

    /// Topology level outside the known mapping
    #[error("unsupported P2P link type (topology level {0})")]
    UnsupportedP2PLink(u32),

    /// Device built by a different session
    #[error("device belongs to another NVML session")]
    ForeignDevice,
}

impl DeviceError {
    /// Returns the provider error if this failure came from NVML
    pub fn as_nvml(&self) -> Option<&NvmlError> {
        match self {
            DeviceError::Nvml(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
