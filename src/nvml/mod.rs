//! NVML abstraction layer
//!
//! Provides a trait-based provider over NVML for testability, the session
//! that owns it, and the device descriptor, sampler and topology classifier
//! built on top.

pub mod device;
pub mod session;
pub mod topology;
pub mod traits;
pub mod wrapper;

pub use device::{Device, MAX_PROCESSES};
pub use session::Session;
pub use traits::NvmlProvider;
pub use wrapper::NvmlLibrary;
