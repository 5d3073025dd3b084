//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod info;
pub mod list;
pub mod path;
pub mod status;
pub mod topology;

pub use info::run_info;
pub use list::run_list;
pub use path::run_path;
pub use status::run_status;
pub use topology::run_topology;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::nvml::{NvmlLibrary, Session};

/// Open an NVML session reading sysfs from the configured location
fn open_session(config: &Config) -> Result<Session<NvmlLibrary>> {
    let session = Session::init()?.with_pci_devices_dir(&config.sysfs.pci_devices_dir);
    Ok(session)
}

/// Indices to operate on: the selected GPU, or all of them
fn select_indices(count: u32, gpu: Option<u32>) -> Result<Vec<u32>> {
    if count == 0 {
        return Err(AppError::NoGpusFound);
    }

    match gpu {
        Some(index) if index >= count => Err(AppError::GpuIndexOutOfRange { index, count }),
        Some(index) => Ok(vec![index]),
        None => Ok((0..count).collect()),
    }
}
