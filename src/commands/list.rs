//! List command implementation
//!
//! Lists all detected NVIDIA GPUs.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DeviceList, DeviceListEntry};
use crate::commands::open_session;
use crate::config::Config;
use crate::error::Result;
use crate::nvml::{NvmlProvider, Session};

/// Execute the list command
pub fn run_list(config: &Config, format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;
    let list = device_list(&session)?;
    session.shutdown()?;

    print_output(&list, format)?;

    Ok(())
}

fn device_list<P: NvmlProvider>(session: &Session<P>) -> Result<DeviceList> {
    let driver_version = session.driver_version()?;
    let count = session.device_count()?;

    let mut gpus = Vec::with_capacity(count as usize);
    for i in 0..count {
        let device = session.device(i)?;
        gpus.push(DeviceListEntry::from(device.info()));
    }

    Ok(DeviceList {
        driver_version,
        gpus,
    })
}
