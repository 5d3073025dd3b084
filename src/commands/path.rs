//! Path command implementation
//!
//! Prints the device file of a single GPU without building its descriptor.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DevicePathOutput};
use crate::commands::{open_session, select_indices};
use crate::config::Config;
use crate::error::Result;
use crate::nvml::{NvmlProvider, Session};

/// Execute the path command
pub fn run_path(config: &Config, format: OutputFormat, index: u32) -> Result<()> {
    let session = open_session(config)?;
    let output = device_path(&session, index)?;
    session.shutdown()?;

    print_output(&output, format)?;

    Ok(())
}

fn device_path<P: NvmlProvider>(session: &Session<P>, index: u32) -> Result<DevicePathOutput> {
    select_indices(session.device_count()?, Some(index))?;
    let path = session.device_path(index)?;
    Ok(DevicePathOutput { index, path })
}
