//! Topology command implementation
//!
//! Prints the pairwise P2P link matrix.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, TopologyMatrix};
use crate::commands::open_session;
use crate::config::Config;
use crate::domain::DeviceInfo;
use crate::error::{AppError, Result};
use crate::nvml::{NvmlProvider, Session};
use crate::services::lookup_devices;

/// Execute the topology command
pub fn run_topology(config: &Config, format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;
    let matrix = topology_matrix(&session)?;
    session.shutdown()?;

    print_output(&matrix, format)?;

    Ok(())
}

fn topology_matrix<P: NvmlProvider>(session: &Session<P>) -> Result<TopologyMatrix> {
    let infos: Vec<DeviceInfo> = lookup_devices(session)?
        .into_iter()
        .map(|d| d.into_info())
        .collect();

    if infos.is_empty() {
        return Err(AppError::NoGpusFound);
    }

    Ok(TopologyMatrix::from(infos.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::P2PLinkType;
    use crate::mock::FakeProvider;
    use crate::nvml::traits::topology_level;

    #[test]
    fn test_matrix_is_symmetric() {
        let provider = FakeProvider::new(3)
            .with_topology(0, 1, Ok(topology_level::MULTIPLE))
            .with_topology(0, 2, Ok(topology_level::SYSTEM));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let matrix = topology_matrix(&session).unwrap();
        assert_eq!(matrix.link(0, 1), Some(P2PLinkType::MultiSwitch));
        assert_eq!(matrix.link(1, 0), Some(P2PLinkType::MultiSwitch));
        assert_eq!(matrix.link(2, 0), Some(P2PLinkType::CrossCpu));
        // Pair without a reported level
        assert_eq!(matrix.link(1, 2), Some(P2PLinkType::Unknown));
    }
}
