//! Info command implementation
//!
//! Shows full device descriptors, topology included.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DeviceInfoList};
use crate::commands::{open_session, select_indices};
use crate::config::Config;
use crate::domain::DeviceInfo;
use crate::error::Result;
use crate::nvml::{NvmlProvider, Session};
use crate::services::lookup_devices;

/// Execute the info command
pub fn run_info(config: &Config, format: OutputFormat, gpu_index: Option<u32>) -> Result<()> {
    let session = open_session(config)?;
    let devices = device_infos(&session, gpu_index)?;
    session.shutdown()?;

    print_output(&DeviceInfoList { devices }, format)?;

    Ok(())
}

/// Discover every device, then keep the selected one
///
/// Topology needs all peers, so discovery always covers every device.
fn device_infos<P: NvmlProvider>(
    session: &Session<P>,
    gpu_index: Option<u32>,
) -> Result<Vec<DeviceInfo>> {
    let devices = lookup_devices(session)?;
    let indices = select_indices(devices.len() as u32, gpu_index)?;

    Ok(devices
        .into_iter()
        .map(|d| d.into_info())
        .filter(|info| indices.contains(&info.index))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::P2PLinkType;
    use crate::error::AppError;
    use crate::mock::FakeProvider;
    use crate::nvml::traits::topology_level;

    fn fake_session(provider: FakeProvider) -> (Session<FakeProvider>, tempfile::TempDir) {
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());
        (session, sysfs)
    }

    #[test]
    fn test_all_devices() {
        let (session, _sysfs) =
            fake_session(FakeProvider::new(2).with_topology(0, 1, Ok(topology_level::SINGLE)));

        let infos = device_infos(&session, None).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].topology[0].link, P2PLinkType::SingleSwitch);
        assert_eq!(infos[1].topology[0].bus_id, "0000:0A:00.0");
    }

    #[test]
    fn test_selected_device_keeps_topology() {
        let (session, _sysfs) =
            fake_session(FakeProvider::new(3).with_topology(1, 2, Ok(topology_level::HOSTBRIDGE)));

        let infos = device_infos(&session, Some(1)).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].index, 1);
        assert_eq!(infos[0].topology.len(), 2);
        assert_eq!(
            infos[0].link_to("0000:0C:00.0").map(|l| l.link),
            Some(P2PLinkType::HostBridge)
        );
    }

    #[test]
    fn test_no_devices() {
        let (session, _sysfs) = fake_session(FakeProvider::new(0));
        assert!(matches!(
            device_infos(&session, None),
            Err(AppError::NoGpusFound)
        ));
    }
}
