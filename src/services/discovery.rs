//! Device discovery
//!
//! Builds every device of a session and fills in its topology list.

use crate::domain::P2PLink;
use crate::error::DeviceError;
use crate::nvml::{Device, NvmlProvider, Session};

/// Build all devices and classify every ordered pair
///
/// Each device's topology gets one link per other device, in index order.
/// Any failure aborts the whole discovery.
pub fn lookup_devices<P: NvmlProvider>(
    session: &Session<P>,
) -> Result<Vec<Device<'_, P>>, DeviceError> {
    let count = session.device_count()?;
    let mut devices = (0..count)
        .map(|index| session.device(index))
        .collect::<Result<Vec<_>, _>>()?;

    let mut topologies = Vec::with_capacity(devices.len());
    for (i, device) in devices.iter().enumerate() {
        let mut links = Vec::with_capacity(devices.len().saturating_sub(1));
        for (j, peer) in devices.iter().enumerate() {
            if i == j {
                continue;
            }
            let link = session.p2p_link(device, peer)?;
            links.push(P2PLink::new(peer.info().pci.bus_id.clone(), link));
        }
        topologies.push(links);
    }

    for (device, links) in devices.iter_mut().zip(topologies) {
        device.set_topology(links);
    }

    log::debug!("Discovered {} GPU(s)", devices.len());
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::P2PLinkType;
    use crate::error::NvmlError;
    use crate::mock::FakeProvider;
    use crate::nvml::traits::topology_level;

    #[test]
    fn test_topology_populated() {
        let provider = FakeProvider::new(3)
            .with_topology(0, 1, Ok(topology_level::INTERNAL))
            .with_topology(0, 2, Ok(topology_level::SYSTEM))
            .with_topology(1, 2, Ok(topology_level::CPU));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let devices = lookup_devices(&session).unwrap();
        assert_eq!(devices.len(), 3);

        let first = devices[0].info();
        assert_eq!(first.topology.len(), 2);
        assert_eq!(first.topology[0].bus_id, "0000:0B:00.0");
        assert_eq!(first.topology[0].link, P2PLinkType::SameBoard);
        assert_eq!(first.topology[1].link, P2PLinkType::CrossCpu);

        let last = devices[2].info();
        assert_eq!(last.link_to("0000:0B:00.0").unwrap().link, P2PLinkType::SameCpu);
    }

    #[test]
    fn test_single_device_has_no_links() {
        let provider = FakeProvider::new(1);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let devices = lookup_devices(&session).unwrap();
        assert!(devices[0].info().topology.is_empty());
        assert_eq!(session.provider().calls("topology_common_ancestor"), 0);
    }

    #[test]
    fn test_old_driver_links_unknown() {
        let provider = FakeProvider::new(2);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let devices = lookup_devices(&session).unwrap();
        assert_eq!(devices[0].info().topology[0].link, P2PLinkType::Unknown);
        assert_eq!(devices[1].info().topology[0].link, P2PLinkType::Unknown);
    }

    #[test]
    fn test_unsupported_level_aborts() {
        let provider = FakeProvider::new(2).with_topology(0, 1, Ok(99));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        assert!(matches!(
            lookup_devices(&session),
            Err(DeviceError::UnsupportedP2PLink(99))
        ));
    }

    #[test]
    fn test_device_failure_aborts() {
        let provider = FakeProvider::new(2).fail("uuid", NvmlError::NotSupported);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        assert!(lookup_devices(&session).is_err());
    }
}
