//! P2P topology classification

use crate::domain::P2PLinkType;
use crate::error::{DeviceError, NvmlError};
use crate::nvml::device::Device;
use crate::nvml::traits::{topology_level, NvmlProvider};

/// Map a raw common-ancestor level to a link type
pub fn link_type(level: u32) -> Result<P2PLinkType, DeviceError> {
    match level {
        topology_level::INTERNAL => Ok(P2PLinkType::SameBoard),
        topology_level::SINGLE => Ok(P2PLinkType::SingleSwitch),
        topology_level::MULTIPLE => Ok(P2PLinkType::MultiSwitch),
        topology_level::HOSTBRIDGE => Ok(P2PLinkType::HostBridge),
        topology_level::CPU => Ok(P2PLinkType::SameCpu),
        topology_level::SYSTEM => Ok(P2PLinkType::CrossCpu),
        other => Err(DeviceError::UnsupportedP2PLink(other)),
    }
}

/// Classify the link between two devices
///
/// Drivers without the topology entry point yield `Unknown`, not an error.
pub fn p2p_link<P: NvmlProvider>(
    provider: &P,
    first: &Device<'_, P>,
    second: &Device<'_, P>,
) -> Result<P2PLinkType, DeviceError> {
    match provider.topology_common_ancestor(first.handle(), second.handle()) {
        Ok(level) => link_type(level),
        Err(NvmlError::FunctionNotFound) => Ok(P2PLinkType::Unknown),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeProvider;
    use crate::nvml::Session;

    #[test]
    fn test_known_levels() {
        let cases = [
            (topology_level::INTERNAL, P2PLinkType::SameBoard),
            (topology_level::SINGLE, P2PLinkType::SingleSwitch),
            (topology_level::MULTIPLE, P2PLinkType::MultiSwitch),
            (topology_level::HOSTBRIDGE, P2PLinkType::HostBridge),
            (topology_level::CPU, P2PLinkType::SameCpu),
            (topology_level::SYSTEM, P2PLinkType::CrossCpu),
        ];
        for (level, expected) in cases {
            assert_eq!(link_type(level).unwrap(), expected, "level {}", level);
        }
    }

    #[test]
    fn test_unknown_level_is_error() {
        assert!(matches!(
            link_type(60),
            Err(DeviceError::UnsupportedP2PLink(60))
        ));
        assert!(matches!(
            link_type(5),
            Err(DeviceError::UnsupportedP2PLink(5))
        ));
    }

    #[test]
    fn test_function_not_found_is_unknown() {
        let provider = FakeProvider::new(2);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let a = session.device(0).unwrap();
        let b = session.device(1).unwrap();
        assert_eq!(session.p2p_link(&a, &b).unwrap(), P2PLinkType::Unknown);
    }

    #[test]
    fn test_provider_error_propagates() {
        let provider = FakeProvider::new(2).with_topology(
            0,
            1,
            Err(NvmlError::Provider("Unknown Error".to_string())),
        );
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let a = session.device(0).unwrap();
        let b = session.device(1).unwrap();
        assert!(matches!(
            session.p2p_link(&a, &b),
            Err(DeviceError::Nvml(NvmlError::Provider(_)))
        ));
    }

    #[test]
    fn test_classified_pair() {
        let provider = FakeProvider::new(2).with_topology(0, 1, Ok(topology_level::SINGLE));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let a = session.device(0).unwrap();
        let b = session.device(1).unwrap();
        assert_eq!(session.p2p_link(&a, &b).unwrap(), P2PLinkType::SingleSwitch);
        assert_eq!(session.p2p_link(&b, &a).unwrap(), P2PLinkType::SingleSwitch);
    }
}
