//! NVML session
//!
//! A [`Session`] spans one initialize/shutdown window of the provider.
//! Devices borrow the session, so none can be used after
//! [`Session::shutdown`].

use crate::domain::P2PLinkType;
use crate::domain::units::{fixed_buffer_text, DRIVER_VERSION_BUFFER_SIZE};
use crate::error::{DeviceError, NvmlError};
use crate::nvml::device::{device_path, Device, PCI_DEVICES_DIR};
use crate::nvml::topology;
use crate::nvml::traits::NvmlProvider;
use crate::nvml::wrapper::NvmlLibrary;

use std::path::PathBuf;

/// Initialized provider plus the host paths device discovery reads
pub struct Session<P: NvmlProvider> {
    provider: P,
    pci_devices_dir: PathBuf,
}

impl Session<NvmlLibrary> {
    /// Load NVML and open a session
    pub fn init() -> Result<Self, NvmlError> {
        let library = NvmlLibrary::init()?;
        log::debug!("NVML initialized");
        Ok(Self::new(library))
    }
}

impl<P: NvmlProvider> Session<P> {
    /// Wrap an already initialized provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            pci_devices_dir: PathBuf::from(PCI_DEVICES_DIR),
        }
    }

    /// Read NUMA attributes from another sysfs PCI device directory
    pub fn with_pci_devices_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pci_devices_dir = dir.into();
        self
    }

    /// Get a reference to the provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of devices NVML manages
    pub fn device_count(&self) -> Result<u32, NvmlError> {
        self.provider.device_count()
    }

    /// Host driver version
    pub fn driver_version(&self) -> Result<String, NvmlError> {
        let version = self.provider.driver_version()?;
        Ok(fixed_buffer_text(&version, DRIVER_VERSION_BUFFER_SIZE))
    }

    /// Build the descriptor of the device at `index`
    pub fn device(&self, index: u32) -> Result<Device<'_, P>, DeviceError> {
        Device::new(&self.provider, index, &self.pci_devices_dir)
    }

    /// Device special file of the device at `index`, without a full descriptor
    pub fn device_path(&self, index: u32) -> Result<String, NvmlError> {
        let handle = self.provider.handle_by_index(index)?;
        let minor = self.provider.minor_number(handle)?;
        Ok(device_path(minor))
    }

    /// Classify the P2P link between two devices of this session
    ///
    /// Devices built by another session are rejected.
    pub fn p2p_link<'s>(
        &'s self,
        first: &Device<'s, P>,
        second: &Device<'s, P>,
    ) -> Result<P2PLinkType, DeviceError> {
        if !first.belongs_to(&self.provider) || !second.belongs_to(&self.provider) {
            return Err(DeviceError::ForeignDevice);
        }
        topology::p2p_link(&self.provider, first, second)
    }

    /// Release the provider
    pub fn shutdown(self) -> Result<(), NvmlError> {
        log::debug!("Shutting down NVML");
        self.provider.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeDevice, FakeProvider};

    #[test]
    fn test_device_count_and_driver() {
        let session = Session::new(FakeProvider::new(3));
        assert_eq!(session.device_count().unwrap(), 3);
        assert_eq!(session.driver_version().unwrap(), "535.154.05");
    }

    #[test]
    fn test_driver_version_clipped_to_buffer() {
        let long = "9".repeat(120);
        let session = Session::new(FakeProvider::new(1).with_driver_version(long));
        assert_eq!(
            session.driver_version().unwrap().len(),
            DRIVER_VERSION_BUFFER_SIZE - 1
        );
    }

    #[test]
    fn test_device_count_error() {
        let provider = FakeProvider::new(1).fail(
            "device_count",
            NvmlError::Provider("Uninitialized".to_string()),
        );
        let session = Session::new(provider);
        assert_eq!(
            session.device_count().unwrap_err().to_string(),
            "nvml: Uninitialized"
        );
    }

    #[test]
    fn test_device_path_skips_descriptor() {
        let provider = FakeProvider::with_devices(vec![FakeDevice::new(0).with_minor(7)]);
        let session = Session::new(provider);

        assert_eq!(session.device_path(0).unwrap(), "/dev/nvidia7");
        assert_eq!(session.provider().calls("name"), 0);
        assert_eq!(session.provider().calls("bar1_memory"), 0);
    }

    #[test]
    fn test_device_path_invalid_index() {
        let session = Session::new(FakeProvider::new(1));
        assert!(session.device_path(4).is_err());
    }

    #[test]
    fn test_every_index_builds() {
        let provider = FakeProvider::new(4);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        for index in 0..session.device_count().unwrap() {
            let device = session.device(index).unwrap();
            assert_eq!(device.info().index, index);
            assert_eq!(device.info().path, format!("/dev/nvidia{}", index));
            assert!(!device.info().model.is_empty());
            assert!(device.info().topology.is_empty());
        }
    }

    #[test]
    fn test_p2p_link_rejects_other_session() {
        let first = FakeProvider::new(2).with_topology(0, 1, Ok(0));
        let second = FakeProvider::new(2).with_topology(0, 1, Ok(0));
        let sysfs = first.sysfs_tree();
        let session = Session::new(first).with_pci_devices_dir(sysfs.path());
        let other = Session::new(second).with_pci_devices_dir(sysfs.path());

        let a = session.device(0).unwrap();
        let b = session.device(1).unwrap();
        let foreign = other.device(1).unwrap();

        assert!(session.p2p_link(&a, &b).is_ok());
        assert!(matches!(
            session.p2p_link(&a, &foreign),
            Err(DeviceError::ForeignDevice)
        ));
        assert_eq!(session.provider().calls("topology_common_ancestor"), 1);
        assert_eq!(other.provider().calls("topology_common_ancestor"), 0);
    }

    #[test]
    fn test_shutdown() {
        let session = Session::new(FakeProvider::new(1));
        assert!(session.shutdown().is_ok());
    }
}
