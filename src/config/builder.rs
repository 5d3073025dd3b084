//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// locations are tried and a missing file is not an error.
    pub fn with_file(mut self, path: Option<&Path>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.config.general.verbose = v;
        }
        self
    }

    /// Override with CLI interval
    pub fn with_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.config.general.interval_seconds = i;
        }
        self
    }

    /// Override with CLI retry flag
    pub fn with_retry(mut self, retry: Option<bool>) -> Self {
        if let Some(r) = retry {
            self.config.general.retry = r;
        }
        self
    }

    /// Override the sysfs PCI devices directory
    pub fn with_pci_devices_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(d) = dir {
            self.config.sysfs.pci_devices_dir = d;
        }
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Config> for ConfigBuilder {
    fn from(config: Config) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(!config.general.verbose);
        assert!(!config.general.retry);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_verbose(Some(true))
            .with_interval(Some(10))
            .with_retry(Some(true))
            .with_pci_devices_dir(Some(PathBuf::from("/tmp/pci")))
            .build()
            .unwrap();

        assert!(config.general.verbose);
        assert!(config.general.retry);
        assert_eq!(config.general.interval_seconds, 10);
        assert_eq!(config.sysfs.pci_devices_dir, PathBuf::from("/tmp/pci"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\ninterval_seconds = 30\nverbose = true").unwrap();

        let config = ConfigBuilder::new()
            .with_file(Some(file.path()))
            .unwrap()
            .with_interval(Some(2))
            .with_verbose(None)
            .build()
            .unwrap();

        assert_eq!(config.general.interval_seconds, 2);
        assert!(config.general.verbose);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = ConfigBuilder::new().with_file(Some(Path::new("/nonexistent/nvprobe.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_build_rejects_zero_interval() {
        let result = ConfigBuilder::new().with_interval(Some(0)).build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
