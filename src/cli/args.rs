//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::config::{Config, ConfigBuilder};
use crate::error::ConfigError;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// NVML-based GPU discovery tool
///
/// Enumerate NVIDIA GPUs, sample their status and map the P2P topology.
#[derive(Parser, Debug)]
#[command(name = "nvprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NVPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target GPU by index (0-based)
    #[arg(long, global = true)]
    pub gpu: Option<u32>,

    /// Sysfs directory holding the PCI device entries (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub pci_devices_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all detected GPUs
    List,

    /// Show full device descriptors, including topology
    Info,

    /// Sample the live status of each GPU
    Status(StatusArgs),

    /// Show the pairwise P2P link matrix
    Topology,

    /// Print the device file of a GPU
    Path {
        /// GPU index (0-based)
        index: u32,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Merge the configuration file with the global flags
    pub fn build_config(&self) -> Result<Config, ConfigError> {
        ConfigBuilder::new()
            .with_file(self.config.as_deref())?
            .with_verbose(self.verbose.then_some(true))
            .with_pci_devices_dir(self.pci_devices_dir.clone())
            .build()
    }
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Keep sampling until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Sampling interval in seconds (overrides the config file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Stop after this many samples (implies --watch)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    /// Retry failed samples instead of exiting
    #[arg(long)]
    pub retry: bool,
}

impl StatusArgs {
    /// Number of rounds to sample, `None` meaning until interrupted
    pub fn rounds(&self) -> Option<u64> {
        match (self.watch, self.count) {
            (_, Some(count)) => Some(count),
            (true, None) => None,
            (false, None) => Some(1),
        }
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parse_list() {
        let args = Cli::try_parse_from(["nvprobe", "list"]).unwrap();
        assert!(matches!(args.command, Commands::List));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["nvprobe", "-v", "info"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_gpu_selection() {
        let args = Cli::try_parse_from(["nvprobe", "status", "--gpu", "1"]).unwrap();
        assert_eq!(args.gpu, Some(1));
    }

    #[test]
    fn test_cli_parse_format() {
        let args = Cli::try_parse_from(["nvprobe", "--format", "json", "topology"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
        assert!(matches!(args.command, Commands::Topology));
    }

    #[test]
    fn test_cli_parse_pci_devices_dir() {
        let args =
            Cli::try_parse_from(["nvprobe", "info", "--pci-devices-dir", "/tmp/pci"]).unwrap();
        assert_eq!(args.pci_devices_dir, Some(PathBuf::from("/tmp/pci")));

        let args = Cli::try_parse_from(["nvprobe", "info"]).unwrap();
        assert!(args.pci_devices_dir.is_none());
    }

    #[test]
    fn test_build_config_applies_flags_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sysfs]\npci_devices_dir = \"/from/file\"").unwrap();
        let config_path = file.path().to_str().unwrap();

        let args = Cli::try_parse_from(["nvprobe", "--config", config_path, "list"]).unwrap();
        let config = args.build_config().unwrap();
        assert_eq!(config.sysfs.pci_devices_dir, PathBuf::from("/from/file"));
        assert!(!config.general.verbose);

        let args = Cli::try_parse_from([
            "nvprobe",
            "--config",
            config_path,
            "--pci-devices-dir",
            "/from/flag",
            "-v",
            "list",
        ])
        .unwrap();
        let config = args.build_config().unwrap();
        assert_eq!(config.sysfs.pci_devices_dir, PathBuf::from("/from/flag"));
        assert!(config.general.verbose);
    }

    #[test]
    fn test_cli_parse_path() {
        let args = Cli::try_parse_from(["nvprobe", "path", "3"]).unwrap();
        if let Commands::Path { index } = args.command {
            assert_eq!(index, 3);
        } else {
            panic!("Expected Path command");
        }
    }

    #[test]
    fn test_cli_path_requires_index() {
        assert!(Cli::try_parse_from(["nvprobe", "path"]).is_err());
    }

    #[test]
    fn test_cli_parse_status_watch() {
        let args = Cli::try_parse_from([
            "nvprobe",
            "status",
            "--watch",
            "--interval",
            "2",
            "--retry",
        ])
        .unwrap();

        if let Commands::Status(status) = args.command {
            assert!(status.watch);
            assert!(status.retry);
            assert_eq!(status.interval, Some(2));
            assert_eq!(status.rounds(), None);
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_status_rounds() {
        let args = Cli::try_parse_from(["nvprobe", "status"]).unwrap();
        if let Commands::Status(status) = args.command {
            assert_eq!(status.rounds(), Some(1));
        } else {
            panic!("Expected Status command");
        }

        let args = Cli::try_parse_from(["nvprobe", "status", "-n", "4"]).unwrap();
        if let Commands::Status(status) = args.command {
            assert_eq!(status.rounds(), Some(4));
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_zero_interval_rejected() {
        let result = Cli::try_parse_from(["nvprobe", "status", "--interval", "0"]);
        assert!(result.is_err());
    }
}
