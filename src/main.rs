//! nvprobe - NVML-based GPU discovery tool
//!
//! A command-line tool for enumerating NVIDIA GPUs, sampling their status
//! and mapping the peer-to-peer topology.

use clap::Parser;
use nvprobe::cli::args::{generate_completions, Cli, Commands};
use nvprobe::commands::{run_info, run_list, run_path, run_status, run_topology};
use nvprobe::error::{AppError, DeviceError, NvmlError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let config = cli.build_config()?;

    // Set log level based on verbose flag
    if config.general.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match &cli.command {
        Commands::List => run_list(&config, cli.format),

        Commands::Info => run_info(&config, cli.format, cli.gpu),

        Commands::Status(args) => run_status(args, &config, cli.format, cli.gpu),

        Commands::Topology => run_topology(&config, cli.format),

        Commands::Path { index } => run_path(&config, cli.format, *index),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    let nvml = match err {
        AppError::Nvml(e) => Some(e),
        AppError::Device(e) => e.as_nvml(),
        _ => None,
    };

    match (err, nvml) {
        (_, Some(NvmlError::LibraryNotFound)) => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      On Linux, install the nvidia-utils package.");
        }
        (AppError::Device(DeviceError::CpuAffinity(_)), _) => {
            eprintln!();
            eprintln!("Hint: NUMA information is read from sysfs.");
            eprintln!("      Check [sysfs] pci_devices_dir in the configuration.");
        }
        (AppError::NoGpusFound, _) => {
            eprintln!();
            eprintln!("Hint: Make sure you have an NVIDIA GPU installed.");
            eprintln!("      Check 'nvidia-smi' for GPU detection.");
        }
        _ => {}
    }
}
