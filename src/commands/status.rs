//! Status command implementation
//!
//! Samples the live status of each GPU once, or repeatedly with `--watch`.

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::output::{print_output, DeviceStatusEntry, StatusOutput};
use crate::commands::{open_session, select_indices};
use crate::config::{Config, ConfigBuilder};
use crate::error::Result;
use crate::nvml::{Device, NvmlProvider, Session};
use crate::services::monitor::Round;
use crate::services::StatusMonitor;

/// Execute the status command
pub fn run_status(
    args: &StatusArgs,
    config: &Config,
    format: OutputFormat,
    gpu_index: Option<u32>,
) -> Result<()> {
    let config = ConfigBuilder::from(config.clone())
        .with_interval(args.interval)
        .with_retry(args.retry.then_some(true))
        .build()?;
    let monitor = StatusMonitor::new(config.to_monitor_config(args.rounds()));

    let session = open_session(&config)?;
    watch_then_shutdown(session, &monitor, gpu_index, |output| {
        print_output(output, format)?;
        Ok(())
    })
}

/// Run the watch and always shut the session down
///
/// A sampling error takes precedence over a shutdown error.
fn watch_then_shutdown<P, F>(
    session: Session<P>,
    monitor: &StatusMonitor,
    gpu_index: Option<u32>,
    emit: F,
) -> Result<()>
where
    P: NvmlProvider,
    F: FnMut(&StatusOutput) -> Result<()>,
{
    let result = watch(&session, monitor, gpu_index, emit);
    let shutdown = session.shutdown();

    result?;
    shutdown?;
    Ok(())
}

fn watch<P, F>(
    session: &Session<P>,
    monitor: &StatusMonitor,
    gpu_index: Option<u32>,
    mut emit: F,
) -> Result<()>
where
    P: NvmlProvider,
    F: FnMut(&StatusOutput) -> Result<()>,
{
    let indices = select_indices(session.device_count()?, gpu_index)?;
    let devices = indices
        .into_iter()
        .map(|i| session.device(i))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    log::debug!(
        "Sampling {} GPU(s) every {:?}",
        devices.len(),
        monitor.config().interval
    );

    monitor.run(&devices, |round| emit(&status_output(&devices, round)))
}

fn status_output<P: NvmlProvider>(devices: &[Device<'_, P>], round: &Round) -> StatusOutput {
    StatusOutput {
        devices: round
            .iter()
            .map(|(index, status)| DeviceStatusEntry {
                index: *index,
                model: devices
                    .iter()
                    .find(|d| d.info().index == *index)
                    .map(|d| d.info().model.clone())
                    .unwrap_or_default(),
                status: status.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, NvmlError};
    use crate::mock::{FakeDevice, FakeProvider};
    use crate::services::MonitorConfig;
    use std::time::Duration;

    fn monitor(count: u64) -> StatusMonitor {
        StatusMonitor::new(MonitorConfig {
            interval: Duration::ZERO,
            count: Some(count),
            ..Default::default()
        })
    }

    #[test]
    fn test_single_sample_all_devices() {
        let provider = FakeProvider::with_devices(vec![
            FakeDevice::new(0).with_name("Tesla P100"),
            FakeDevice::new(1).with_processes(vec![(100, Some(1_048_576))]),
        ]);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let mut outputs = Vec::new();
        watch(&session, &monitor(1), None, |o| {
            outputs.push(o.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(outputs.len(), 1);
        let devices = &outputs[0].devices;
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].model, "Tesla P100");
        assert_eq!(devices[1].status.processes[0].name, "proc-100");
        assert_eq!(devices[1].status.processes[0].memory_used, 1);
    }

    #[test]
    fn test_selected_gpu_only() {
        let provider = FakeProvider::new(3);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let mut outputs = Vec::new();
        watch(&session, &monitor(2), Some(2), |o| {
            outputs.push(o.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].devices.len(), 1);
        assert_eq!(outputs[1].devices[0].index, 2);
        assert_eq!(session.provider().calls("name"), 1);
    }

    #[test]
    fn test_sample_error_wins_over_shutdown_error() {
        let provider = FakeProvider::new(1)
            .fail("temperature", NvmlError::NotSupported)
            .fail("shutdown", NvmlError::Provider("Uninitialized".to_string()));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let result = watch_then_shutdown(session, &monitor(1), None, |_| Ok(()));
        assert!(matches!(result, Err(AppError::Nvml(NvmlError::NotSupported))));
    }

    #[test]
    fn test_shutdown_error_reported_after_clean_watch() {
        let provider = FakeProvider::new(1)
            .fail("shutdown", NvmlError::Provider("Uninitialized".to_string()));
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let mut rounds = 0;
        let result = watch_then_shutdown(session, &monitor(2), None, |_| {
            rounds += 1;
            Ok(())
        });
        assert_eq!(rounds, 2);
        assert!(matches!(
            result,
            Err(AppError::Nvml(NvmlError::Provider(_)))
        ));
    }

    #[test]
    fn test_sample_failure_propagates() {
        let provider = FakeProvider::new(1).fail("utilization", NvmlError::NotSupported);
        let sysfs = provider.sysfs_tree();
        let session = Session::new(provider).with_pci_devices_dir(sysfs.path());

        let result = watch(&session, &monitor(1), None, |_| Ok(()));
        assert!(matches!(result, Err(AppError::Nvml(NvmlError::NotSupported))));
    }
}
