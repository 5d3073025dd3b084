//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::{DeviceInfo, DeviceStatus, P2PLink, P2PLinkType};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// GPU list entry for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceListEntry {
    pub index: u32,
    pub model: String,
    pub uuid: String,
    pub path: String,
    pub bus_id: String,
}

impl From<&DeviceInfo> for DeviceListEntry {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            index: info.index,
            model: info.model.clone(),
            uuid: info.uuid.clone(),
            path: info.path.clone(),
            bus_id: info.pci.bus_id.clone(),
        }
    }
}

impl TableDisplay for DeviceListEntry {
    fn to_table(&self) -> String {
        format!(
            "[{}] {} ({}, {}, UUID: {})",
            self.index, self.model, self.bus_id, self.path, self.uuid
        )
    }

    fn to_compact(&self) -> String {
        format!("{}:{}", self.index, self.model)
    }
}

/// GPU list for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceList {
    pub driver_version: String,
    pub gpus: Vec<DeviceListEntry>,
}

impl TableDisplay for DeviceList {
    fn to_table(&self) -> String {
        let mut output = format!("Driver Version: {}\n", self.driver_version);
        output.push_str(&format!("GPUs Found: {}\n\n", self.gpus.len()));

        for gpu in &self.gpus {
            output.push_str(&gpu.to_table());
            output.push('\n');
        }

        output
    }

    fn to_compact(&self) -> String {
        self.gpus
            .iter()
            .map(|g| g.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TableDisplay for DeviceInfo {
    fn to_table(&self) -> String {
        let mut output = format!("[{}] {}\n", self.index, self.model);
        output.push_str(&format!("  UUID: {}\n", self.uuid));
        output.push_str(&format!("  Path: {}\n", self.path));
        output.push_str(&format!("  Power Limit: {}W\n", self.power));
        output.push_str(&format!("  NUMA Node: {}\n", self.cpu_affinity));
        output.push_str(&format!("  PCI Bus: {}\n", self.pci.bus_id));
        output.push_str(&format!("  BAR1: {} MB\n", self.pci.bar1));
        output.push_str(&format!("  PCIe Bandwidth: {} MB/s\n", self.pci.bandwidth));
        output.push_str(&format!(
            "  Max Clocks: {} MHz (SM), {} MHz (Memory)\n",
            self.clocks.cores, self.clocks.memory
        ));

        if !self.topology.is_empty() {
            output.push_str("  Topology:\n");
            for link in &self.topology {
                output.push_str(&format!("    {}: {}\n", link.bus_id, link.link));
            }
        }

        output
    }

    fn to_compact(&self) -> String {
        format!(
            "{}:{} {} {}W numa{}",
            self.index, self.model, self.pci.bus_id, self.power, self.cpu_affinity
        )
    }
}

/// Device descriptors for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfoList {
    pub devices: Vec<DeviceInfo>,
}

impl TableDisplay for DeviceInfoList {
    fn to_table(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Status of one GPU for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatusEntry {
    pub index: u32,
    pub model: String,
    pub status: DeviceStatus,
}

impl TableDisplay for DeviceStatusEntry {
    fn to_table(&self) -> String {
        let s = &self.status;
        let mut output = format!("[{}] {}\n", self.index, self.model);
        output.push_str(&format!("  Power: {}W\n", s.power));
        output.push_str(&format!("  Temperature: {}°C\n", s.temperature));
        output.push_str(&format!(
            "  Utilization: GPU {}%, Memory {}%, Encoder {}%, Decoder {}%\n",
            s.utilization.gpu, s.utilization.memory, s.utilization.encoder, s.utilization.decoder
        ));
        output.push_str(&format!("  Memory Used: {} MB\n", s.memory.global_used));
        output.push_str(&format!(
            "  ECC Errors: {} (L1 {}, L2 {}, Global {})\n",
            s.memory.ecc_errors.total(),
            s.memory.ecc_errors.l1_cache,
            s.memory.ecc_errors.l2_cache,
            s.memory.ecc_errors.global
        ));
        output.push_str(&format!(
            "  Clocks: {} MHz (SM), {} MHz (Memory)\n",
            s.clocks.cores, s.clocks.memory
        ));
        output.push_str(&format!("  BAR1 Used: {} MB\n", s.pci.bar1_used));
        output.push_str(&format!(
            "  PCIe Throughput: RX {} MB/s, TX {} MB/s\n",
            s.pci.throughput.rx, s.pci.throughput.tx
        ));

        if s.processes.is_empty() {
            output.push_str("  No processes running on GPU\n");
            return output;
        }

        output.push_str(&format!(
            "  Processes: {} (Total Memory: {} MB)\n",
            s.processes.len(),
            s.process_memory_used()
        ));
        output.push_str("    PID      Memory      Name\n");
        for process in &s.processes {
            output.push_str(&format!(
                "    {:<8} {:<11} {}\n",
                process.pid,
                format!("{} MB", process.memory_used),
                process.name
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        format!(
            "GPU {}: {}W {}°C {}% {} MB, {} ECC errors, {} processes",
            self.index,
            self.status.power,
            self.status.temperature,
            self.status.utilization.gpu,
            self.status.memory.global_used,
            self.status.memory.ecc_errors.total(),
            self.status.processes.len()
        )
    }
}

/// One status sample per GPU
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub devices: Vec<DeviceStatusEntry>,
}

impl TableDisplay for StatusOutput {
    fn to_table(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.to_compact())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Links of one GPU to every other GPU
#[derive(Debug, Clone, Serialize)]
pub struct TopologyRow {
    pub index: u32,
    pub bus_id: String,
    pub links: Vec<P2PLink>,
}

/// Pairwise P2P link matrix
#[derive(Debug, Clone, Serialize)]
pub struct TopologyMatrix {
    pub devices: Vec<TopologyRow>,
}

impl From<&[DeviceInfo]> for TopologyMatrix {
    fn from(infos: &[DeviceInfo]) -> Self {
        Self {
            devices: infos
                .iter()
                .map(|info| TopologyRow {
                    index: info.index,
                    bus_id: info.pci.bus_id.clone(),
                    links: info.topology.clone(),
                })
                .collect(),
        }
    }
}

impl TopologyMatrix {
    /// Link between two rows, `None` on the diagonal
    pub fn link(&self, row: usize, column: usize) -> Option<P2PLinkType> {
        if row == column {
            return None;
        }
        let peer = &self.devices.get(column)?.bus_id;
        self.devices
            .get(row)?
            .links
            .iter()
            .find(|l| &l.bus_id == peer)
            .map(|l| l.link)
    }
}

impl TableDisplay for TopologyMatrix {
    fn to_table(&self) -> String {
        let mut output = String::from("        ");
        for row in &self.devices {
            output.push_str(&format!("{:<7}", format!("GPU{}", row.index)));
        }
        output.push('\n');

        for (i, row) in self.devices.iter().enumerate() {
            output.push_str(&format!("{:<8}", format!("GPU{}", row.index)));
            for j in 0..self.devices.len() {
                let label = match self.link(i, j) {
                    None if i == j => "X",
                    None => P2PLinkType::Unknown.short_label(),
                    Some(link) => link.short_label(),
                };
                output.push_str(&format!("{:<7}", label));
            }
            output.push('\n');
        }

        output.push_str("\nLegend:\n");
        for link in [
            P2PLinkType::SameBoard,
            P2PLinkType::SingleSwitch,
            P2PLinkType::MultiSwitch,
            P2PLinkType::HostBridge,
            P2PLinkType::SameCpu,
            P2PLinkType::CrossCpu,
        ] {
            output.push_str(&format!("  {:<5} {}\n", link.short_label(), link));
        }

        output
    }

    fn to_compact(&self) -> String {
        let mut pairs = Vec::new();
        for i in 0..self.devices.len() {
            for j in (i + 1)..self.devices.len() {
                let label = self
                    .link(i, j)
                    .unwrap_or_default()
                    .short_label();
                pairs.push(format!(
                    "{}-{}:{}",
                    self.devices[i].index, self.devices[j].index, label
                ));
            }
        }
        pairs.join(", ")
    }
}

/// Device file of a GPU
#[derive(Debug, Clone, Serialize)]
pub struct DevicePathOutput {
    pub index: u32,
    pub path: String,
}

impl TableDisplay for DevicePathOutput {
    fn to_table(&self) -> String {
        self.path.clone()
    }
}
