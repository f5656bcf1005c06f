use sysinfo::{DiskRefreshKind, Disks, Networks, System};

use super::snapshot::{AddrKind, InterfaceAddr, InterfaceInfo, PartitionUsage};

/// Point-in-time CPU reading.
#[derive(Clone, Debug, Default)]
pub struct CpuInfo {
    pub overall_percent: f32,
    pub per_core_percent: Vec<f32>,
    pub frequency_mhz: u64,
}

/// Point-in-time memory reading, all bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub free: u64,
}

/// Cumulative disk IO counters since boot, summed over devices.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// Cumulative network IO counters since boot, summed over interfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetCounters {
    pub sent_bytes: u64,
    pub recv_bytes: u64,
}

/// Point-in-time readers for everything the sampler polls.
///
/// Every method is best-effort: a platform that cannot supply a field
/// reports a neutral value (zero, empty list) instead of an error, so one
/// unavailable metric never aborts a tick.
pub trait MetricsSource: Send {
    fn cpu_info(&mut self) -> CpuInfo;
    fn memory_info(&mut self) -> MemoryInfo;
    fn disk_counters(&mut self) -> DiskCounters;
    fn network_counters(&mut self) -> NetCounters;
    fn disk_partitions(&mut self) -> Vec<PartitionUsage>;
    fn network_interfaces(&mut self) -> Vec<InterfaceInfo>;
}

/// Static facts about the host, read once at startup.
#[derive(Clone, Debug, Default)]
pub struct SystemIdentity {
    pub host_name: String,
    pub os: String,
    pub kernel: String,
    pub logical_cpus: usize,
    pub physical_cores: Option<usize>,
}

pub fn system_identity() -> SystemIdentity {
    let mut sys = System::new();
    sys.refresh_cpu_all();

    let os = match (System::name(), System::os_version()) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name,
        _ => "unknown".to_string(),
    };

    SystemIdentity {
        host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        os,
        kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        logical_cpus: sys.cpus().len(),
        physical_cores: System::physical_core_count(),
    }
}

/// Production `MetricsSource` backed by sysinfo.
pub struct SysinfoSource {
    sys: System,
    disks: Disks,
    networks: Networks,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Prime CPU usage so the first tick has a baseline to diff against.
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoSource {
    fn cpu_info(&mut self) -> CpuInfo {
        self.sys.refresh_cpu_all();
        let cpus = self.sys.cpus();
        CpuInfo {
            overall_percent: self.sys.global_cpu_usage(),
            per_core_percent: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
            frequency_mhz: cpus.first().map(|cpu| cpu.frequency()).unwrap_or(0),
        }
    }

    fn memory_info(&mut self) -> MemoryInfo {
        self.sys.refresh_memory();
        MemoryInfo {
            total: self.sys.total_memory(),
            used: self.sys.used_memory(),
            available: self.sys.available_memory(),
            free: self.sys.free_memory(),
        }
    }

    fn disk_counters(&mut self) -> DiskCounters {
        self.disks
            .refresh_specifics(true, DiskRefreshKind::nothing().with_io_usage());
        let mut counters = DiskCounters::default();
        for disk in self.disks.list() {
            let usage = disk.usage();
            counters.read_bytes += usage.total_read_bytes;
            counters.written_bytes += usage.total_written_bytes;
        }
        counters
    }

    fn network_counters(&mut self) -> NetCounters {
        self.networks.refresh(true);
        let mut counters = NetCounters::default();
        for (_, data) in &self.networks {
            counters.sent_bytes += data.total_transmitted();
            counters.recv_bytes += data.total_received();
        }
        counters
    }

    fn disk_partitions(&mut self) -> Vec<PartitionUsage> {
        self.disks
            .refresh_specifics(true, DiskRefreshKind::nothing().with_storage());
        self.disks
            .list()
            .iter()
            .map(|disk| {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                let percent = if total > 0 {
                    (used as f64 / total as f64 * 100.0) as f32
                } else {
                    0.0
                };
                PartitionUsage {
                    device: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    file_system: disk.file_system().to_string_lossy().to_string(),
                    total_bytes: total,
                    used_bytes: used,
                    free_bytes: free,
                    percent,
                }
            })
            .collect()
    }

    fn network_interfaces(&mut self) -> Vec<InterfaceInfo> {
        self.networks.refresh(true);
        let mut interfaces: Vec<InterfaceInfo> = self
            .networks
            .iter()
            .map(|(name, data)| {
                let mut addresses = Vec::new();
                for ip in data.ip_networks() {
                    let kind = if ip.addr.is_ipv4() {
                        AddrKind::Ipv4
                    } else {
                        AddrKind::Ipv6
                    };
                    addresses.push(InterfaceAddr {
                        kind,
                        address: ip.addr.to_string(),
                    });
                }
                let mac = data.mac_address().to_string();
                if mac != "00:00:00:00:00:00" {
                    addresses.push(InterfaceAddr {
                        kind: AddrKind::Mac,
                        address: mac,
                    });
                }
                InterfaceInfo {
                    name: name.clone(),
                    addresses,
                }
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        interfaces
    }
}
