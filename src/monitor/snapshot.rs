use std::time::{SystemTime, UNIX_EPOCH};

/// Usage of one mounted partition, best-effort.
#[derive(Clone, Debug, Default)]
pub struct PartitionUsage {
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub percent: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrKind {
    Ipv4,
    Ipv6,
    Mac,
}

impl AddrKind {
    pub fn label(self) -> &'static str {
        match self {
            AddrKind::Ipv4 => "IPv4",
            AddrKind::Ipv6 => "IPv6",
            AddrKind::Mac => "MAC",
        }
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceAddr {
    pub kind: AddrKind,
    pub address: String,
}

#[derive(Clone, Debug)]
pub struct InterfaceInfo {
    pub name: String,
    pub addresses: Vec<InterfaceAddr>,
}

#[derive(Clone, Debug, Default)]
pub struct CpuMetrics {
    pub overall_percent: f32,
    pub per_core_percent: Vec<f32>,
    /// 0 when the platform does not report a frequency.
    pub frequency_mhz: u64,
    pub history: Vec<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub free_bytes: u64,
    pub percent: f32,
    /// Best-effort reclaimable figure, 0 where unavailable.
    pub cached_bytes: u64,
    pub history: Vec<f64>,
}

impl MemoryMetrics {
    /// used / cached / free split for breakdown displays. "Used" here
    /// excludes the cached share so the three parts are disjoint.
    pub fn breakdown(&self) -> (u64, u64, u64) {
        (
            self.used_bytes.saturating_sub(self.cached_bytes),
            self.cached_bytes,
            self.available_bytes,
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiskMetrics {
    pub partitions: Vec<PartitionUsage>,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    /// Combined read+write rate per tick.
    pub history: Vec<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct NetworkMetrics {
    pub sent_bytes_per_sec: f64,
    pub recv_bytes_per_sec: f64,
    pub interfaces: Vec<InterfaceInfo>,
    /// Combined sent+received rate per tick.
    pub history: Vec<f64>,
}

/// Everything one sampler tick produced.
///
/// Built exclusively by the sampler thread and handed off by value; nothing
/// mutates a snapshot after publication. History fields are copies of the
/// sampler-owned ring buffers, so consumers can render them without ever
/// observing concurrent mutation.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Strictly increasing per sampler; consumers use it to detect progress.
    pub seq: u64,
    pub taken_at: SystemTime,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub network: NetworkMetrics,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            seq: 0,
            taken_at: UNIX_EPOCH,
            cpu: CpuMetrics::default(),
            memory: MemoryMetrics::default(),
            disk: DiskMetrics::default(),
            network: NetworkMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_breakdown_parts_are_disjoint() {
        let mem = MemoryMetrics {
            total_bytes: 16_000,
            used_bytes: 9_000,
            available_bytes: 7_000,
            free_bytes: 4_000,
            percent: 56.25,
            cached_bytes: 3_000,
            history: Vec::new(),
        };
        let (used, cached, free) = mem.breakdown();
        assert_eq!(used, 6_000);
        assert_eq!(cached, 3_000);
        assert_eq!(free, 7_000);
    }

    #[test]
    fn memory_breakdown_never_underflows() {
        let mem = MemoryMetrics {
            used_bytes: 100,
            cached_bytes: 500,
            ..MemoryMetrics::default()
        };
        assert_eq!(mem.breakdown().0, 0);
    }
}
