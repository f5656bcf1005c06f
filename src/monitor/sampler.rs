use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant, SystemTime};

use tracing::warn;

use super::channel::SnapshotSender;
use super::history::HistoryBuffer;
use super::rate::{CounterId, CounterSample, RateTracker};
use super::snapshot::{CpuMetrics, DiskMetrics, MemoryMetrics, NetworkMetrics, Snapshot};
use super::source::MetricsSource;

/// Delay before retrying after a faulted tick.
const FAULT_BACKOFF: Duration = Duration::from_secs(1);

/// State shared between the sampler thread and its controller.
///
/// The interval and the stop flag are the only values written from two
/// threads; everything else the sampler owns exclusively.
#[derive(Debug)]
pub struct SamplerShared {
    interval_micros: AtomicU64,
    stop: Mutex<bool>,
    stop_cv: Condvar,
}

impl SamplerShared {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_micros: AtomicU64::new(interval.as_micros() as u64),
            stop: Mutex::new(false),
            stop_cv: Condvar::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_micros.load(Ordering::Relaxed))
    }

    /// Takes effect on the next tick, never mid-tick.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_micros
            .store(interval.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn request_stop(&self) {
        let mut stopped = self.stop.lock().unwrap_or_else(|p| p.into_inner());
        *stopped = true;
        self.stop_cv.notify_all();
    }

    pub fn stop_requested(&self) -> bool {
        *self.stop.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Sleeps up to `timeout`, waking early on `request_stop`. Returns
    /// whether stop was requested.
    pub fn wait_stop(&self, timeout: Duration) -> bool {
        let guard = self.stop.lock().unwrap_or_else(|p| p.into_inner());
        if *guard {
            return true;
        }
        let (guard, _timed_out) = self
            .stop_cv
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|p| p.into_inner());
        *guard
    }
}

/// The collector loop: polls the metrics source on a fixed interval,
/// derives rates, maintains history, and publishes one immutable snapshot
/// per tick.
///
/// Owns all mutable sampling state; consumers only ever see copies,
/// which keeps the design race-free without fine-grained locking.
pub struct Sampler {
    source: Box<dyn MetricsSource>,
    rates: RateTracker,
    cpu_history: HistoryBuffer,
    memory_history: HistoryBuffer,
    disk_history: HistoryBuffer,
    network_history: HistoryBuffer,
    publisher: SnapshotSender,
    seq: u64,
}

impl Sampler {
    pub fn new(
        source: Box<dyn MetricsSource>,
        history_length: usize,
        publisher: SnapshotSender,
    ) -> Self {
        Self {
            source,
            rates: RateTracker::new(),
            cpu_history: HistoryBuffer::new(history_length),
            memory_history: HistoryBuffer::new(history_length),
            disk_history: HistoryBuffer::new(history_length),
            network_history: HistoryBuffer::new(history_length),
            publisher,
            seq: 0,
        }
    }

    /// Thread body. Exits only when `shared.request_stop` is called; a
    /// panicking tick is logged and retried after a fallback delay.
    pub fn run(mut self, shared: &SamplerShared) {
        loop {
            if shared.stop_requested() {
                break;
            }

            let started = Instant::now();
            match catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(snapshot) => {
                    self.publisher.publish(snapshot);
                }
                Err(_) => {
                    warn!("sampler tick panicked; retrying after backoff");
                    if shared.wait_stop(FAULT_BACKOFF) {
                        break;
                    }
                    continue;
                }
            }

            let remaining = shared.interval().saturating_sub(started.elapsed());
            if shared.wait_stop(remaining) {
                break;
            }
        }
    }

    pub(crate) fn tick(&mut self) -> Snapshot {
        let now = Instant::now();

        let cpu = self.source.cpu_info();
        let memory = self.source.memory_info();
        let disk_io = self.source.disk_counters();
        let net_io = self.source.network_counters();
        let partitions = self.source.disk_partitions();
        let interfaces = self.source.network_interfaces();

        let read_rate = self
            .rates
            .observe(CounterId::DiskRead, CounterSample::at(disk_io.read_bytes, now));
        let write_rate = self.rates.observe(
            CounterId::DiskWrite,
            CounterSample::at(disk_io.written_bytes, now),
        );
        let sent_rate = self
            .rates
            .observe(CounterId::NetSent, CounterSample::at(net_io.sent_bytes, now));
        let recv_rate = self
            .rates
            .observe(CounterId::NetRecv, CounterSample::at(net_io.recv_bytes, now));

        let memory_percent = if memory.total > 0 {
            (memory.used as f64 / memory.total as f64 * 100.0) as f32
        } else {
            0.0
        };

        self.cpu_history.push(cpu.overall_percent as f64);
        self.memory_history.push(memory_percent as f64);
        self.disk_history.push(read_rate + write_rate);
        self.network_history.push(sent_rate + recv_rate);

        self.seq += 1;
        Snapshot {
            seq: self.seq,
            taken_at: SystemTime::now(),
            cpu: CpuMetrics {
                overall_percent: cpu.overall_percent,
                per_core_percent: cpu.per_core_percent,
                frequency_mhz: cpu.frequency_mhz,
                history: self.cpu_history.values(),
            },
            memory: MemoryMetrics {
                total_bytes: memory.total,
                used_bytes: memory.used,
                available_bytes: memory.available,
                free_bytes: memory.free,
                percent: memory_percent,
                cached_bytes: memory.available.saturating_sub(memory.free),
                history: self.memory_history.values(),
            },
            disk: DiskMetrics {
                partitions,
                read_bytes_per_sec: read_rate,
                write_bytes_per_sec: write_rate,
                history: self.disk_history.values(),
            },
            network: NetworkMetrics {
                sent_bytes_per_sec: sent_rate,
                recv_bytes_per_sec: recv_rate,
                interfaces,
                history: self.network_history.values(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::channel::snapshot_channel;
    use crate::monitor::source::{CpuInfo, DiskCounters, MemoryInfo, MetricsSource, NetCounters};
    use std::sync::Arc;
    use std::thread;

    /// Counters grow by a fixed step on every query.
    struct SteppingSource {
        calls: u64,
        step: u64,
    }

    impl SteppingSource {
        fn new(step: u64) -> Self {
            Self { calls: 0, step }
        }

        fn counter(&self) -> u64 {
            self.calls * self.step
        }
    }

    impl MetricsSource for SteppingSource {
        fn cpu_info(&mut self) -> CpuInfo {
            self.calls += 1;
            CpuInfo {
                overall_percent: 25.0,
                per_core_percent: vec![20.0, 30.0],
                frequency_mhz: 2400,
            }
        }

        fn memory_info(&mut self) -> MemoryInfo {
            MemoryInfo {
                total: 1_000,
                used: 250,
                available: 700,
                free: 500,
            }
        }

        fn disk_counters(&mut self) -> DiskCounters {
            DiskCounters {
                read_bytes: self.counter(),
                written_bytes: self.counter(),
            }
        }

        fn network_counters(&mut self) -> NetCounters {
            NetCounters {
                sent_bytes: self.counter(),
                recv_bytes: self.counter(),
            }
        }

        fn disk_partitions(&mut self) -> Vec<crate::monitor::snapshot::PartitionUsage> {
            Vec::new()
        }

        fn network_interfaces(&mut self) -> Vec<crate::monitor::snapshot::InterfaceInfo> {
            Vec::new()
        }
    }

    #[test]
    fn first_tick_reports_zero_rates() {
        let (tx, _rx) = snapshot_channel();
        let mut sampler = Sampler::new(Box::new(SteppingSource::new(4096)), 10, tx);
        let snapshot = sampler.tick();
        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.disk.read_bytes_per_sec, 0.0);
        assert_eq!(snapshot.network.sent_bytes_per_sec, 0.0);
        assert_eq!(snapshot.cpu.history.len(), 10);
        assert_eq!(snapshot.cpu.history[9], 25.0);
    }

    #[test]
    fn second_tick_reports_positive_rates() {
        let (tx, _rx) = snapshot_channel();
        let mut sampler = Sampler::new(Box::new(SteppingSource::new(1_000_000)), 10, tx);
        sampler.tick();
        thread::sleep(Duration::from_millis(20));
        let snapshot = sampler.tick();
        assert_eq!(snapshot.seq, 2);
        assert!(snapshot.disk.read_bytes_per_sec > 0.0);
        assert!(snapshot.disk.write_bytes_per_sec > 0.0);
        assert!(snapshot.network.recv_bytes_per_sec > 0.0);
    }

    #[test]
    fn memory_percent_and_cached_are_derived() {
        let (tx, _rx) = snapshot_channel();
        let mut sampler = Sampler::new(Box::new(SteppingSource::new(0)), 5, tx);
        let snapshot = sampler.tick();
        assert_eq!(snapshot.memory.percent, 25.0);
        assert_eq!(snapshot.memory.cached_bytes, 200);
        assert_eq!(snapshot.memory.history[4], 25.0);
    }

    #[test]
    fn run_loop_publishes_and_honors_stop() {
        let (tx, mut rx) = snapshot_channel();
        let sampler = Sampler::new(Box::new(SteppingSource::new(1)), 5, tx);
        let shared = Arc::new(SamplerShared::new(Duration::from_millis(10)));

        let loop_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || sampler.run(&loop_shared));

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = None;
        while seen.is_none() && Instant::now() < deadline {
            seen = rx.try_receive();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(seen.is_some(), "no snapshot published within deadline");

        shared.request_stop();
        handle.join().expect("sampler thread panicked");
    }

    /// Panics on its first `faults` ticks, then behaves.
    struct FaultySource {
        calls: u32,
        faults: u32,
    }

    impl MetricsSource for FaultySource {
        fn cpu_info(&mut self) -> CpuInfo {
            self.calls += 1;
            if self.calls <= self.faults {
                panic!("transient source failure");
            }
            CpuInfo {
                overall_percent: 5.0,
                ..CpuInfo::default()
            }
        }

        fn memory_info(&mut self) -> MemoryInfo {
            MemoryInfo::default()
        }

        fn disk_counters(&mut self) -> DiskCounters {
            DiskCounters::default()
        }

        fn network_counters(&mut self) -> NetCounters {
            NetCounters::default()
        }

        fn disk_partitions(&mut self) -> Vec<crate::monitor::snapshot::PartitionUsage> {
            Vec::new()
        }

        fn network_interfaces(&mut self) -> Vec<crate::monitor::snapshot::InterfaceInfo> {
            Vec::new()
        }
    }

    #[test]
    fn run_loop_survives_a_panicking_tick() {
        let (tx, mut rx) = snapshot_channel();
        let sampler = Sampler::new(Box::new(FaultySource { calls: 0, faults: 1 }), 5, tx);
        let shared = Arc::new(SamplerShared::new(Duration::from_millis(10)));

        let loop_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || sampler.run(&loop_shared));

        // The first tick faults; after the fallback delay the loop must
        // recover and publish.
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = None;
        while seen.is_none() && Instant::now() < deadline {
            seen = rx.try_receive();
            thread::sleep(Duration::from_millis(10));
        }

        shared.request_stop();
        handle.join().expect("sampler thread must outlive the fault");

        let snapshot = seen.expect("no snapshot published after the fault");
        assert_eq!(snapshot.cpu.overall_percent, 5.0);
        assert!(snapshot.seq >= 1);
    }

    #[test]
    fn wait_stop_wakes_early() {
        let shared = Arc::new(SamplerShared::new(Duration::from_secs(1)));
        let waiter = Arc::clone(&shared);
        let started = Instant::now();
        let handle = thread::spawn(move || waiter.wait_stop(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(50));
        shared.request_stop();
        assert!(handle.join().expect("waiter panicked"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn interval_updates_are_visible() {
        let shared = SamplerShared::new(Duration::from_secs(1));
        shared.set_interval(Duration::from_millis(500));
        assert_eq!(shared.interval(), Duration::from_millis(500));
    }
}
