//! End-to-end coverage of the monitoring service: scripted sources, runners,
//! and providers wired through the real threads and channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use sysdeck::monitor::command::{CommandOutput, CommandRunner, RunError};
use sysdeck::monitor::process::{ProcessInfo, ProcessProvider, TerminateOutcome};
use sysdeck::monitor::service::{MonitorOptions, MonitorService};
use sysdeck::monitor::snapshot::{InterfaceInfo, PartitionUsage, Snapshot};
use sysdeck::monitor::source::{CpuInfo, DiskCounters, MemoryInfo, MetricsSource, NetCounters};

/// Source whose cumulative counters grow by a fixed amount per tick.
struct SteppingSource {
    ticks: Arc<AtomicU64>,
}

impl SteppingSource {
    fn new() -> (Self, Arc<AtomicU64>) {
        let ticks = Arc::new(AtomicU64::new(0));
        (
            Self {
                ticks: Arc::clone(&ticks),
            },
            ticks,
        )
    }
}

impl MetricsSource for SteppingSource {
    fn cpu_info(&mut self) -> CpuInfo {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        CpuInfo {
            overall_percent: 42.0,
            per_core_percent: vec![40.0, 44.0],
            frequency_mhz: 2400,
        }
    }

    fn memory_info(&mut self) -> MemoryInfo {
        MemoryInfo {
            total: 16 * 1024 * 1024 * 1024,
            used: 8 * 1024 * 1024 * 1024,
            available: 7 * 1024 * 1024 * 1024,
            free: 4 * 1024 * 1024 * 1024,
        }
    }

    fn disk_counters(&mut self) -> DiskCounters {
        let tick = self.ticks.load(Ordering::SeqCst);
        DiskCounters {
            read_bytes: tick * 1_000_000,
            written_bytes: tick * 500_000,
        }
    }

    fn network_counters(&mut self) -> NetCounters {
        let tick = self.ticks.load(Ordering::SeqCst);
        NetCounters {
            sent_bytes: tick * 10_000,
            recv_bytes: tick * 20_000,
        }
    }

    fn disk_partitions(&mut self) -> Vec<PartitionUsage> {
        vec![PartitionUsage {
            device: "/dev/sda1".to_string(),
            mount_point: "/".to_string(),
            file_system: "ext4".to_string(),
            total_bytes: 100,
            used_bytes: 40,
            free_bytes: 60,
            percent: 40.0,
        }]
    }

    fn network_interfaces(&mut self) -> Vec<InterfaceInfo> {
        Vec::new()
    }
}

struct ScriptedRunner {
    invoked: Arc<AtomicBool>,
    outcome: fn() -> Result<CommandOutput, RunError>,
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _argv: &[&str], _timeout: Duration) -> Result<CommandOutput, RunError> {
        self.invoked.store(true, Ordering::SeqCst);
        (self.outcome)()
    }
}

struct ScriptedProvider {
    listing: Vec<ProcessInfo>,
    outcome: TerminateOutcome,
}

impl ProcessProvider for ScriptedProvider {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.listing.clone()
    }

    fn terminate(&mut self, _pid: u32) -> TerminateOutcome {
        self.outcome.clone()
    }
}

fn fast_options() -> MonitorOptions {
    MonitorOptions {
        interval: Duration::from_millis(20),
        history_length: 8,
        ..MonitorOptions::default()
    }
}

fn service_with(
    runner_outcome: fn() -> Result<CommandOutput, RunError>,
    kill_outcome: TerminateOutcome,
) -> (MonitorService, Arc<AtomicBool>) {
    let (source, _) = SteppingSource::new();
    let invoked = Arc::new(AtomicBool::new(false));
    let runner = ScriptedRunner {
        invoked: Arc::clone(&invoked),
        outcome: runner_outcome,
    };
    let service = MonitorService::new(
        Box::new(source),
        Box::new(runner),
        ScriptedProvider {
            listing: Vec::new(),
            outcome: kill_outcome,
        },
        fast_options(),
    );
    (service, invoked)
}

/// Polls `poll` until it yields a value or the deadline passes.
fn wait_for<T>(timeout: Duration, mut poll: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = poll() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn wait_for_snapshot(
    service: &mut MonitorService,
    min_seq: u64,
) -> Snapshot {
    wait_for(Duration::from_secs(5), || {
        service
            .try_receive_snapshot()
            .filter(|snapshot| snapshot.seq >= min_seq)
    })
    .expect("sampler should publish in time")
}

#[test]
fn snapshots_carry_metrics_rates_and_history() {
    let (mut service, _) = service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");

    // Rates need at least two observations; wait past the first tick.
    let snapshot = wait_for_snapshot(&mut service, 3);

    assert_eq!(snapshot.cpu.overall_percent, 42.0);
    assert_eq!(snapshot.cpu.per_core_percent.len(), 2);
    assert!((snapshot.memory.percent - 50.0).abs() < 0.1);
    // available - free
    assert_eq!(snapshot.memory.cached_bytes, 3 * 1024 * 1024 * 1024);

    assert!(snapshot.disk.read_bytes_per_sec > 0.0);
    assert!(snapshot.disk.write_bytes_per_sec > 0.0);
    assert!(snapshot.network.sent_bytes_per_sec > 0.0);
    assert!(snapshot.network.recv_bytes_per_sec > 0.0);
    assert_eq!(snapshot.disk.partitions.len(), 1);
    assert_eq!(snapshot.disk.partitions[0].mount_point, "/");

    // Histories stay at the configured length, zero-prefilled.
    assert_eq!(snapshot.cpu.history.len(), 8);
    assert_eq!(snapshot.memory.history.len(), 8);
    assert_eq!(*snapshot.cpu.history.last().expect("nonempty"), 42.0);

    service.stop();
}

#[test]
fn consumers_only_see_the_latest_snapshot() {
    let (mut service, _) = service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");

    let first = wait_for_snapshot(&mut service, 1);
    // Let several ticks pass unread; the channel keeps only the newest.
    thread::sleep(Duration::from_millis(120));
    let second = wait_for_snapshot(&mut service, first.seq + 2);
    assert!(second.seq > first.seq);

    // Reading again without a new publication yields nothing.
    let drained = wait_for(Duration::from_millis(5), || service.try_receive_snapshot());
    if let Some(drained) = drained {
        assert!(drained.seq > second.seq);
    }

    service.stop();
}

#[test]
fn stop_silences_the_snapshot_channel() {
    let (mut service, _) = service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");
    wait_for_snapshot(&mut service, 1);

    service.stop();
    assert!(!service.is_running());

    // Drain anything published before the stop took effect.
    thread::sleep(Duration::from_millis(100));
    while service.try_receive_snapshot().is_some() {}

    thread::sleep(Duration::from_millis(100));
    assert!(service.try_receive_snapshot().is_none());
}

#[test]
fn unknown_commands_fail_without_reaching_the_runner() {
    let (mut service, invoked) =
        service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");

    service.submit_command("definitely_not_in_the_table");
    let result = wait_for(Duration::from_secs(5), || {
        service.try_receive_command_result()
    })
    .expect("result should arrive");

    assert_eq!(result.command, "definitely_not_in_the_table");
    assert!(!result.success);
    assert_eq!(result.output, "Command not found");
    assert!(!invoked.load(Ordering::SeqCst));

    service.stop();
}

#[test]
fn command_timeouts_become_failed_results() {
    let (mut service, _) = service_with(
        || Err(RunError::TimedOut(Duration::from_secs(30))),
        TerminateOutcome::NotFound,
    );
    service.start().expect("start");

    service.submit_command("network_connections");
    let result = wait_for(Duration::from_secs(5), || {
        service.try_receive_command_result()
    })
    .expect("result should arrive");

    assert!(!result.success);
    assert!(result.output.contains("timed out after 30 seconds"));

    service.stop();
}

#[test]
fn successful_commands_report_stdout() {
    let (mut service, _) = service_with(
        || {
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout: "Filesystem  Size  Used\n".to_string(),
                stderr: String::new(),
            })
        },
        TerminateOutcome::NotFound,
    );
    service.start().expect("start");

    service.submit_command("disk_usage");
    let result = wait_for(Duration::from_secs(5), || {
        service.try_receive_command_result()
    })
    .expect("result should arrive");

    assert!(result.success);
    assert!(result.output.starts_with("Filesystem"));

    service.stop();
}

#[test]
fn kill_results_round_trip_through_the_worker() {
    let (mut service, _) =
        service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");

    service.request_kill(99999);
    let result = wait_for(Duration::from_secs(5), || service.try_receive_kill_result())
        .expect("kill result should arrive");

    assert_eq!(result.pid, 99999);
    assert!(!result.success);
    assert!(result.message.contains("not found"));

    service.stop();
}

#[test]
fn process_listing_is_sorted_and_available_without_start() {
    let (source, _) = SteppingSource::new();
    let listing = vec![
        ProcessInfo {
            pid: 10,
            name: "calm".to_string(),
            cpu_percent: 1.0,
            memory_bytes: 100,
            memory_percent: 0.0,
            status: "Sleeping".to_string(),
        },
        ProcessInfo {
            pid: 20,
            name: "hot".to_string(),
            cpu_percent: 95.0,
            memory_bytes: 200,
            memory_percent: 0.0,
            status: "Running".to_string(),
        },
    ];
    let service = MonitorService::new(
        Box::new(source),
        Box::new(ScriptedRunner {
            invoked: Arc::new(AtomicBool::new(false)),
            outcome: || Ok(CommandOutput::default()),
        }),
        ScriptedProvider {
            listing,
            outcome: TerminateOutcome::NotFound,
        },
        fast_options(),
    );

    let processes = service.list_processes();
    assert_eq!(processes.len(), 2);
    assert_eq!(processes[0].name, "hot");
}

/// A provider that can only read some of the host's processes still
/// produces a listing; unreadable entries are skipped, never fatal.
struct FlakyProvider {
    readable: Vec<ProcessInfo>,
}

impl ProcessProvider for FlakyProvider {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.readable.clone()
    }

    fn terminate(&mut self, _pid: u32) -> TerminateOutcome {
        TerminateOutcome::AccessDenied
    }
}

#[test]
fn partially_readable_hosts_still_produce_listings() {
    let (source, _) = SteppingSource::new();
    let readable: Vec<ProcessInfo> = (0..4)
        .map(|i| ProcessInfo {
            pid: i,
            name: format!("proc-{i}"),
            cpu_percent: i as f32,
            memory_bytes: 0,
            memory_percent: 0.0,
            status: "Running".to_string(),
        })
        .collect();
    let mut service = MonitorService::new(
        Box::new(source),
        Box::new(ScriptedRunner {
            invoked: Arc::new(AtomicBool::new(false)),
            outcome: || Ok(CommandOutput::default()),
        }),
        FlakyProvider { readable },
        fast_options(),
    );
    service.start().expect("start");

    let processes = service.list_processes();
    assert_eq!(processes.len(), 4);
    assert_eq!(processes[0].name, "proc-3");

    service.request_kill(2);
    let result = wait_for(Duration::from_secs(5), || service.try_receive_kill_result())
        .expect("kill result should arrive");
    assert!(!result.success);
    assert!(result.message.contains("Access denied"));

    service.stop();
}

#[test]
fn interval_changes_apply_live_and_invalid_ones_are_rejected() {
    let (mut service, _) =
        service_with(|| Ok(CommandOutput::default()), TerminateOutcome::NotFound);
    service.start().expect("start");
    wait_for_snapshot(&mut service, 1);

    assert!(service.set_sample_interval(0.05).is_ok());
    assert_eq!(service.sample_interval(), 0.05);

    assert!(service.set_sample_interval(-1.0).is_err());
    assert!(service.set_sample_interval(f64::NAN).is_err());
    assert!(service.set_sample_interval(1e300).is_err());
    assert_eq!(service.sample_interval(), 0.05);

    // Sampling keeps going under the new interval.
    let before = wait_for_snapshot(&mut service, 2).seq;
    let after = wait_for_snapshot(&mut service, before + 2).seq;
    assert!(after > before);

    service.stop();
}
