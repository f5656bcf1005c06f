use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};
use tracing::debug;

pub const DEFAULT_PROCESS_LIMIT: usize = 100;

#[derive(Clone, Debug)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub memory_percent: f32,
    pub status: String,
}

/// What the provider observed when asked to terminate a pid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminateOutcome {
    Terminated,
    NotFound,
    AccessDenied,
    Failed(String),
}

/// Result of a kill request, reported to the consumer the same way command
/// results are. Not-found and access-denied are outcomes, never errors.
#[derive(Clone, Debug)]
pub struct KillResult {
    pub pid: u32,
    pub success: bool,
    pub message: String,
}

/// Process listing and termination, injected so the core can be exercised
/// against scripted providers.
pub trait ProcessProvider: Send {
    /// Best-effort listing: a process that vanished or denied access mid-read
    /// is skipped, never aborting the whole listing.
    fn processes(&mut self) -> Vec<ProcessInfo>;
    fn terminate(&mut self, pid: u32) -> TerminateOutcome;
}

/// Production provider on sysinfo.
pub struct SysinfoProvider {
    sys: System,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        // Prime process CPU counters so the first listing has a baseline.
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        Self { sys }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProvider for SysinfoProvider {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.sys.refresh_memory();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );

        let total_memory = self.sys.total_memory();
        self.sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let memory_bytes = process.memory();
                let memory_percent = if total_memory > 0 {
                    (memory_bytes as f64 / total_memory as f64 * 100.0) as f32
                } else {
                    0.0
                };
                ProcessInfo {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().to_string(),
                    cpu_percent: process.cpu_usage(),
                    memory_bytes,
                    memory_percent,
                    status: process.status().to_string(),
                }
            })
            .collect()
    }

    fn terminate(&mut self, pid: u32) -> TerminateOutcome {
        let sys_pid = Pid::from_u32(pid);
        let pids = [sys_pid];
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&pids),
            true,
            ProcessRefreshKind::nothing(),
        );

        let Some(process) = self.sys.process(sys_pid) else {
            return TerminateOutcome::NotFound;
        };

        match process.kill_with(Signal::Term) {
            Some(true) => TerminateOutcome::Terminated,
            Some(false) => TerminateOutcome::AccessDenied,
            // SIGTERM unsupported on this platform, fall back to kill().
            None => {
                if process.kill() {
                    TerminateOutcome::Terminated
                } else {
                    TerminateOutcome::AccessDenied
                }
            }
        }
    }
}

/// Consumer-facing wrapper: bounded, CPU-sorted listings and kill requests
/// mapped to reportable `KillResult`s. Cloneable so the service and the
/// command worker can share one provider.
#[derive(Clone)]
pub struct ProcessController {
    provider: Arc<Mutex<dyn ProcessProvider>>,
    limit: usize,
}

impl ProcessController {
    pub fn new<P: ProcessProvider + 'static>(provider: P, limit: usize) -> Self {
        Self {
            provider: Arc::new(Mutex::new(provider)),
            limit: limit.max(1),
        }
    }

    /// All readable processes, descending CPU, capped at the configured
    /// limit so payloads stay bounded on process-heavy hosts.
    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut processes = self.lock_provider().processes();
        processes.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(Ordering::Equal)
        });
        processes.truncate(self.limit);
        processes
    }

    pub fn terminate(&self, pid: u32) -> KillResult {
        debug!(pid, "terminate requested");
        match self.lock_provider().terminate(pid) {
            TerminateOutcome::Terminated => KillResult {
                pid,
                success: true,
                message: format!("Sent termination signal to process {pid}"),
            },
            TerminateOutcome::NotFound => KillResult {
                pid,
                success: false,
                message: format!("Process {pid} not found"),
            },
            TerminateOutcome::AccessDenied => KillResult {
                pid,
                success: false,
                message: format!("Access denied for process {pid}"),
            },
            TerminateOutcome::Failed(message) => KillResult {
                pid,
                success: false,
                message,
            },
        }
    }

    fn lock_provider(&self) -> std::sync::MutexGuard<'_, dyn ProcessProvider + 'static> {
        self.provider
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
