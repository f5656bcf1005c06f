use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::channel::{SnapshotReceiver, snapshot_channel};
use super::command::{CommandExecutor, CommandRequest, CommandResult, CommandRunner, SystemRunner};
use super::history::DEFAULT_CAPACITY;
use super::process::{
    DEFAULT_PROCESS_LIMIT, KillResult, ProcessController, ProcessInfo, ProcessProvider,
    SysinfoProvider,
};
use super::sampler::{Sampler, SamplerShared};
use super::snapshot::Snapshot;
use super::source::{MetricsSource, SysinfoSource};

/// How long `stop` waits for the sampler thread before abandoning it.
pub const STOP_GRACE: Duration = Duration::from_secs(1);

/// Pending command/kill requests beyond this are rejected; an operator
/// clicking faster than commands finish gains nothing from a deeper queue.
const REQUEST_QUEUE_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub history_length: usize,
    pub process_limit: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            history_length: DEFAULT_CAPACITY,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to spawn monitor worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("monitor service already stopped; build a new instance")]
    Exhausted,
}

/// Ceiling for `set_sample_interval`. An hour between samples is already
/// useless for a live dashboard; anything larger risks overflowing the
/// micros representation.
pub const MAX_INTERVAL_SECS: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("sampling interval must be between 0 and {MAX_INTERVAL_SECS} seconds, got {0}")]
    Invalid(f64),
}

enum WorkRequest {
    Command(CommandRequest),
    Kill { pid: u32 },
}

/// Collaborators that move into the worker threads on `start`.
struct Workers {
    sampler: Sampler,
    executor: CommandExecutor,
    request_rx: mpsc::Receiver<WorkRequest>,
    command_tx: mpsc::UnboundedSender<CommandResult>,
    kill_tx: mpsc::UnboundedSender<KillResult>,
}

/// Top-level orchestrator.
///
/// Owns the sampler thread, the command worker thread, and every channel
/// endpoint the consumer polls. An explicit instance with no global state:
/// tests build as many independent services as they like.
///
/// One instance is single-flight: `start` is idempotent while running, and
/// after `stop` a new service must be constructed.
pub struct MonitorService {
    shared: Arc<SamplerShared>,
    snapshots: SnapshotReceiver,
    controller: ProcessController,
    command_names: Vec<&'static str>,
    request_tx: Option<mpsc::Sender<WorkRequest>>,
    command_tx: mpsc::UnboundedSender<CommandResult>,
    command_results: mpsc::UnboundedReceiver<CommandResult>,
    kill_results: mpsc::UnboundedReceiver<KillResult>,
    pending: Option<Workers>,
    sampler_thread: Option<thread::JoinHandle<()>>,
    worker_thread: Option<thread::JoinHandle<()>>,
}

impl MonitorService {
    pub fn new(
        source: Box<dyn MetricsSource>,
        runner: Box<dyn CommandRunner>,
        provider: impl ProcessProvider + 'static,
        options: MonitorOptions,
    ) -> Self {
        let shared = Arc::new(SamplerShared::new(options.interval));
        let (snapshot_tx, snapshots) = snapshot_channel();
        let sampler = Sampler::new(source, options.history_length, snapshot_tx);
        let executor = CommandExecutor::new(runner);
        let command_names = executor.command_names();
        let controller = ProcessController::new(provider, options.process_limit);

        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (command_tx, command_results) = mpsc::unbounded_channel();
        let (kill_tx, kill_results) = mpsc::unbounded_channel();

        Self {
            shared,
            snapshots,
            controller,
            command_names,
            request_tx: Some(request_tx),
            command_tx: command_tx.clone(),
            command_results,
            kill_results,
            pending: Some(Workers {
                sampler,
                executor,
                request_rx,
                command_tx,
                kill_tx,
            }),
            sampler_thread: None,
            worker_thread: None,
        }
    }

    /// Production wiring: sysinfo metrics and processes, real subprocesses.
    pub fn with_system(options: MonitorOptions) -> Self {
        Self::new(
            Box::new(SysinfoSource::new()),
            Box::new(SystemRunner),
            SysinfoProvider::new(),
            options,
        )
    }

    /// Spawns the sampler and command worker. Idempotent while running;
    /// thread-spawn failure is the only error surfaced to the caller.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.sampler_thread.is_some() {
            return Ok(());
        }
        let Some(workers) = self.pending.take() else {
            return Err(StartError::Exhausted);
        };
        let Workers {
            sampler,
            executor,
            mut request_rx,
            command_tx,
            kill_tx,
        } = workers;

        let sampler_shared = Arc::clone(&self.shared);
        let sampler_thread = thread::Builder::new()
            .name("sysdeck-sampler".to_string())
            .spawn(move || sampler.run(&sampler_shared))?;

        let controller = self.controller.clone();
        let worker_thread = thread::Builder::new()
            .name("sysdeck-commands".to_string())
            .spawn(move || {
                while let Some(request) = request_rx.blocking_recv() {
                    match request {
                        WorkRequest::Command(request) => {
                            let result = executor.execute(&request.name);
                            if command_tx.send(result).is_err() {
                                break;
                            }
                        }
                        WorkRequest::Kill { pid } => {
                            if kill_tx.send(controller.terminate(pid)).is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        let worker_thread = match worker_thread {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.request_stop();
                return Err(err.into());
            }
        };

        self.sampler_thread = Some(sampler_thread);
        self.worker_thread = Some(worker_thread);
        Ok(())
    }

    /// Signals the sampler to exit after its current tick and waits up to
    /// `STOP_GRACE` for it. A loop that overruns the grace period is
    /// abandoned but counted as stopped: best-effort join, not a kill.
    /// In-flight commands are not waited for; they honor their own timeouts.
    pub fn stop(&mut self) {
        self.shared.request_stop();
        self.pending = None;

        if let Some(handle) = self.sampler_thread.take() {
            let deadline = Instant::now() + STOP_GRACE;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("sampler thread panicked during shutdown");
                }
            } else {
                warn!("sampler did not stop within the grace period; abandoning");
            }
        }

        // Closing the request queue lets the worker drain what it has and
        // exit on its own.
        self.request_tx = None;
        drop(self.worker_thread.take());
    }

    pub fn is_running(&self) -> bool {
        self.sampler_thread.is_some()
    }

    /// Non-blocking; `None` when no new snapshot has been published since
    /// the last call.
    pub fn try_receive_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshots.try_receive()
    }

    /// Fire-and-forget: the result arrives later via
    /// `try_receive_command_result`, exactly one per submission. A request
    /// that cannot be queued (full queue, stopped service) is answered with
    /// a synthetic failed result instead of blocking the caller, so a
    /// consumer tracking an in-flight command can never wedge.
    pub fn submit_command(&self, name: &str) {
        let rejection = match &self.request_tx {
            Some(tx) => {
                let request = WorkRequest::Command(CommandRequest::new(name));
                match tx.try_send(request) {
                    Ok(()) => None,
                    Err(err) => {
                        warn!(command = name, error = %err, "command request dropped");
                        Some("Command queue is full")
                    }
                }
            }
            None => {
                debug!(command = name, "command submitted after stop");
                Some("Monitor is stopped")
            }
        };
        if let Some(reason) = rejection {
            let _ = self.command_tx.send(CommandResult {
                command: name.to_string(),
                success: false,
                output: reason.to_string(),
            });
        }
    }

    pub fn try_receive_command_result(&mut self) -> Option<CommandResult> {
        self.command_results.try_recv().ok()
    }

    pub fn command_names(&self) -> &[&'static str] {
        &self.command_names
    }

    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.controller.list()
    }

    /// Fire-and-forget, like `submit_command`; the outcome arrives via
    /// `try_receive_kill_result`.
    pub fn request_kill(&self, pid: u32) {
        let Some(tx) = &self.request_tx else {
            debug!(pid, "kill requested after stop; dropped");
            return;
        };
        if let Err(err) = tx.try_send(WorkRequest::Kill { pid }) {
            warn!(pid, error = %err, "kill request dropped");
        }
    }

    pub fn try_receive_kill_result(&mut self) -> Option<KillResult> {
        self.kill_results.try_recv().ok()
    }

    /// Rejects non-finite, non-positive, or oversized values and keeps the
    /// previous interval. A valid change takes effect on the next tick.
    pub fn set_sample_interval(&self, seconds: f64) -> Result<(), IntervalError> {
        if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_INTERVAL_SECS {
            return Err(IntervalError::Invalid(seconds));
        }
        self.shared.set_interval(Duration::from_secs_f64(seconds));
        Ok(())
    }

    pub fn sample_interval(&self) -> f64 {
        self.shared.interval().as_secs_f64()
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        self.shared.request_stop();
        self.request_tx = None;
    }
}
