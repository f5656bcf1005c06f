use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;
use tracing::debug;

/// Default ceiling for a diagnostic command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Connection listings and full system reports can be slow on busy hosts.
pub const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(30);

const WAIT_POLL: Duration = Duration::from_millis(25);

/// One entry of the fixed command table.
#[derive(Clone, Copy, Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub argv: &'static [&'static str],
    pub timeout: Duration,
}

#[cfg(not(windows))]
pub fn command_table() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "system_info",
            argv: &["uname", "-a"],
            timeout: DEFAULT_TIMEOUT,
        },
        CommandSpec {
            name: "uptime",
            argv: &["uptime"],
            timeout: DEFAULT_TIMEOUT,
        },
        CommandSpec {
            name: "disk_usage",
            argv: &["df", "-h"],
            timeout: DEFAULT_TIMEOUT,
        },
        CommandSpec {
            name: "network_connections",
            argv: &["netstat", "-an"],
            timeout: DIAGNOSTIC_TIMEOUT,
        },
        CommandSpec {
            name: "interface_stats",
            argv: &["netstat", "-i"],
            timeout: DEFAULT_TIMEOUT,
        },
    ]
}

#[cfg(windows)]
pub fn command_table() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "system_info",
            argv: &["systeminfo"],
            timeout: DIAGNOSTIC_TIMEOUT,
        },
        CommandSpec {
            name: "ip_config",
            argv: &["ipconfig", "/all"],
            timeout: DEFAULT_TIMEOUT,
        },
        CommandSpec {
            name: "disk_usage",
            argv: &["wmic", "logicaldisk", "get", "Caption,Size,FreeSpace"],
            timeout: DEFAULT_TIMEOUT,
        },
        CommandSpec {
            name: "network_connections",
            argv: &["netstat", "-an"],
            timeout: DIAGNOSTIC_TIMEOUT,
        },
        CommandSpec {
            name: "task_list",
            argv: &["tasklist"],
            timeout: DEFAULT_TIMEOUT,
        },
    ]
}

/// A consumer's request to run one named table entry.
#[derive(Clone, Debug)]
pub struct CommandRequest {
    pub name: String,
    pub issued_at: SystemTime,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issued_at: SystemTime::now(),
        }
    }
}

/// Outcome handed back to the consumer, exactly one per request.
#[derive(Clone, Debug)]
pub struct CommandResult {
    pub command: String,
    pub success: bool,
    pub output: String,
}

/// What a finished subprocess produced.
#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("command timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),
    #[error("empty command line")]
    EmptyArgv,
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed waiting for command: {0}")]
    Wait(#[source] std::io::Error),
}

/// Runs an argv with a hard timeout. The production impl shells out; tests
/// substitute scripted runners.
pub trait CommandRunner: Send {
    fn run(&self, argv: &[&str], timeout: Duration) -> Result<CommandOutput, RunError>;
}

/// `CommandRunner` on `std::process`.
///
/// Stdout and stderr are drained on their own threads while the parent
/// polls `try_wait`, so a chatty command cannot deadlock on a full pipe.
/// On deadline expiry the child is killed and reaped.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[&str], timeout: Duration) -> Result<CommandOutput, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyArgv)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RunError::Spawn)?;

        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RunError::TimedOut(timeout));
                    }
                    thread::sleep(WAIT_POLL);
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::Wait(err));
                }
            }
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
        })
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

/// Resolves command names against the fixed table and turns runner
/// outcomes into `CommandResult`s. Never panics, never raises: every
/// failure mode becomes a `success: false` result for the consumer.
pub struct CommandExecutor {
    runner: Box<dyn CommandRunner>,
    table: Vec<CommandSpec>,
}

impl CommandExecutor {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            table: command_table(),
        }
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.table.iter().map(|spec| spec.name).collect()
    }

    pub fn execute(&self, name: &str) -> CommandResult {
        let Some(spec) = self.table.iter().find(|spec| spec.name == name) else {
            return CommandResult {
                command: name.to_string(),
                success: false,
                output: "Command not found".to_string(),
            };
        };

        debug!(command = spec.name, "running table command");
        let result = match self.runner.run(spec.argv, spec.timeout) {
            Ok(out) if out.exit_code == Some(0) => CommandResult {
                command: spec.name.to_string(),
                success: true,
                output: if out.stdout.is_empty() {
                    out.stderr
                } else {
                    out.stdout
                },
            },
            Ok(out) => CommandResult {
                command: spec.name.to_string(),
                success: false,
                output: if out.stderr.is_empty() {
                    "Command failed".to_string()
                } else {
                    out.stderr
                },
            },
            Err(err) => CommandResult {
                command: spec.name.to_string(),
                success: false,
                output: err.to_string(),
            },
        };
        debug!(
            command = spec.name,
            success = result.success,
            "command finished"
        );
        result
    }
}
