use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::Action;
use crate::config::{Config, parse_key};
use crate::monitor::command::CommandResult;
use crate::monitor::process::ProcessInfo;
use crate::monitor::service::MonitorService;
use crate::monitor::snapshot::Snapshot;
use crate::monitor::source::{SystemIdentity, system_identity};

/// Refresh-rate choices, mirroring the selector of classic desktop monitors.
pub const INTERVAL_STEPS: [f64; 4] = [0.5, 1.0, 2.0, 5.0];

const STATUS_TTL: Duration = Duration::from_secs(3);
const PROCESS_REFRESH_EVERY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Cpu,
    Memory,
    Disk,
    Network,
    Processes,
    Commands,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Cpu,
        Tab::Memory,
        Tab::Disk,
        Tab::Network,
        Tab::Processes,
        Tab::Commands,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Cpu => "CPU",
            Tab::Memory => "Memory",
            Tab::Disk => "Disk",
            Tab::Network => "Network",
            Tab::Processes => "Processes",
            Tab::Commands => "Commands",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.index() + len - 1) % len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessSort {
    #[default]
    Cpu,
    Memory,
    Name,
    Pid,
}

impl ProcessSort {
    pub fn next(self) -> Self {
        match self {
            ProcessSort::Cpu => ProcessSort::Memory,
            ProcessSort::Memory => ProcessSort::Name,
            ProcessSort::Name => ProcessSort::Pid,
            ProcessSort::Pid => ProcessSort::Cpu,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessSort::Cpu => "CPU",
            ProcessSort::Memory => "Memory",
            ProcessSort::Name => "Name",
            ProcessSort::Pid => "PID",
        }
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" => ProcessSort::Memory,
            "name" => ProcessSort::Name,
            "pid" => ProcessSort::Pid,
            _ => ProcessSort::Cpu,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub kill: KeyCode,
    pub refresh: KeyCode,
    pub run: KeyCode,
    pub cycle_sort: KeyCode,
    pub faster: KeyCode,
    pub slower: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &crate::config::KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            kill: parse_key(&kb.kill).unwrap_or(KeyCode::Char('k')),
            refresh: parse_key(&kb.refresh).unwrap_or(KeyCode::Char('r')),
            run: parse_key(&kb.run).unwrap_or(KeyCode::Enter),
            cycle_sort: parse_key(&kb.cycle_sort).unwrap_or(KeyCode::Char('s')),
            faster: parse_key(&kb.faster).unwrap_or(KeyCode::Char('+')),
            slower: parse_key(&kb.slower).unwrap_or(KeyCode::Char('-')),
        }
    }
}

pub struct App {
    pub running: bool,
    pub service: MonitorService,
    pub identity: SystemIdentity,
    pub snapshot: Option<Snapshot>,
    pub tab: Tab,
    pub sort: ProcessSort,
    pub processes: Vec<ProcessInfo>,
    pub selected_process: usize,
    pub command_names: Vec<String>,
    pub selected_command: usize,
    pub command_output: Option<CommandResult>,
    pub command_pending: Option<String>,
    pub status_message: Option<(String, Instant)>,
    pub keybinds: ResolvedKeybinds,
    last_process_refresh: Option<Instant>,
}

impl App {
    pub fn new(config: &Config, service: MonitorService) -> Self {
        let command_names = service
            .command_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        Self {
            running: true,
            service,
            identity: system_identity(),
            snapshot: None,
            tab: Tab::Cpu,
            sort: ProcessSort::from_str_config(&config.general.default_sort),
            processes: Vec::new(),
            selected_process: 0,
            command_names,
            selected_command: 0,
            command_output: None,
            command_pending: None,
            status_message: None,
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            last_process_refresh: None,
        }
    }

    /// One UI poll: drain the service channels and expire transient state.
    pub fn on_poll(&mut self) {
        if let Some(snapshot) = self.service.try_receive_snapshot() {
            self.snapshot = Some(snapshot);
        }

        if let Some(result) = self.service.try_receive_command_result() {
            self.command_pending = None;
            let verdict = if result.success { "finished" } else { "failed" };
            self.set_status(format!("{} {verdict}", result.command));
            self.command_output = Some(result);
        }

        if let Some(kill) = self.service.try_receive_kill_result() {
            self.set_status(kill.message.clone());
            // The listing is stale the moment a process dies.
            self.refresh_processes();
        }

        if self.tab == Tab::Processes {
            let due = self
                .last_process_refresh
                .is_none_or(|at| at.elapsed() >= PROCESS_REFRESH_EVERY);
            if due {
                self.refresh_processes();
            }
        }

        if let Some((_, created)) = &self.status_message
            && created.elapsed() >= STATUS_TTL
        {
            self.status_message = None;
        }
    }

    pub fn refresh_processes(&mut self) {
        let mut processes = self.service.list_processes();
        sort_processes(&mut processes, self.sort);
        self.processes = processes;
        if self.selected_process >= self.processes.len() {
            self.selected_process = self.processes.len().saturating_sub(1);
        }
        self.last_process_refresh = Some(Instant::now());
    }

    pub fn selected_pid(&self) -> Option<u32> {
        self.processes.get(self.selected_process).map(|p| p.pid)
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Right => return Action::NextTab,
            KeyCode::BackTab | KeyCode::Left => return Action::PrevTab,
            KeyCode::Up => return Action::SelectPrev,
            KeyCode::Down => return Action::SelectNext,
            KeyCode::Char(c @ '1'..='6') => {
                return Action::GoToTab(c as usize - '1' as usize);
            }
            _ => {}
        }

        let kb = &self.keybinds;
        if key.code == kb.quit {
            return Action::Quit;
        }
        if key.code == kb.kill {
            return Action::KillSelected;
        }
        if key.code == kb.refresh {
            return Action::RefreshProcesses;
        }
        if key.code == kb.run {
            return Action::RunSelectedCommand;
        }
        if key.code == kb.cycle_sort {
            return Action::CycleSort;
        }
        if key.code == kb.faster {
            return Action::FasterSampling;
        }
        if key.code == kb.slower {
            return Action::SlowerSampling;
        }

        Action::None
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NextTab => self.switch_tab(self.tab.next()),
            Action::PrevTab => self.switch_tab(self.tab.prev()),
            Action::GoToTab(index) => {
                if let Some(tab) = Tab::ALL.get(index) {
                    self.switch_tab(*tab);
                }
            }
            Action::SelectPrev => self.move_selection(-1),
            Action::SelectNext => self.move_selection(1),
            Action::RunSelectedCommand => self.run_selected_command(),
            Action::KillSelected => self.kill_selected(),
            Action::RefreshProcesses => {
                self.refresh_processes();
                self.set_status("Process list refreshed".to_string());
            }
            Action::CycleSort => {
                self.sort = self.sort.next();
                sort_processes(&mut self.processes, self.sort);
                self.set_status(format!("Sorting by {}", self.sort.label()));
            }
            Action::FasterSampling => self.step_interval(-1),
            Action::SlowerSampling => self.step_interval(1),
            Action::None => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Processes && self.processes.is_empty() {
            self.refresh_processes();
        }
    }

    fn move_selection(&mut self, delta: i64) {
        let len = match self.tab {
            Tab::Processes => self.processes.len(),
            Tab::Commands => self.command_names.len(),
            _ => return,
        };
        if len == 0 {
            return;
        }
        let selected = match self.tab {
            Tab::Processes => &mut self.selected_process,
            _ => &mut self.selected_command,
        };
        let next = (*selected as i64 + delta).rem_euclid(len as i64);
        *selected = next as usize;
    }

    fn run_selected_command(&mut self) {
        if self.tab != Tab::Commands {
            return;
        }
        if let Some(pending) = &self.command_pending {
            self.set_status(format!("{pending} is still running"));
            return;
        }
        let Some(name) = self.command_names.get(self.selected_command).cloned() else {
            return;
        };
        self.service.submit_command(&name);
        self.set_status(format!("Running {name}..."));
        self.command_pending = Some(name);
    }

    fn kill_selected(&mut self) {
        if self.tab != Tab::Processes {
            return;
        }
        if let Some(pid) = self.selected_pid() {
            self.service.request_kill(pid);
            self.set_status(format!("Signalling process {pid}..."));
        }
    }

    fn step_interval(&mut self, direction: i64) {
        let current = self.service.sample_interval();
        let next = if direction < 0 {
            INTERVAL_STEPS
                .iter()
                .rev()
                .find(|s| **s < current - 1e-9)
                .copied()
        } else {
            INTERVAL_STEPS.iter().find(|s| **s > current + 1e-9).copied()
        };
        let Some(next) = next else {
            return;
        };
        if self.service.set_sample_interval(next).is_ok() {
            self.set_status(format!("Sampling every {next}s"));
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn shutdown(&mut self) {
        self.service.stop();
    }
}

pub fn sort_processes(processes: &mut [ProcessInfo], sort: ProcessSort) {
    match sort {
        ProcessSort::Cpu => processes.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(Ordering::Equal)
        }),
        ProcessSort::Memory => processes.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes)),
        ProcessSort::Name => {
            processes.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        ProcessSort::Pid => processes.sort_by_key(|p| p.pid),
    }
}
