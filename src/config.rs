use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Sampling interval of the background collector, seconds.
    pub sample_interval_secs: f64,
    /// UI polling cadence, decoupled from the sampling interval.
    pub poll_rate_ms: u64,
    /// Points kept per history sparkline.
    pub history_length: usize,
    /// Cap on the process listing.
    pub process_limit: usize,
    /// cpu, memory, name, or pid.
    pub default_sort: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            sample_interval_secs: 1.0,
            poll_rate_ms: 250,
            history_length: 60,
            process_limit: 100,
            default_sort: "cpu".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub kill: String,
    pub refresh: String,
    pub run: String,
    pub cycle_sort: String,
    pub faster: String,
    pub slower: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            kill: "k".to_string(),
            refresh: "r".to_string(),
            run: "Enter".to_string(),
            cycle_sort: "s".to_string(),
            faster: "+".to_string(),
            slower: "-".to_string(),
        }
    }
}

pub fn parse_key(s: &str) -> Option<KeyCode> {
    match s {
        "Enter" => Some(KeyCode::Enter),
        "Escape" | "Esc" => Some(KeyCode::Esc),
        "Tab" => Some(KeyCode::Tab),
        "Space" => Some(KeyCode::Char(' ')),
        "Backspace" => Some(KeyCode::Backspace),
        "Delete" => Some(KeyCode::Delete),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(KeyCode::Char(c)),
                _ => None,
            }
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysdeck").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
