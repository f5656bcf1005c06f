use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

#[test]
fn monitor_core_is_ui_free() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/monitor");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for forbidden in ["ratatui", "crossterm", "crate::ui", "crate::app"] {
            if content.contains(forbidden) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    forbidden
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Monitor layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn ui_module_does_not_read_the_platform_directly() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/ui");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for forbidden in ["sysinfo", "std::process"] {
            if content.contains(forbidden) {
                violations.push(format!(
                    "{} reaches past the monitor core via `{}`",
                    rel(&file),
                    forbidden
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "UI/platform boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn os_specific_cfg_is_scoped_to_the_command_table() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if !content.contains("cfg(windows)") && !content.contains("cfg(not(windows))") {
            continue;
        }

        let rel_path = rel(&file);
        if rel_path != "src/monitor/command.rs" {
            violations.push(format!(
                "{} contains an OS cfg but is outside the allowed boundary",
                rel_path
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Unexpected OS cfg usage:\n{}",
        violations.join("\n")
    );
}
