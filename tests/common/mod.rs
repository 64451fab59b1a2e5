#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const TODAY: &str = "2024-03-31";

/// Creates an isolated application home for one test.
pub fn fresh_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Script-mode invocation of the shell against `home`, with a pinned date and no colour.
pub fn shell(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("budget_buddy_cli").expect("binary built");
    cmd.env("BUDGET_BUDDY_CLI_SCRIPT", "1")
        .env("BUDGET_BUDDY_HOME", home)
        .env("BUDGET_BUDDY_TODAY", TODAY)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs one script and returns its stdout.
pub fn run_script(home: &Path, script: &str) -> String {
    let output = shell(home)
        .write_stdin(script.to_string())
        .output()
        .expect("run shell");
    assert!(output.status.success(), "shell exited with {:?}", output.status);
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

/// Owner id assigned in the config file on first launch.
pub fn owner_id(home: &Path) -> String {
    let raw = std::fs::read_to_string(home.join("config").join("config.json"))
        .expect("read config");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("parse config");
    json["owner_id"].as_str().expect("owner id").to_string()
}
