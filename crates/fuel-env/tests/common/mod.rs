use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Output;

use serde_json::{Value, json};
use tempfile::TempDir;

/// Settings for a one-node environment on `master_ip`, without URL overrides.
pub fn base_settings() -> Value {
    json!({
        "env_name": "lab",
        "master_ip": "127.0.0.1",
        "networks": {
            "public_network": {"cidr": "172.16.0.0/24", "gateway": "172.16.0.1"},
            "floating_ranges": [["172.16.0.130", "172.16.0.254"]]
        },
        "nodes": [
            {"mac": "52:54:00:00:00:01", "roles": ["controller"], "name": "ctrl-1"}
        ]
    })
}

/// Point the settings at a mock server for both Nailgun and keystone.
pub fn settings_for(uri: &str) -> Value {
    let mut settings = base_settings();
    settings["nailgun_url"] = json!(uri);
    settings["keystone_url"] = json!(format!("{}/v2.0", uri));
    settings["timeout_secs"] = json!(5);
    settings
}

/// Write settings into a fresh temp dir and return both.
pub fn write_settings(settings: &Value) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("env.json");
    std::fs::write(&path, settings.to_string()).expect("Failed to write settings");
    (dir, path)
}

/// Run the CLI binary with arguments.
pub async fn run_cli<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    tokio::process::Command::new(env!("CARGO_BIN_EXE_fuel-env"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("Failed to execute CLI")
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
