// ImpLog - tests/cli_replay.rs
//
// End-to-end tests for the `implog` binary: real process, real files, real
// stdout.

use std::path::Path;
use std::process::{Command, Output};

const DEVICE: &str = "0c2a6921f6e04aee";

/// Run the binary on `input` with an empty config and colour disabled.
fn run_implog(dir: &Path, input: &[u8]) -> Output {
    let input_path = dir.join("in.log");
    std::fs::write(&input_path, input).unwrap();
    let config_path = dir.join("empty.toml");
    std::fs::write(&config_path, "").unwrap();

    Command::new(env!("CARGO_BIN_EXE_implog"))
        .arg(&input_path)
        .arg("--config")
        .arg(&config_path)
        .args(["--colour", "never"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// An invalid UTF-8 byte is replaced and the lines around it still render.
#[test]
fn e2e_cli_replays_past_invalid_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let mut input = format!("{DEVICE} x development server.log first\n").into_bytes();
    input.extend_from_slice(b"bad \xff byte\r\n");
    input.extend_from_slice(format!("{DEVICE} x development agent.log third\n").as_bytes());

    let output = run_implog(dir.path(), &input);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(
        output.status.success(),
        "exit {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "got {stdout:?}");
    assert!(lines[0].ends_with(" [Device] first"), "got {:?}", lines[0]);
    assert_eq!(lines[1], "bad \u{FFFD} byte");
    assert!(lines[2].ends_with(" [Agent]  third"), "got {:?}", lines[2]);
}

/// Input without a trailing newline still yields its last line.
#[test]
fn e2e_cli_renders_unterminated_last_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = format!("{DEVICE} x production status online");

    let output = run_implog(dir.path(), input.as_bytes());
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.trim_end().ends_with(" [Status] online"), "got {stdout:?}");
}

/// A missing explicit config file is rejected before anything is read.
#[test]
fn e2e_cli_missing_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_implog"))
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}
