//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Config
//! commands run against the dev config directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(args: &[&str]) -> (i32, String, String) {
    collect(
        Command::new("cargo")
            .args(["run", "-q", "-p", "shakemeter-cli", "--"])
            .args(args)
            .env("SHAKEMETER_ENV", "dev"),
    )
}

/// Run a CLI command with `home` as the home directory.
fn run_cli_at(home: &Path, args: &[&str]) -> (i32, String, String) {
    collect(
        Command::new("cargo")
            .args(["run", "-q", "-p", "shakemeter-cli", "--"])
            .args(args)
            .env("SHAKEMETER_ENV", "dev")
            .env("HOME", home),
    )
}

/// Home directory holding the given dev config file.
fn home_with_config(toml: &str) -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".config").join("shakemeter-dev");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), toml).unwrap();
    home
}

fn json_events(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is a JSON event"))
        .collect()
}

fn has_event(events: &[serde_json::Value], kind: &str) -> bool {
    events.iter().any(|e| e["type"] == kind)
}

fn collect(command: &mut Command) -> (i32, String, String) {
    let output = command.output().expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_simulate_text() {
    let (code, stdout, _) = run_cli(&["simulate", "--pattern", "shake:3000,rest:1000"]);
    assert_eq!(code, 0, "simulate failed");
    assert!(stdout.contains("shakes"));
    assert!(stdout.contains("done:"));
}

#[test]
fn test_simulate_json_lines() {
    let (code, stdout, _) = run_cli(&["simulate", "--json", "--seed", "1"]);
    assert_eq!(code, 0, "simulate --json failed");

    let events = json_events(&stdout);
    assert!(!events.is_empty());
    assert!(has_event(&events, "StateSnapshot"));
}

#[test]
fn test_simulate_rejects_bad_pattern() {
    let (code, _, stderr) = run_cli(&["simulate", "--pattern", "wiggle:100"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown phase kind"));
}

#[test]
fn test_record_then_replay() {
    let dir = std::env::temp_dir().join(format!("shakemeter-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let trace = dir.join("trace.jsonl");
    let trace_arg = trace.to_str().unwrap();

    let (code, _, _) = run_cli(&["simulate", "--pattern", "shake:2000", "--record", trace_arg, "--json"]);
    assert_eq!(code, 0, "simulate --record failed");
    assert!(trace.exists());

    let (code, stdout, _) = run_cli(&["replay", trace_arg]);
    assert_eq!(code, 0, "replay failed");
    assert!(stdout.contains("done:"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_replay_missing_file() {
    let (code, _, stderr) = run_cli(&["replay", "/definitely/not/here.jsonl"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get() {
    let (code, stdout, _) = run_cli(&["config", "get", "meter.drive_tick_ms"]);
    assert_eq!(code, 0, "config get failed");
    assert!(stdout.trim().parse::<u64>().is_ok());
}

#[test]
fn test_config_get_unknown_key() {
    let (code, _, _) = run_cli(&["config", "get", "meter.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_show_and_path() {
    let (code, stdout, _) = run_cli(&["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    assert!(stdout.contains("[meter]"));

    let (code, stdout, _) = run_cli(&["config", "path"]);
    assert_eq!(code, 0, "config path failed");
    assert!(stdout.contains("shakemeter-dev"));
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let (code, _, _) = run_cli(&["config", "set", "meter.drive_tick_ms", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_invalid_config_is_fatal() {
    let home = home_with_config("[meter]\nmax_count = 10\nhot_threshold = 50\n");

    let (code, stdout, stderr) = run_cli_at(home.path(), &["simulate", "--pattern", "shake:3000"]);
    assert_ne!(code, 0, "simulate ran with an invalid config");
    assert!(!stdout.contains("done:"));
    assert!(stderr.contains("hot_threshold"));

    let trace = home.path().join("trace.jsonl");
    std::fs::write(&trace, "{\"at_ms\":0,\"x\":0.0,\"y\":0.0,\"z\":1.0}\n").unwrap();
    let (code, _, _) = run_cli_at(home.path(), &["replay", trace.to_str().unwrap()]);
    assert_ne!(code, 0, "replay ran with an invalid config");
}

#[test]
fn test_simulate_reset_at() {
    let home = home_with_config("");
    let (code, stdout, _) = run_cli_at(
        home.path(),
        &["simulate", "--pattern", "shake:3000", "--reset-at", "2000", "--json"],
    );
    assert_eq!(code, 0, "simulate --reset-at failed");

    let events = json_events(&stdout);
    let reset = events
        .iter()
        .find(|e| e["type"] == "CounterReset")
        .expect("a CounterReset event");
    assert!(reset["previous"].as_u64().unwrap() > 0);
}

#[test]
fn test_simulate_realtime() {
    let home = home_with_config("[meter]\nmax_count = 10\nhot_threshold = 5\n");
    let (code, stdout, stderr) = run_cli_at(
        home.path(),
        &[
            "simulate",
            "--realtime",
            "--pattern",
            "shake:1500",
            "--reset-at",
            "1000",
            "--json",
        ],
    );
    assert_eq!(code, 0, "simulate --realtime failed: {stderr}");

    let events = json_events(&stdout);
    assert!(has_event(&events, "StateSnapshot"));
    assert!(has_event(&events, "EnteredHot"));
    assert!(has_event(&events, "EffectStarted"));
    assert!(has_event(&events, "CounterReset"));
    assert!(has_event(&events, "EffectStopped"));
    // The console worker received the commands.
    assert!(stderr.contains("playing"));
    assert!(stderr.contains("stopped"));
}
