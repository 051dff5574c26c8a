//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with SETCLOCK_HOME pointed at a temporary
//! directory and verify outputs.

use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command against `home` and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_setclock"))
        .args(args)
        .env("SETCLOCK_HOME", home.path())
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

/// Create a routine and return its id.
fn create_routine(home: &TempDir, args: &[&str]) -> String {
    let mut full = vec!["routine", "new"];
    full.extend_from_slice(args);
    let stdout = run_cli_success(home, &full);
    stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Routine created: "))
        .expect("missing routine id")
        .to_string()
}

#[test]
fn test_routine_new_and_list() {
    let home = TempDir::new().unwrap();
    let id = create_routine(&home, &["Legs", "--round", "Squats:2:30:10:5"]);

    let stdout = run_cli_success(&home, &["routine", "list"]);
    assert!(stdout.contains(&id));
    assert!(stdout.contains("Legs"));

    let stdout = run_cli_success(&home, &["routine", "list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["rounds"][0]["extraBreak"], 5);
    assert_eq!(parsed[0]["autoStart"], true);
}

#[test]
fn test_routine_add_normalizes_json() {
    let home = TempDir::new().unwrap();
    let json = r#"{"id":"fixed","name":"Loose","rounds":[{"name":"Jacks","sets":"x","work":"20"}]}"#;
    let stdout = run_cli_success(&home, &["routine", "add", json]);
    assert!(stdout.contains("Routine saved: fixed"));

    let stdout = run_cli_success(&home, &["routine", "show", "fixed"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["rounds"][0]["sets"], 1);
    assert_eq!(parsed["rounds"][0]["work"], 20);
    assert_eq!(parsed["rounds"][0]["rest"], 0);
}

#[test]
fn test_routine_add_rejects_empty_routine() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["routine", "add", r#"{"name":"Nothing"}"#]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_routine_delete() {
    let home = TempDir::new().unwrap();
    let id = create_routine(&home, &["Arms", "--round", "Curls:1:10:10"]);
    run_cli_success(&home, &["routine", "delete", &id]);

    let (_, stderr, code) = run_cli(&home, &["routine", "show", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains(&id));
}

#[test]
fn test_timeline_json() {
    let home = TempDir::new().unwrap();
    let id = create_routine(
        &home,
        &["Two", "--round", "A:1:20:10", "--round", "B:1:20:10", "--round-rest", "15"],
    );

    let stdout = run_cli_success(&home, &["timeline", &id, "--json"]);
    let phases: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let kinds: Vec<&str> = phases.iter().map(|p| p["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["work", "rest", "round_rest", "work", "rest"]);
    let total: u64 = phases.iter().map(|p| p["duration_secs"].as_u64().unwrap()).sum();
    assert_eq!(total, 75);

    let stdout = run_cli_success(&home, &["timeline", &id]);
    assert!(stdout.contains("total 1:15 (2 min), estimate 1:15"));
}

#[test]
fn test_workout_runs_to_completion() {
    let home = TempDir::new().unwrap();
    let id = create_routine(&home, &["Quick", "--round", "Jacks:2:1:1:1"]);

    let stdout = run_cli_success(&home, &["workout", &id, "--tick-ms", "5"]);
    assert!(stdout.contains("▶ Jacks [work]"));
    assert!(stdout.contains("Workout complete."));
    assert!(stdout.trim_end().ends_with("finished"));

    let stdout = run_cli_success(&home, &["routine", "show", &id]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["lastStarted"].is_string());
    assert!(parsed["lastFinished"].is_string());
}

#[test]
fn test_workout_unknown_routine() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["workout", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("missing"));
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_cli_success(&home, &["config", "get", "defaults.work"]).trim(), "30");

    let stdout = run_cli_success(&home, &["config", "set", "defaults.work", "45"]);
    assert_eq!(stdout.trim(), "defaults.work = 45");
    let stdout = run_cli_success(&home, &["config", "get", "defaults.work", "sound.muted"]);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["45", "false"]);

    let (stdout, stderr, code) =
        run_cli(&home, &["config", "get", "defaults.work", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unknown config key: no.such.key"));

    let stdout = run_cli_success(&home, &["config", "list"]);
    assert!(stdout.contains("playback.break_secs = 30"));
    let stdout = run_cli_success(&home, &["config", "list", "sound"]);
    assert!(stdout.contains("sound.muted = false"));
    assert!(stdout.lines().all(|line| line.starts_with("sound.")));

    run_cli_success(&home, &["config", "reset"]);
    assert_eq!(run_cli_success(&home, &["config", "get", "defaults.work"]).trim(), "30");
}

#[test]
fn test_sound_mute_toggle() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_cli_success(&home, &["sound", "status"]).trim(), "unmuted");
    run_cli_success(&home, &["sound", "mute"]);
    assert_eq!(run_cli_success(&home, &["sound", "status"]).trim(), "muted");
    assert_eq!(run_cli_success(&home, &["config", "get", "sound.muted"]).trim(), "true");
    run_cli_success(&home, &["sound", "unmute"]);
    assert_eq!(run_cli_success(&home, &["sound", "status"]).trim(), "unmuted");
}
