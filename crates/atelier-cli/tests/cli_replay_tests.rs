//! CLI replay integration tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn seed_document() -> serde_json::Value {
    serde_json::json!({
        "entities": {
            "c1": {
                "type": "content",
                "id": "c1",
                "position": { "x": 0.0, "y": 0.0 },
                "visible": true,
                "material": null
            },
            "w1": {
                "type": "wall",
                "id": "w1",
                "from": { "x": 0.0, "y": 0.0 },
                "to": { "x": 4000.0, "y": 0.0 },
                "width": 120.0,
                "height": 2800.0,
                "material": null,
                "layer_id": null
            }
        }
    })
}

fn write_script(dir: &TempDir, steps: serde_json::Value) -> PathBuf {
    let path = dir.path().join("script.json");
    let script = serde_json::json!({ "document": seed_document(), "steps": steps });
    fs::write(&path, serde_json::to_string_pretty(&script).unwrap()).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    let cli_bin = env!("CARGO_BIN_EXE_atelier");
    Command::new(cli_bin)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_replay_prints_history_and_cursor() {
    // GIVEN a script with two commits and one undo
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        &temp_dir,
        serde_json::json!([
            { "op": "commit", "kind": "SetParameter",
              "params": { "entity_id": "c1", "name": "width", "value": 900.0 } },
            { "op": "commit", "kind": "CutWall",
              "params": { "wall_id": "w1", "position": { "x": 1000.0, "y": 0.0 } } },
            { "op": "undo" }
        ]),
    );

    // WHEN replayed
    let output = run(&["replay", script.to_str().unwrap()]);

    // THEN both entries are listed and the cursor sits after the first
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("*  1. [parameter] Set width"), "{}", stdout);
    assert!(stdout.contains("   2. [wall] Cut wall"), "{}", stdout);
    assert!(stdout.contains("cursor: 1/2"), "{}", stdout);
}

#[test]
fn test_replay_session_is_one_entry() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        &temp_dir,
        serde_json::json!([
            { "op": "begin_session", "description": "Resize" },
            { "op": "commit", "kind": "SetParameter",
              "params": { "entity_id": "c1", "name": "width", "value": 900.0 } },
            { "op": "commit", "kind": "SetParameter",
              "params": { "entity_id": "c1", "name": "depth", "value": 600.0 } },
            { "op": "commit_session" }
        ]),
    );
    let out_path = temp_dir.path().join("out.json");

    let output = run(&[
        "replay",
        script.to_str().unwrap(),
        "--output",
        out_path.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. [session] Resize"), "{}", stdout);
    assert!(stdout.contains("cursor: 1/1"), "{}", stdout);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written["entities"]["c1"]["params"]["depth"], 600.0);
}

#[test]
fn test_replay_unknown_kind_fails_with_step_number() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        &temp_dir,
        serde_json::json!([
            { "op": "undo" },
            { "op": "commit", "kind": "SplitRoom", "params": {} }
        ]),
    );

    let output = run(&["replay", script.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: step 2"), "{}", stderr);
    assert!(stderr.contains("SplitRoom"), "{}", stderr);
}

#[test]
fn test_replay_honours_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("atelier.toml");
    fs::write(&config, "max_undo_steps = 1\n[logging]\nprofile = \"test\"\n").unwrap();
    let script = write_script(
        &temp_dir,
        serde_json::json!([
            { "op": "commit", "kind": "SetParameter",
              "params": { "entity_id": "c1", "name": "a", "value": 1.0 } },
            { "op": "commit", "kind": "SetParameter",
              "params": { "entity_id": "c1", "name": "b", "value": 2.0 } }
        ]),
    );

    let output = run(&[
        "replay",
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cursor: 1/1"), "{}", stdout);
    assert!(stdout.contains("Set b"), "{}", stdout);
    assert!(!stdout.contains("Set a"), "{}", stdout);
}

#[test]
fn test_kinds_lists_registered_kinds() {
    let output = run(&["kinds"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "CutWall"));
    assert!(stdout.lines().any(|l| l == "MoveSlabProfileVertex"));
    assert_eq!(stdout.lines().count(), 8);
}
