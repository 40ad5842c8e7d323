//! Basic CLI E2E tests.
//!
//! Each test runs the `yogik` binary against its own database file.

use std::path::Path;
use std::process::Command;

const SEQUENCE_DOC: &str = r#"{
  "version": 1,
  "sequence": {
    "id": "0d6f3c8e-8f5e-4a7b-9c1e-2b3a4d5e6f70",
    "name": "Quick Stretch",
    "poses": [
      {
        "id": "5a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d",
        "name": "Mountain",
        "transitionTime": 1,
        "instruction": "Stand tall",
        "holdTime": 1,
        "holdPrompt": ""
      }
    ]
  }
}"#;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(db: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_yogik"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("YOGIK_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn workspace() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("yogik.db");
    (dir, db)
}

#[test]
fn test_settings_set_and_show() {
    let (_dir, db) = workspace();
    let (code, stdout, _) = run_cli(&db, &["settings", "set", "prep_time_secs", "7"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ok"));

    let (code, stdout, _) = run_cli(&db, &["settings", "show"]);
    assert_eq!(code, 0);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["prep_time_secs"], 7);
    assert_eq!(settings["breath_in_label"], "Inhale");
}

#[test]
fn test_settings_rejects_out_of_range() {
    let (_dir, db) = workspace();
    let (code, _, stderr) = run_cli(&db, &["settings", "set", "prep_time_secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_settings_reset() {
    let (_dir, db) = workspace();
    run_cli(&db, &["settings", "set", "voice_id", "karen"]);
    let (code, _, _) = run_cli(&db, &["settings", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&db, &["settings", "show"]);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["voice_id"], "");
}

#[test]
fn test_history_empty() {
    let (_dir, db) = workspace();
    let (code, stdout, _) = run_cli(&db, &["history", "list", "--mode", "yoga"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No history."));

    let (code, _, _) = run_cli(&db, &["history", "delete", "--mode", "pranayama", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_sequence_import_export_delete() {
    let (dir, db) = workspace();
    let file = dir.path().join("stretch.yogikseq");
    std::fs::write(&file, SEQUENCE_DOC).unwrap();

    let (code, stdout, _) = run_cli(&db, &["sequence", "import", file.to_str().unwrap()]);
    assert_eq!(code, 0, "import failed");
    assert!(stdout.contains("Quick Stretch"));

    let (code, stdout, _) = run_cli(&db, &["sequence", "list", "--json"]);
    assert_eq!(code, 0);
    let listed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
    assert_eq!(listed[1]["name"], "Quick Stretch");
    assert_eq!(listed[1]["isPreset"], false);

    let id = "0d6f3c8e-8f5e-4a7b-9c1e-2b3a4d5e6f70";
    let (code, stdout, _) = run_cli(&db, &["sequence", "export", id]);
    assert_eq!(code, 0);
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["sequence"]["poses"][0]["name"], "Mountain");

    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let (code, _, _) = run_cli(
        &db,
        &["sequence", "export", id, "--out", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(out.join("Quick_Stretch.yogikseq").exists());

    let (code, _, _) = run_cli(&db, &["sequence", "delete", id]);
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(&db, &["sequence", "delete", id]);
    assert_eq!(code, 1);
}

#[test]
fn test_sequence_list_shows_preset() {
    let (_dir, db) = workspace();
    let (code, stdout, _) = run_cli(&db, &["sequence", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Sun Salutation (Surya Namaskar) (23 poses)"));
}

#[test]
fn test_sequence_list_json_matches_text() {
    let (_dir, db) = workspace();
    let (code, stdout, _) = run_cli(&db, &["sequence", "list", "--json"]);
    assert_eq!(code, 0);
    let listed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Sun Salutation (Surya Namaskar)");
    assert_eq!(listed[0]["isPreset"], true);
    assert_eq!(listed[0]["poses"].as_array().map(Vec::len), Some(23));
}

#[test]
fn test_import_rejects_newer_version() {
    let (dir, db) = workspace();
    let file = dir.path().join("future.yogikseq");
    std::fs::write(&file, SEQUENCE_DOC.replace("\"version\": 1", "\"version\": 2")).unwrap();
    let (code, _, stderr) = run_cli(&db, &["sequence", "import", file.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("version 2"));
}

#[test]
fn test_custom_requires_one_source() {
    let (_dir, db) = workspace();
    let (code, _, _) = run_cli(&db, &["custom"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(&db, &["custom", "--preset", "--file", "x.yogikseq"]);
    assert_ne!(code, 0);
}

#[test]
fn test_kriya_rejects_empty_stage() {
    let (_dir, db) = workspace();
    let (code, _, stderr) = run_cli(&db, &["kriya", "--stage", "0,0,5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Stage 0"));
}

#[test]
fn test_custom_file_runs_to_completion() {
    let (dir, db) = workspace();
    run_cli(&db, &["settings", "set", "prep_time_secs", "1"]);
    let file = dir.path().join("stretch.yogikseq");
    std::fs::write(&file, SEQUENCE_DOC).unwrap();

    let (code, stdout, _) = run_cli(&db, &["custom", "--file", file.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("> Prepare for your practice. Take position."));
    assert!(stdout.contains("> Mountain"));
    assert!(stdout.contains("> Practice complete. Well done."));
    assert!(stdout.contains("Finished: 1 rounds"));

    // Running from a file does not save it.
    let (_, stdout, _) = run_cli(&db, &["sequence", "list", "--json"]);
    let listed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["isPreset"], true);
}

#[test]
fn test_pranayama_rounds_recorded_in_history() {
    let (_dir, db) = workspace();
    run_cli(&db, &["settings", "set", "prep_time_secs", "1"]);
    let (code, stdout, _) = run_cli(
        &db,
        &["pranayama", "--ratio", "1:0:1:0", "--rounds", "1"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Finished: 1 rounds"));

    let (code, stdout, _) = run_cli(&db, &["history", "list", "--mode", "pranayama", "--json"]);
    assert_eq!(code, 0);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries[0]["name"], "1:0:1:0");
    assert_eq!(entries[0]["outcome"], 1);

    let (code, _, _) = run_cli(&db, &["history", "clear", "--mode", "pranayama"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&db, &["history", "list", "--mode", "pranayama"]);
    assert!(stdout.contains("No history."));
}

#[test]
fn test_named_kriya_is_saved() {
    let (_dir, db) = workspace();
    run_cli(&db, &["settings", "set", "prep_time_secs", "1"]);
    let (code, _, _) = run_cli(
        &db,
        &["kriya", "--stage", "0.25,0.25,2", "--name", "Short", "--repeat", "1"],
    );
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(&db, &["kriyas", "list", "--json"]);
    assert_eq!(code, 0);
    let kriyas: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(kriyas[0]["name"], "Short");
    assert_eq!(kriyas[0]["rounds"][0]["counts"], 2);
}
