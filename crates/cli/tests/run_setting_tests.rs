// Integration tests for `stainplan run-setting`.
// Run with: cargo test -p stainplan-cli --test run_setting_tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn stainplan() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stainplan"));
    cmd.env_remove("STAINPLAN_RUN_SETTING");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn run_setting(args: &[&str], config: &Path) -> Output {
    stainplan()
        .arg("run-setting")
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .expect("run stainplan run-setting")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({}): {}", e, String::from_utf8_lossy(&output.stdout))
    })
}

#[test]
fn show_without_record_prints_empty_setting() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_setting(&["show"], &dir.path().join("runsetting.json"));
    assert!(output.status.success());
    let value = json(&output);
    assert!(value.get("stepCount").is_none());
    assert_eq!(value["visualFieldConfigs"], serde_json::json!([]));
}

#[test]
fn set_show_reset_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested/runsetting.json");

    let output = run_setting(
        &["set", "--step-count", "4", "--visual-field-count", "3", "--field", "5:5", "--field", ":8"],
        &config,
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("saved"));
    assert!(config.exists(), "parent directory is created");

    let shown = json(&run_setting(&["show"], &config));
    assert_eq!(shown["stepCount"], 4);
    assert_eq!(shown["visualFieldCount"], 3);
    assert_eq!(
        shown["visualFieldConfigs"],
        serde_json::json!([
            { "imageCountNegative": 5, "imageCountPositive": 5 },
            { "imageCountPositive": 8 }
        ])
    );

    // Partial update keeps the other fields
    let output = run_setting(&["set", "--step-count", "0"], &config);
    assert!(output.status.success());
    let shown = json(&output);
    assert_eq!(shown["stepCount"], 0);
    assert_eq!(shown["visualFieldCount"], 3);
    assert_eq!(shown["visualFieldConfigs"].as_array().unwrap().len(), 2);

    let output = run_setting(&["set", "--clear-fields"], &config);
    assert!(output.status.success());
    assert_eq!(json(&output)["visualFieldConfigs"], serde_json::json!([]));

    let output = run_setting(&["reset"], &config);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("removed"));
    assert!(!config.exists());

    let output = run_setting(&["reset"], &config);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("no run setting"));
}

#[test]
fn set_without_fields_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("runsetting.json");
    let output = run_setting(&["set"], &config);
    assert_eq!(output.status.code(), Some(2));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("nothing to set"), "stderr: {}", err);
    assert!(err.contains("hint:"));
    assert!(!config.exists());
}

#[test]
fn set_rejects_bad_field_counts() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_setting(&["set", "--field", "five"], &dir.path().join("runsetting.json"));
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn show_reads_hand_edited_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("runsetting.json");
    fs::write(
        &config,
        "// written on the instrument PC\n{ \"stepCount\": \"6\", \"visualFieldCount\": 2.0 }\n",
    )
    .unwrap();
    let shown = json(&run_setting(&["show"], &config));
    assert_eq!(shown["stepCount"], 6);
    assert_eq!(shown["visualFieldCount"], 2);
}

#[test]
fn show_template_values() {
    let dir = tempfile::tempdir().unwrap();
    let output = stainplan()
        .args(["run-setting", "show", "--template"])
        .arg(fixture("template_base.xml"))
        .arg("--config")
        .arg(dir.path().join("unused.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown = json(&output);
    assert_eq!(shown["stepCount"], 10);
    assert_eq!(shown["visualFieldCount"], 3);
    assert_eq!(shown["visualFieldConfigs"].as_array().unwrap().len(), 3);
    assert_eq!(shown["visualFieldConfigs"][2]["imageCountNegative"], 3);
}

#[test]
fn show_missing_template_exits_3() {
    let output = stainplan()
        .args(["run-setting", "show", "--template", "/no/such/template.xml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn store_path_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("env.json");
    let output = stainplan()
        .env("STAINPLAN_RUN_SETTING", &config)
        .args(["run-setting", "set", "--step-count", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stored: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(stored["stepCount"], 2);
}

#[test]
fn no_subcommand_is_usage_error() {
    let output = stainplan().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
