// `bomtally map` and `bomtally validate` against the real binary.
//
// Run with: cargo test -p bomtally-cli --test map_validate_tests

use std::path::{Path, PathBuf};
use std::process::Command;

fn bomtally() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bomtally"))
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ===========================================================================
// bomtally map
// ===========================================================================

#[test]
fn map_prints_the_inferred_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(
        dir.path(),
        "layout.csv",
        "Part Number,Qty,Unit,Description\n00123,10,PC,Bolt\n",
    );

    let output = bomtally().arg("map").arg(&file).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 rows"), "stdout: {}", stdout);
    assert!(stdout.contains("identifier"), "stdout: {}", stdout);
    assert!(stdout.contains("'Part Number'"), "stdout: {}", stdout);
    assert!(stdout.contains("column 1"), "columns are 1-indexed: {}", stdout);
    assert!(stdout.contains("high"), "stdout: {}", stdout);
}

#[test]
fn map_marks_roles_nothing_matched() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "partial.csv", "Part Number,Qty\n00123,10\n");

    let output = bomtally().arg("map").arg(&file).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unmapped"), "stdout: {}", stdout);
}

#[test]
fn map_exits_three_when_identifier_is_unmappable() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "odd.csv", "Color,Shape,Weight\nred,round,3\n");

    let output = bomtally().arg("map").arg(&file).output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {}", stderr);
    assert!(stderr.contains("identifier"), "stderr: {}", stderr);
}

#[test]
fn map_exits_four_on_an_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "empty.csv", "");

    let output = bomtally().arg("map").arg(&file).output().unwrap();

    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty"), "stderr: {}", stderr);
}

#[test]
fn map_respects_a_custom_alias_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "odd.csv", "Artikelnummer,Qty\n00123,10\n");
    let config = write(
        dir.path(),
        "custom.toml",
        "[aliases]\nidentifier = [\"Artikelnummer\"]\n",
    );

    let output = bomtally()
        .arg("map")
        .arg(&file)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("'Artikelnummer'"), "stdout: {}", stdout);
}

// ===========================================================================
// bomtally validate
// ===========================================================================

#[test]
fn validate_accepts_a_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "bomtally.toml",
        r#"
[thresholds]
similarity = 0.75
quantity_tolerance = 0.02
description_similarity = 0.80

[aliases]
identifier = ["Part Number", "SKU"]

[units]
PC = ["PC", "PCS", "PIEZA"]
KG = ["KG", "KILO"]
"#,
    );

    let output = bomtally().arg("validate").arg(&config).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("valid:"), "stderr: {}", stderr);
    assert!(stderr.contains("similarity 0.75"), "stderr: {}", stderr);
    assert!(stderr.contains("2 identifier"), "stderr: {}", stderr);
    assert!(stderr.contains("2 canonical token(s)"), "stderr: {}", stderr);
    assert!(stderr.contains("5 accepted spelling(s)"), "stderr: {}", stderr);
}

#[test]
fn validate_rejects_bad_toml_with_exit_five() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "broken.toml", "[thresholds\nsimilarity = ");

    let output = bomtally().arg("validate").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {}", stderr);
    assert!(stderr.contains("config parse error"), "stderr: {}", stderr);
}

#[test]
fn validate_rejects_out_of_range_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "zero.toml", "[thresholds]\nsimilarity = 0.0\n");

    let output = bomtally().arg("validate").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("thresholds.similarity"), "stderr: {}", stderr);
}

#[test]
fn validate_missing_file_exits_five() {
    let dir = tempfile::tempdir().unwrap();

    let output = bomtally()
        .arg("validate")
        .arg(dir.path().join("nope.toml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(5));
}
