//! Corruption and legacy-data tests for the doselog binary.
//!
//! These tests verify the system handles:
//! - Files written by the earlier tool (no id column)
//! - Malformed rows (reported, never silently dropped)
//! - Empty and missing files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.toml"), "").expect("Failed to write config");
    dir
}

fn data_file(dir: &TempDir) -> PathBuf {
    dir.path().join("glp1_data.csv")
}

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("doselog"));
    cmd.arg("--data-file")
        .arg(data_file(dir))
        .arg("--config")
        .arg(dir.path().join("config.toml"));
    cmd
}

const LEGACY: &str = "date,weight,dose,nausea,fatigue,gi,sleep,notes\n\
2024-01-01,200.0,2.0,0,0,0,0,\n\
2024-01-08,198.5,2.0,2,1,0,0,mild nausea after dinner\n\
2024-02-01,190.0,6.0,1,3,2,1,\n";

#[test]
fn test_legacy_file_is_readable() {
    let dir = setup_test_dir();
    fs::write(data_file(&dir), LEGACY).unwrap();

    cli(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Loss       10.0 lbs"))
        .stdout(predicate::str::contains("Days Tracking    31"));

    // Reading alone leaves the file as it was
    assert_eq!(fs::read_to_string(data_file(&dir)).unwrap(), LEGACY);
}

#[test]
fn test_legacy_file_gains_ids_on_first_write() {
    let dir = setup_test_dir();
    fs::write(data_file(&dir), LEGACY).unwrap();

    cli(&dir)
        .args(["edit", "--entry", "2024-01-08 | 198.5 lbs | 2.0mg", "--nausea", "3"])
        .assert()
        .success();

    let content = fs::read_to_string(data_file(&dir)).unwrap();
    assert!(content.starts_with("date,weight,dose,nausea,fatigue,gi,sleep,notes,id\n"));
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("2024-01-08,198.5,2.0,3,1,0,0,mild nausea after dinner,"));

    // A second write keeps the ids it was given
    let first_ids: Vec<String> = content
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap().to_string())
        .collect();
    cli(&dir)
        .args(["edit", "--entry", "2024-01-01 | 200.0 lbs | 2.0mg", "--gi", "1"])
        .assert()
        .success();
    let content = fs::read_to_string(data_file(&dir)).unwrap();
    let second_ids: Vec<String> = content
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap().to_string())
        .collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn test_legacy_file_delete_by_listed_id() {
    let dir = setup_test_dir();
    fs::write(data_file(&dir), LEGACY).unwrap();

    let output = cli(&dir)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output).unwrap();
    let newest_id = rows[0]["id"].as_str().unwrap().to_string();

    // Listing twice shows the same ids
    let again = cli(&dir)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(output, again);

    cli(&dir)
        .args(["delete", "--id", &newest_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    let content = fs::read_to_string(data_file(&dir)).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(!content.contains("2024-02-01"));
}

#[test]
fn test_malformed_date_is_reported() {
    let dir = setup_test_dir();
    fs::write(
        data_file(&dir),
        "date,weight,dose,nausea,fatigue,gi,sleep,notes\n\
         2024-01-01,200.0,2.0,0,0,0,0,\n\
         someday,199.0,2.0,0,0,0,0,\n",
    )
    .unwrap();

    cli(&dir)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse"))
        .stderr(predicate::str::contains("line: 3"));
}

#[test]
fn test_malformed_file_is_not_overwritten() {
    let dir = setup_test_dir();
    let broken = "date,weight,dose,nausea,fatigue,gi,sleep,notes\n2024-01-01,,2.0,0,0,0,0,\n";
    fs::write(data_file(&dir), broken).unwrap();

    cli(&dir)
        .args(["add", "--date", "2024-01-02", "--weight", "199", "--dose", "2"])
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(data_file(&dir)).unwrap(), broken);
}

#[test]
fn test_missing_column_is_reported() {
    let dir = setup_test_dir();
    fs::write(data_file(&dir), "date,weight\n2024-01-01,200.0\n").unwrap();

    cli(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing column"));
}

#[test]
fn test_empty_file_is_empty_collection() {
    let dir = setup_test_dir();
    fs::write(data_file(&dir), "").unwrap();

    cli(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data yet"));

    cli(&dir)
        .args(["add", "--date", "2024-01-01", "--weight", "200", "--dose", "2"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(data_file(&dir)).unwrap().lines().count(),
        2
    );
}

#[test]
fn test_header_only_file() {
    let dir = setup_test_dir();
    fs::write(
        data_file(&dir),
        "date,weight,dose,nausea,fatigue,gi,sleep,notes,id\n",
    )
    .unwrap();

    cli(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data yet"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = setup_test_dir();
    fs::write(dir.path().join("config.toml"), "[stats]\nweekly_change_policy = 7\n").unwrap();

    cli(&dir).arg("stats").assert().failure();
}
