use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn billscan(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("billscan").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    billscan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    billscan(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"marker\": \"Statement\""))
        .stdout(predicate::str::contains("\"max_meter_read_delta\": 5000"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("billscan.json");
    let path = path.to_str().unwrap();

    billscan(&home)
        .args(["--config", path, "config", "set", "family", "gas"])
        .assert()
        .success();

    billscan(&home)
        .args(["--config", path, "config", "get", "family"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gas\""));
}

#[test]
fn config_set_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("billscan.json");

    billscan(&home)
        .args(["--config", path.to_str().unwrap(), "config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn extract_reports_unreadable_documents_and_writes_output() {
    let home = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    fs::write(input.path().join("2020-01-01 Statement.pdf"), b"garbage").unwrap();
    fs::write(input.path().join("2020-01-01 Notice.pdf"), b"ignored").unwrap();
    let output = input.path().join("water.json");

    billscan(&home)
        .arg("extract")
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNINGS:"))
        .stdout(predicate::str::contains("2020-01-01 Statement.pdf: could not read"))
        .stdout(predicate::str::contains("Total statements processed: 0"))
        .stdout(predicate::str::contains("With CF data: 0"))
        .stdout(predicate::str::contains("Notice").not());

    assert_eq!(fs::read_to_string(&output).unwrap(), "[]");
}

#[test]
fn extract_writes_summary_csv() {
    let home = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    fs::write(input.path().join("2021-07-02 Statement.pdf"), b"garbage").unwrap();
    let summary = input.path().join("summary.csv");

    billscan(&home)
        .arg("extract")
        .args(["--family", "gas"])
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(input.path().join("gas.json"))
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("With therms data: 0"))
        .stdout(predicate::str::contains("With delivery data: 0"));

    let csv = fs::read_to_string(&summary).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("filename,status,statement_date,period_start,period_end,therms,supply,delivery,error")
    );
    assert!(lines.next().unwrap().starts_with("2021-07-02 Statement.pdf,unreadable,"));
}

#[test]
fn incremental_extract_without_new_statements() {
    let home = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let output = input.path().join("electric.json");
    let existing = r#"[{"filename": "2020-05-22 Statement.pdf", "kwh": 512, "supply": 48.0, "delivery": 61.04, "period_start": null, "period_end": null, "statement_date": "2020-05-22"}]"#;
    fs::write(&output, existing).unwrap();
    fs::write(input.path().join("2020-05-22 Statement.pdf"), b"garbage").unwrap();

    billscan(&home)
        .arg("extract")
        .args(["--family", "electric", "--incremental"])
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("No new statements found."));

    assert_eq!(fs::read_to_string(&output).unwrap(), existing);
}

#[test]
fn incremental_extract_keeps_existing_records() {
    let home = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let output = input.path().join("electric.json");
    fs::write(
        &output,
        r#"[{"filename": "2020-05-22 Statement.pdf", "kwh": 512, "supply": 48.0, "delivery": 61.04}]"#,
    )
    .unwrap();
    fs::write(input.path().join("2020-05-22 Statement.pdf"), b"garbage").unwrap();
    fs::write(input.path().join("2020-06-22 Statement.pdf"), b"garbage").unwrap();

    billscan(&home)
        .arg("extract")
        .args(["--family", "electric", "--incremental"])
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("2020-06-22 Statement.pdf: could not read"))
        .stdout(predicate::str::contains("New statements processed: 0"))
        .stdout(predicate::str::contains("Total statements: 1"))
        .stdout(predicate::str::contains("With kWh data: 1"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(saved.as_array().map(Vec::len), Some(1));
    assert_eq!(saved[0]["kwh"], 512);
}

#[test]
fn extract_fails_without_input_directory() {
    let home = TempDir::new().unwrap();
    billscan(&home)
        .args(["extract", "--input", "/nonexistent/billscan/statements"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input directory not found"));
}

#[test]
fn parse_rejects_unreadable_file() {
    let home = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let file = input.path().join("2020-01-01 Statement.pdf");
    fs::write(&file, b"garbage").unwrap();

    billscan(&home)
        .arg("parse")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse PDF"));
}
