// Regression tests: drive the real binary against CSV fixtures and make sure
// failures are rendered as miette diagnostics with a non-zero exit status.
// Requires: assert_cmd, predicates, tempfile crates in [dev-dependencies]

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use assert_cmd::Command;
use bigdecimal::BigDecimal;
use collector_harness::assertions::round_half_even;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

/// A directory holding `people.csv` (20 rows, 2 columns).
fn csv_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut people = String::from("id,name\n");
    for i in 0..20 {
        people.push_str(&format!("{i},person{i}\n"));
    }
    fs::write(dir.path().join("people.csv"), people).unwrap();
    dir
}

fn write_plan(dir: &Path, records: &str) -> PathBuf {
    let path = dir.join("test_harness.config");
    fs::write(
        &path,
        format!("# fixture plan\nCsvCollector\n{}\n{records}", dir.display()),
    )
    .unwrap();
    path
}

fn harness() -> Command {
    let mut cmd = Command::cargo_bin("collector-harness").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("COLLECTOR_HARNESS_POLL_MS");
    cmd
}

/// Metrics record for `people.csv` with sizes rounded to three places.
fn people_metrics(dir: &Path) -> String {
    let text = fs::read_to_string(dir.join("people.csv")).unwrap();
    let header = text.find('\n').unwrap() + 1;
    let kb = |bytes: usize| {
        let value = BigDecimal::from(bytes as u64) / BigDecimal::from(1024u32);
        round_half_even(&value, 3).to_string()
    };
    format!(
        "datacollectionmetrics|people|20|{}|{}\n",
        kb(text.len()),
        kb(text.len() - header)
    )
}

#[test]
fn full_plan_passes_against_csv_collector() {
    let dir = csv_fixture();
    let records = format!(
        "getschema|1|2\ncollectsample|people|name|20|person3|person17\nrandomsample|people|name|5\n{}",
        people_metrics(dir.path())
    );
    let plan = write_plan(dir.path(), &records);

    harness()
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("Testing CsvCollector"))
        .stdout(contains("Data store type supported:"))
        .stdout(contains("Testing collection_metrics() - success."))
        .stdout(contains("All tests passed."));
}

#[test]
fn load_test_runs_in_child_process() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "loadtest|people|name|10|0|60\n");

    harness()
        .args(["--poll-interval-ms", "50"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("#0. Loading 10 samples..."))
        .stdout(contains("Load testing... - success, collected 10 samples."))
        .stdout(contains("All load tests passed."));
}

#[test]
fn legacy_child_flag_runs_single_load_test() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "loadtest|people|name|7|0|0\n");

    harness()
        .args(["-load-test", "0"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("collected 7 samples"))
        .stdout(contains("All tests passed.").not());
}

#[test]
fn malformed_plan_is_a_diagnostic() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "randomsample|people|name|lots\n");

    harness()
        .arg(&plan)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("harness::plan::malformed"))
        .stdout(contains("Testing").not());
}

#[test]
fn unknown_collector_lists_registered_names() {
    let dir = csv_fixture();
    let plan = dir.path().join("plan.config");
    fs::write(&plan, "NoSuchCollector\nanything\n").unwrap();

    harness()
        .arg(&plan)
        .assert()
        .failure()
        .stderr(contains("harness::collector::unavailable").and(contains("CsvCollector")));
}

#[test]
fn conformance_failure_exits_with_one() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "getschema|4|2\ncollectsample|people|name|3\n");

    harness()
        .arg(&plan)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("table count (1)"));
}

#[test]
fn missing_default_plan_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();

    harness()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(contains("test_harness.config"));
}

#[test]
fn list_collectors_prints_registry() {
    harness()
        .arg("--list-collectors")
        .assert()
        .success()
        .stdout("CsvCollector\n");
}

#[test]
fn print_plan_json_shows_parsed_records() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "datacollectionmetrics|people|100|12.340|5.1\n");

    let output = harness()
        .args(["--print-plan", "json"])
        .arg(&plan)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["collector_name"], "CsvCollector");
    let metric = &json["metrics"][0];
    assert_eq!(metric["total_size_precision"], 3);
    assert_eq!(metric["used_size_precision"], 1);
    let total = BigDecimal::from_str(metric["total_size"].as_str().unwrap()).unwrap();
    assert_eq!(total, BigDecimal::from_str("12.34").unwrap());
}

#[test]
fn print_plan_text_is_canonical() {
    let dir = csv_fixture();
    let plan = write_plan(dir.path(), "  RandomSample | people | name | 5\n");

    harness()
        .args(["--print-plan", "text"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("randomsample|people|name|5"));
}
