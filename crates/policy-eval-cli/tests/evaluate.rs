use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::PathBuf};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../policy-eval-core/tests/fixtures")
}

fn fixture_arg(relative: &str) -> String {
    fixture_dir().join(relative).to_str().unwrap().to_string()
}

#[test]
fn evaluates_fixture_corpus_and_writes_report() {
    let temp = tempfile::tempdir().unwrap();
    let report_path = temp.path().join("reports/evaluation_report.json");

    let mut cmd = Command::cargo_bin("policy-eval").unwrap();
    cmd.args([
        "evaluate",
        "--references-dir",
        &fixture_arg("reference_policies"),
        "--policies-dir",
        &fixture_arg("policies"),
        "--output",
        report_path.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("LLM MODEL COMPARISON"))
    .stdout(predicate::str::contains("LLAMA3"))
    .stdout(predicate::str::contains("Best model: DEEPSEEK"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["deepseek"]["num_policies"], 3);
    assert_eq!(
        report["detailed_results"]["deepseek"]["nist_csf/PROTECT"]["bleu"],
        serde_json::json!(0.7714)
    );
    assert!(report["timestamp"].is_string());
}

#[test]
fn model_filter_limits_comparison() {
    let temp = tempfile::tempdir().unwrap();
    let report_path = temp.path().join("report.json");

    let mut cmd = Command::cargo_bin("policy-eval").unwrap();
    cmd.args([
        "evaluate",
        "--references-dir",
        &fixture_arg("reference_policies"),
        "--policies-dir",
        &fixture_arg("policies"),
        "--output",
        report_path.to_str().unwrap(),
        "--model",
        "LLaMA3",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Best model: LLAMA3"))
    .stdout(predicate::str::contains("DEEPSEEK").not());
}

#[test]
fn model_list_from_environment() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("policy-eval").unwrap();
    cmd.env("POLICY_EVAL_MODELS", "llama3,mistral")
        .args([
            "evaluate",
            "--references-dir",
            &fixture_arg("reference_policies"),
            "--policies-dir",
            &fixture_arg("policies"),
            "--output",
            temp.path().join("report.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Best model: LLAMA3"))
        .stdout(predicate::str::contains("DEEPSEEK").not());
}

#[test]
fn fails_without_references() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("policy-eval").unwrap();
    cmd.args([
        "evaluate",
        "--references-dir",
        temp.path().to_str().unwrap(),
        "--policies-dir",
        &fixture_arg("policies"),
        "--output",
        temp.path().join("report.json").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no reference policies found"));
}

#[test]
fn lists_reference_counts_as_json() {
    let mut cmd = Command::cargo_bin("policy-eval").unwrap();
    cmd.args([
        "list-references",
        "--references-dir",
        &fixture_arg("reference_policies"),
        "--json",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"nist_csf\": 2"))
    .stdout(predicate::str::contains("\"iso27001\": 1"));
}
