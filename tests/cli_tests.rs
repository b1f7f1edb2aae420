//! Integration tests for the vaultcloze CLI
//!
//! These tests run the vaultcloze binary against temporary vaults.

mod common;

use std::fs;

use common::{vaultcloze, Fixture};
use predicates::prelude::*;

// ============================================================================
// Help and usage
// ============================================================================

#[test]
fn test_help_flag() {
    vaultcloze()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: vaultcloze"))
        .stdout(predicate::str::contains("regen"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_no_command_prints_version() {
    vaultcloze()
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultcloze"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    vaultcloze().arg("frobnicate").assert().code(2);
}

#[test]
fn test_missing_collection_is_usage_error() {
    let fx = Fixture::new();
    vaultcloze()
        .arg("--vault")
        .arg(&fx.vault)
        .arg("regen")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--collection"));
}

#[test]
fn test_missing_vault_is_data_error() {
    let fx = Fixture::new();
    vaultcloze()
        .arg("--vault")
        .arg(fx.vault.join("nope"))
        .arg("--collection")
        .arg(&fx.collection)
        .arg("regen")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("vault not found"));
}

#[test]
fn test_json_error_envelope() {
    let fx = Fixture::new();
    let output = vaultcloze()
        .arg("--vault")
        .arg(&fx.vault)
        .args(["--format", "json", "regen"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(json["error"]["code"], 2);
    assert_eq!(json["error"]["type"], "usage");
}

// ============================================================================
// regen
// ============================================================================

#[test]
fn test_regen_writes_artifacts_and_numbers_markers() {
    let fx = Fixture::new();
    fx.write_note("Geo.md", "The capital of France is <c>Paris</c>.\n");

    fx.cmd()
        .arg("regen")
        .assert()
        .success()
        .stdout(predicate::str::contains("Geo.md: 1 clozes"));

    assert_eq!(
        fx.read_note("Geo.md"),
        "The capital of France is <c1>Paris</c1>.\n"
    );

    let questions = fx.artifacts("question.html");
    assert_eq!(questions.len(), 1);
    let question = fs::read_to_string(&questions[0]).unwrap();
    assert!(question.starts_with("<!-- vaultcloze:generated -->"));
    assert!(question.contains(r#"<span class="cloze">[...]</span>"#));
    assert!(questions[0].parent().unwrap().ends_with("1"));

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&fx.artifacts("data.json")[0]).unwrap())
            .unwrap();
    assert_eq!(meta["imported"], false);
    assert_eq!(meta["references"]["Title"], "Geo");
    assert_eq!(meta["references"]["Source"], "Obsidian Vault: vault");
    assert_eq!(fx.artifacts("history.json").len(), 1);
}

#[test]
fn test_regen_json_report_and_rerun() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>one</c> and <c>two</c>\n");
    fx.write_note("Notes/Plain.md", "nothing here\n");

    let first = fx.run_json(&["regen"]);
    assert_eq!(first["counts"]["documents"], 2);
    assert_eq!(first["counts"]["processed"], 1);
    assert_eq!(first["counts"]["no_clozes"], 1);
    assert_eq!(first["counts"]["clozes"], 2);
    assert_eq!(first["interrupted"], false);

    let second = fx.run_json(&["regen"]);
    assert_eq!(second["counts"]["fresh"], 2);
    assert_eq!(second["outcomes"].as_array().unwrap().len(), 0);
}

#[test]
fn test_force_regenerates_tampered_artifact() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>x</c>\n");
    fx.cmd().arg("regen").assert().success();

    let data = fx.artifacts("data.json")[0].clone();
    let mut meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&data).unwrap()).unwrap();
    meta["imported"] = serde_json::Value::Bool(true);
    fs::write(&data, serde_json::to_string(&meta).unwrap()).unwrap();
    let question = fx.artifacts("question.html")[0].clone();
    fs::write(&question, "hand edited").unwrap();

    let report = fx.run_json(&["regen", "--force"]);

    assert_eq!(report["outcomes"][0]["clozes"][0]["state"], "reverted");
    assert_eq!(report["outcomes"][0]["clozes"][0]["folder_id"], 1);
    assert!(fs::read_to_string(&question)
        .unwrap()
        .starts_with("<!-- vaultcloze:generated -->"));
    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&data).unwrap()).unwrap();
    assert_eq!(meta["imported"], false);
}

#[test]
fn test_regen_inlines_block_reference() {
    let fx = Fixture::new();
    fx.write_note("Facts.md", "Some fact here. ^abc123\n");
    fx.write_note("Quiz.md", "![ref](Facts#^abc123)\n\nAnswer: <c>42</c>\n");

    fx.cmd().arg("regen").assert().success();

    let questions: Vec<String> = fx
        .artifacts("question.html")
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    assert_eq!(questions.len(), 1);
    assert!(questions[0].contains("Some fact here."));
    assert!(!questions[0].contains("^abc123"));
}

#[test]
fn test_broken_reference_is_reported_not_fatal() {
    let fx = Fixture::new();
    fx.write_note("A.md", "![x](Missing#^zz) <c>a</c>\n");

    fx.cmd()
        .arg("regen")
        .assert()
        .success()
        .stderr(predicate::str::contains("[not_found]"));
    assert_eq!(fx.artifacts("answer.html").len(), 1);
}

#[test]
fn test_collection_inside_vault_is_not_scanned() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>a</c>\n");
    let nested = fx.vault.join("cards");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("stray.md"), "<c>ignored</c>\n").unwrap();

    let report: serde_json::Value = {
        let output = vaultcloze()
            .arg("--vault")
            .arg(&fx.vault)
            .arg("--collection")
            .arg(&nested)
            .args(["--format", "json", "regen"])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    };

    assert_eq!(report["counts"]["documents"], 1);
    assert_eq!(
        fs::read_to_string(nested.join("stray.md")).unwrap(),
        "<c>ignored</c>\n"
    );
}

// ============================================================================
// status
// ============================================================================

#[test]
fn test_status_lists_stale_without_writing() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>a</c>\n");

    fx.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 documents, 1 stale"))
        .stdout(predicate::str::contains("A.md (never processed)"));

    assert_eq!(fx.read_note("A.md"), "<c>a</c>\n");
    assert!(fs::read_dir(&fx.collection).unwrap().next().is_none());

    fx.cmd().arg("regen").assert().success();
    let status = fx.run_json(&["status"]);
    assert_eq!(status["stale"].as_array().unwrap().len(), 0);
}

#[test]
fn test_status_reports_orphaned_document_folder() {
    let fx = Fixture::new();
    let note = fx.write_note("Gone.md", "<c>a</c>\n");
    fx.cmd().arg("regen").assert().success();
    fs::remove_file(note).unwrap();

    let status = fx.run_json(&["status"]);
    assert_eq!(status["orphaned_documents"].as_array().unwrap().len(), 1);
    assert_eq!(fx.artifacts("answer.html").len(), 1);
}

// ============================================================================
// init and config
// ============================================================================

#[test]
fn test_init_writes_config_and_is_idempotent() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized vaultcloze config"));
    let config = fs::read_to_string(fx.vault.join(".vaultcloze.toml")).unwrap();
    assert!(config.contains("link_prefix"));
    assert!(config.contains("collection_root"));

    fx.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_supplies_collection_root() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>a</c>\n");
    fx.cmd().arg("init").assert().success();

    vaultcloze()
        .arg("--vault")
        .arg(&fx.vault)
        .arg("regen")
        .assert()
        .success();
    assert_eq!(fx.artifacts("question.html").len(), 1);
}

#[test]
fn test_config_source_prefix_is_used() {
    let fx = Fixture::new();
    fx.write_note("A.md", "<c>a</c>\n");
    fs::write(
        fx.vault.join(".vaultcloze.toml"),
        "version = 1\nvault_name = \"Brain\"\nsource_prefix = \"Notes: \"\n",
    )
    .unwrap();

    fx.cmd().arg("regen").assert().success();

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&fx.artifacts("data.json")[0]).unwrap())
            .unwrap();
    assert_eq!(meta["references"]["Source"], "Notes: Brain");
}

#[test]
fn test_invalid_config_is_data_error() {
    let fx = Fixture::new();
    fs::write(fx.vault.join(".vaultcloze.toml"), "version = \"not a number\"\n").unwrap();

    fx.cmd()
        .arg("regen")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid config"));
}
