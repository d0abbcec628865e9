//! Integration tests for the batch-infer CLI
//!
//! These tests run the actual binary; full runs go against a wiremock server
//! standing in for the inference endpoint.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the binary to test
fn batch_cmd() -> Command {
    let mut cmd = Command::cargo_bin("batch-infer").unwrap();
    cmd.env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1");
    cmd
}

fn write_jsonl(path: &Path, rows: &[Value]) {
    let text: Vec<String> = rows.iter().map(Value::to_string).collect();
    fs::write(path, text.join("\n")).unwrap();
}

async fn completion_server(status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn test_help_lists_underscore_flags() {
    batch_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base_url"))
        .stdout(predicate::str::contains("--max_tokens"))
        .stdout(predicate::str::contains("--max_concurrent"))
        .stdout(predicate::str::contains("--instruction_template"))
        .stdout(predicate::str::contains("--template_preset"))
        .stdout(predicate::str::contains("[default: predictions.json]"));
}

#[test]
fn test_model_and_dataset_are_required() {
    batch_cmd()
        .args(["--dataset", "data.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--model"));
}

#[test]
fn test_unknown_preset_rejected() {
    batch_cmd()
        .args(["--model", "m", "--dataset", "d", "--template_preset", "llama"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gsm8k"));
}

#[test]
fn test_zero_concurrency_is_fatal() {
    batch_cmd()
        .args(["--model", "m", "--dataset", "d", "--max_concurrent", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BATCH-001"))
        .stderr(predicate::str::contains("max_concurrent"));
}

#[test]
fn test_malformed_template_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("predictions.json");

    batch_cmd()
        .args(["--model", "m", "--dataset", "d", "--instruction_template", "Q: {question"])
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BATCH-010"));

    assert!(!output.exists());
}

#[test]
fn test_missing_local_dataset_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("missing.jsonl");
    let output = temp_dir.path().join("predictions.json");

    batch_cmd()
        .args(["--model", "m", "--dataset"])
        .arg(&dataset)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BATCH-020"))
        .stderr(predicate::str::contains("Fix:"));

    assert!(!output.exists());
}

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_full_run_writes_ordered_predictions() {
    let server = completion_server(
        200,
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": "4"}}]}),
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("gsm8k_test.jsonl");
    let output = temp_dir.path().join("predictions.json");
    write_jsonl(&dataset, &[json!({"question": "1+1"}), json!({"question": "2+2"})]);

    batch_cmd()
        .args(["--model", "qwen", "--max_concurrent", "1", "--dataset"])
        .arg(&dataset)
        .arg("--base_url")
        .arg(format!("{}/v1", server.uri()))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto-detected template: gsm8k"))
        .stdout(predicate::str::contains("Generated 2 predictions"));

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([
            {"idx": 0, "prompt": "Solve this math problem step by step:\n\n1+1", "response": "4", "question": "1+1"},
            {"idx": 1, "prompt": "Solve this math problem step by step:\n\n2+2", "response": "4", "question": "2+2"}
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_records_do_not_change_exit_status() {
    let server = completion_server(500, json!({"error": "overloaded"})).await;
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("data.jsonl");
    let output = temp_dir.path().join("predictions.json");
    write_jsonl(&dataset, &[json!({"text": "a"}), json!({"text": "b"}), json!({"text": "c"})]);

    batch_cmd()
        .args(["--model", "qwen", "--dataset"])
        .arg(&dataset)
        .arg("--base_url")
        .arg(format!("{}/v1", server.uri()))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Using default template"))
        .stdout(predicate::str::contains("Generated 3 predictions"));

    let written: Vec<Value> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written.len(), 3);
    for (i, entry) in written.iter().enumerate() {
        assert_eq!(entry["idx"], i);
        assert!(entry["error"].as_str().unwrap().contains("500"));
        assert!(entry.get("response").is_none());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_explicit_template_with_missing_field() {
    let server = completion_server(
        200,
        json!({"choices": [{"message": {"role": "assistant", "content": "done"}}]}),
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("data.jsonl");
    let output = temp_dir.path().join("predictions.json");
    write_jsonl(&dataset, &[json!({"q": "first"}), json!({"other": "second"})]);

    batch_cmd()
        .args(["--model", "qwen", "--instruction_template", "Q: {q}", "--dataset"])
        .arg(&dataset)
        .arg("--base_url")
        .arg(format!("{}/v1", server.uri()))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Template: Q: {q}"));

    let written: Vec<Value> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[0]["response"], "done");
    assert_eq!(written[0]["prompt"], "Q: first");
    assert!(written[1]["error"].as_str().unwrap().contains("'q'"));
}
