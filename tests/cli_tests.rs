//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("chunked-explain"));
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp).arg("--version").assert().success().stdout(predicate::str::contains("chunked-explain"));
}

#[test]
fn test_cli_help() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("large texts"))
        .stdout(predicate::str::contains("explain"))
        .stdout(predicate::str::contains("estimate"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_estimate_small_file_is_single_request() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("main.py"), "def main():\n    print('hello')\n").unwrap();

    cli(&tmp)
        .args(["estimate", "main.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Input: main.py"))
        .stdout(predicate::str::contains("Plan: single request"))
        .stdout(predicate::str::contains("Completion calls: 1"));
}

#[test]
fn test_estimate_reads_stdin() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .arg("estimate")
        .write_stdin("abcd")
        .assert()
        .success()
        .stdout(predicate::str::contains("Input: <stdin>"))
        .stdout(predicate::str::contains("Estimated tokens: 2"));
}

#[test]
fn test_estimate_chunks_with_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("input.txt"), "alpha beta gamma delta\n".repeat(18)).unwrap();
    fs::write(tmp.path().join("tight.toml"), "chunk_prompt = 'squash: '\n").unwrap();

    cli(&tmp)
        .args(["estimate", "-c", "tight.toml", "--per-request-cap", "50", "input.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 chunks"))
        .stdout(predicate::str::contains("lines 1-7"))
        .stdout(predicate::str::contains("lines 15-18"))
        .stdout(predicate::str::contains("Completion calls: 4"));
}

#[test]
fn test_estimate_reports_comment_stripping() {
    let tmp = TempDir::new().unwrap();
    let text = format!("{}x = 1\n", "# a long explanatory comment about nothing much\n".repeat(10));
    fs::write(tmp.path().join("script.sh"), text).unwrap();

    cli(&tmp)
        .args(["estimate", "--per-request-cap", "20", "script.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("After comment stripping: 4"))
        .stdout(predicate::str::contains("Plan: single request"));
}

#[test]
fn test_zero_cap_is_rejected() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .args(["estimate", "--per-request-cap", "0"])
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("per_request_cap must be greater than zero"));
}

#[test]
fn test_env_override_applies() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .arg("estimate")
        .env("CHUNKED_EXPLAIN_PER_MINUTE_BUDGET", "40000")
        .write_stdin("text")
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget: 40,000 tokens per 60s"));
}

#[test]
fn test_explain_without_api_key_fails() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .arg("explain")
        .write_stdin("explain me")
        .assert()
        .failure()
        .stderr(predicate::str::contains("An API key is required"));
}

#[test]
fn test_explain_rejects_empty_input() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("empty.txt"), "\n\n").unwrap();
    cli(&tmp)
        .args(["explain", "--api-key", "sk-test", "empty.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to explain"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    cli(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chunked-explain"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_explain_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Mocked explanation"}}],
            "usage": {"total_tokens": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("main.rs"), "fn main() {}\n").unwrap();
    let base_url = format!("{}/v1", server.uri());

    cli(&tmp)
        .args(["explain", "--quiet", "--api-key", "sk-test", "--base-url", &base_url, "main.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mocked explanation"));
}
