//! Binary tests: argument handling, exit codes, reports and variable files
mod common;

use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{probestack, Workspace, EXIT_TESTS_FAILED};

const PING_COLLECTION: &str = r#"{
  "name": "Smoke",
  "items": [
    {
      "type": "request",
      "name": "Ping",
      "method": "GET",
      "url": "{{base}}/ping",
      "testScript": "pm.test('is 200', function () { pm.response.to.have.status(200); }); pm.variables.set('pinged', 'yes');"
    }
  ]
}"#;

const FAILING_COLLECTION: &str = r#"
name: Broken
items:
  - type: folder
    name: Checks
    items:
      - type: request
        name: Ping
        url: "{{base}}/ping"
        testScript: |
          pm.test("is 201", function () { pm.response.to.have.status(201); });
"#;

async fn ping_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Argument Handling
// ============================================================================

#[test]
fn test_help_lists_commands() {
    probestack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("send")));
}

#[test]
fn test_missing_subcommand_fails() {
    probestack().assert().code(1);
}

#[test]
fn test_missing_collection_file_fails() {
    let ws = Workspace::new();
    let missing = ws.path().join("nope.json");
    ws.command("run", &missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_collection_fails() {
    let ws = Workspace::new();
    let file = ws.write("empty.json", r#"{"name": "Empty", "items": []}"#);
    ws.command("run", &file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("contains no requests"));
}

// ============================================================================
// Run Command
// ============================================================================

#[tokio::test]
async fn test_run_passing_collection() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write("smoke.json", PING_COLLECTION);

    ws.command("run", &file)
        .arg("--var")
        .arg(format!("base={}", server.uri()))
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ GET Ping → 200 OK"))
        .stdout(predicate::str::contains("Requests: 1 | Passed: 1 | Failed: 0"));
}

#[tokio::test]
async fn test_run_failing_test_exit_code() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write("broken.yaml", FAILING_COLLECTION);

    ws.command("run", &file)
        .arg("--var")
        .arg(format!("base={}", server.uri()))
        .assert()
        .code(EXIT_TESTS_FAILED)
        .stdout(predicate::str::contains("Checks"))
        .stdout(predicate::str::contains(
            "expected response to have status code 201 but got 200",
        ));
}

#[tokio::test]
async fn test_run_json_output() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write("smoke.json", PING_COLLECTION);

    let output = ws
        .command("run", &file)
        .arg("--json")
        .arg("--var")
        .arg(format!("base={}", server.uri()))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "request_result");
    assert_eq!(lines[0]["status"], 200);
    assert_eq!(lines[0]["folder_path"], "Root");
    assert_eq!(lines[1]["event"], "run_summary");
    assert_eq!(lines[1]["success"], true);
}

#[tokio::test]
async fn test_run_writes_reports() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write("smoke.json", PING_COLLECTION);
    let junit = ws.path().join("reports/junit.xml");
    let tap = ws.path().join("reports/run.tap");

    ws.command("run", &file)
        .arg("--var")
        .arg(format!("base={}", server.uri()))
        .arg("--report-junit")
        .arg(&junit)
        .arg("--report-tap")
        .arg(&tap)
        .assert()
        .success();

    let xml = std::fs::read_to_string(&junit).unwrap();
    assert!(xml.contains("<testsuites"));
    assert!(xml.contains("Ping"));
    let tap = std::fs::read_to_string(&tap).unwrap();
    assert!(tap.contains("ok 1 - Root / Ping"));
}

#[tokio::test]
async fn test_run_saves_variables() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write("smoke.json", PING_COLLECTION);

    ws.command("run", &file)
        .arg("--var")
        .arg(format!("base={}", server.uri()))
        .arg("--save-variables")
        .assert()
        .success();

    let saved = std::fs::read_to_string(ws.vars_dir().join("globals.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["pinged"], "yes");
    assert_eq!(saved["base"], server.uri());
}

#[tokio::test]
async fn test_run_uses_persisted_environment() {
    let server = ping_server().await;
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.vars_dir()).unwrap();
    ws.write(
        "variables/environment.local.json",
        &json!({"base": server.uri()}).to_string(),
    );
    let file = ws.write("smoke.json", PING_COLLECTION);

    ws.command("run", &file)
        .arg("--environment")
        .arg("local")
        .assert()
        .success();

    // Without --save-variables the script's mutation is not written back
    assert!(!ws.vars_dir().join("globals.json").exists());
}

// ============================================================================
// Send Command
// ============================================================================

#[tokio::test]
async fn test_send_single_request_json() {
    let server = ping_server().await;
    let ws = Workspace::new();
    let file = ws.write(
        "ping.toml",
        &format!("name = \"Ping\"\nmethod = \"GET\"\nurl = \"{}/ping\"\n", server.uri()),
    );

    let output = ws.command("send", &file).arg("--json").output().unwrap();

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], 200);
    assert_eq!(result["data"]["pong"], true);
}

#[tokio::test]
async fn test_send_not_found_exit_code() {
    let server = MockServer::start().await;
    let ws = Workspace::new();
    let file = ws.write(
        "missing.json",
        &json!({"name": "Missing", "url": format!("{}/missing", server.uri())}).to_string(),
    );

    ws.command("send", &file)
        .assert()
        .code(EXIT_TESTS_FAILED)
        .stdout(predicate::str::contains("404 Not Found"));
}

#[test]
fn test_send_appends_history_on_transport_failure() {
    let ws = Workspace::new();
    let file = ws.write(
        "down.json",
        &json!({"name": "Down", "url": "http://127.0.0.1:9/health"}).to_string(),
    );
    let history = ws.path().join("history.jsonl");

    for _ in 0..2 {
        ws.command("send", &file)
            .arg("--history")
            .arg(&history)
            .assert()
            .code(EXIT_TESTS_FAILED);
    }

    let content = std::fs::read_to_string(&history).unwrap();
    let entries: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["url"], "http://127.0.0.1:9/health");
    assert_eq!(entries[0]["method"], "GET");
    assert_eq!(entries[0]["status"], 0);
    assert_eq!(entries[0]["error"], true);
}
