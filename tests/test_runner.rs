//! Collection runner against a live mock server
mod common;

use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::get;
use probestack::client::ReqwestTransport;
use probestack::http::HttpMethod;
use probestack::models::{AuthConfig, Collection, Folder, RequestDefinition, RunStatus};
use probestack::pipeline::{CollectionRunner, RequestExecutor};
use probestack::variables::{JsonFilePersistence, Scope, VariableStore};

fn runner() -> CollectionRunner<ReqwestTransport> {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
    CollectionRunner::new(RequestExecutor::new(transport))
}

// ============================================================================
// Ordering and Variable Chaining
// ============================================================================

#[tokio::test]
async fn test_token_chained_between_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-123"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": "ada"})))
        .mount(&server)
        .await;

    let login = RequestDefinition::new("Login", HttpMethod::Post, "{{base}}/login").with_test_script(
        r#"pm.environment.set("token", pm.response.json().token);"#,
    );
    let me = get("Me", "{{base}}/me").with_auth(AuthConfig::Bearer {
        token: "{{token}}".to_string(),
    });
    let collection = Collection::new("Session")
        .with_item(Folder::new("Auth").with_item(login.into()).with_item(me.into()));

    let mut vars = VariableStore::with_environment("dev");
    vars.set(Scope::Environment, "base", server.uri());

    let report = runner().run_collection(&collection, &mut vars).await;

    assert_eq!(report.total_requests, 2);
    assert_eq!(report.results[0].request_name, "Login");
    assert_eq!(report.results[1].request_name, "Me");
    assert_eq!(report.results[1].status, 200);
    assert_eq!(report.results[1].data["user"], "ada");
    assert!(report.all_passed());
    assert_eq!(vars.get(Scope::Environment, "token"), Some("t-123"));
}

#[tokio::test]
async fn test_script_variable_used_in_next_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let create = RequestDefinition::new("Create", HttpMethod::Post, "{{base}}/users")
        .with_test_script(r#"pm.environment.set("userId", pm.response.json().id);"#);
    let fetch = get("Fetch", "{{base}}/users/{{userId}}");
    let collection = Collection::new("Users").with_item(create).with_item(fetch);

    let mut vars = VariableStore::with_environment("dev");
    vars.set(Scope::Environment, "base", server.uri());

    let report = runner().run_collection(&collection, &mut vars).await;

    assert_eq!(report.results[0].status, 201);
    let fetched = &report.results[1];
    assert_eq!(fetched.url, format!("{}/users/42", server.uri()));
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.data["name"], "ada");
    assert!(report.all_passed());
}

#[tokio::test]
async fn test_folder_continues_after_first_request_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": "ada"})))
        .mount(&server)
        .await;

    let collection = Collection::new("Session").with_item(
        Folder::new("Auth")
            .with_item(get("Login", "http://127.0.0.1:9/login").into())
            .with_item(get("Profile", format!("{}/profile", server.uri())).into()),
    );

    let mut vars = VariableStore::new();
    let report = runner().run_collection(&collection, &mut vars).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.total_requests, 2);
    assert_eq!(report.failed_requests, 1);
    assert_eq!(report.passed_requests, 1);

    let names: Vec<&str> = report.results.iter().map(|r| r.request_name.as_str()).collect();
    assert_eq!(names, vec!["Login", "Profile"]);
    assert!(report.results.iter().all(|r| r.folder_path == "Auth"));

    let login = &report.results[0];
    assert_eq!(login.status, 0);
    assert!(!login.success);
    assert!(login.error.is_some());

    let profile = &report.results[1];
    assert_eq!(profile.status, 200);
    assert!(profile.success);
}

#[tokio::test]
async fn test_transport_failure_does_not_stop_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let collection = Collection::new("Mixed")
        .with_item(get("Ping", format!("{}/ping", server.uri())))
        .with_item(Folder::new("Auth").with_item(get("Login", "http://127.0.0.1:9/login").into()));

    let mut vars = VariableStore::new();
    let report = runner().run_collection(&collection, &mut vars).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.passed_requests, 1);
    assert_eq!(report.failed_requests, 1);

    let ping = &report.results[0];
    assert_eq!(ping.folder_path, "Root");
    assert!(ping.success);

    let login = &report.results[1];
    assert_eq!(login.folder_path, "Auth");
    assert_eq!(login.status, 0);
    assert!(!login.success);
    assert!(login.error.is_some());
    assert!(!report.all_passed());
}

#[tokio::test]
async fn test_result_url_is_resolved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let collection = Collection::new("Urls").with_item(get("Health", "{{base}}/health"));
    let mut vars = VariableStore::new();
    vars.set(Scope::Global, "base", server.uri());

    let report = runner().run_collection(&collection, &mut vars).await;

    assert_eq!(report.results[0].url, format!("{}/health", server.uri()));
    assert_eq!(report.results[0].status, 204);
}

// ============================================================================
// Progress
// ============================================================================

#[tokio::test]
async fn test_progress_reports_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let runner = runner();
    let progress = runner.subscribe();
    let collection = Collection::new("Progress")
        .with_item(get("One", format!("{}/1", server.uri())))
        .with_item(get("Two", format!("{}/2", server.uri())));

    let mut vars = VariableStore::new();
    runner.run_collection(&collection, &mut vars).await;

    let snapshot = progress.borrow().clone();
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.failed, 2);
    assert_eq!(snapshot.completed(), 2);
    assert_eq!(snapshot.current_request, None);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_script_mutations_persist_across_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/counter"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let persistence = JsonFilePersistence::new(dir.path());
    let collection = Collection::new("Counter").with_item(
        get("Count", format!("{}/counter", server.uri())).with_test_script(
            r#"
            var n = parseInt(pm.variables.get("runs") || "0", 10);
            pm.variables.set("runs", String(n + 1));
            "#,
        ),
    );

    for _ in 0..2 {
        let mut vars = VariableStore::new();
        vars.load_from(&persistence).unwrap();
        runner().run_collection(&collection, &mut vars).await;
        vars.save_to(&persistence).unwrap();
    }

    let mut vars = VariableStore::new();
    vars.load_from(&persistence).unwrap();
    assert_eq!(vars.get(Scope::Global, "runs"), Some("2"));
}
