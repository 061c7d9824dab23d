//! Human and machine readable renderings of results

use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

use super::terminal::Style;
use crate::http::HttpMethod;
use crate::models::{ExecutionResult, RunReport, RunResult, TestResult};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────────";

/// Render one execution result for the `send` command
pub fn format_execution_result(
    name: &str,
    method: HttpMethod,
    url: &str,
    result: &ExecutionResult,
    style: &Style,
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {} {}\n",
        style.http_method(method.as_str()),
        style.label(name),
        style.muted(url)
    ));

    if let Some(ref error) = result.error {
        output.push_str(&format!("{} {}\n", style.error("Error:"), error.message));
        output.push_str(&format!("{}\n", style.muted(&error.description)));
        return output;
    }

    output.push_str(&format!(
        "{} {}\n",
        style.http_status(result.status, &format!("{} {}", result.status, result.status_text)),
        style.muted(&format!("({} ms, {})", result.time, format_size(result.size)))
    ));

    for (name, value) in &result.headers {
        output.push_str(&format!("{}: {}\n", style.label(name), value));
    }

    output.push('\n');
    output.push_str(&format_body(&result.data));
    output.push('\n');

    if !result.test_results.is_empty() || result.test_script_error.is_some() {
        output.push('\n');
        output.push_str(&format_tests(&result.test_results, result.test_script_error.as_deref(), "", style));
    }

    output
}

fn format_body(data: &JsonValue) -> String {
    match data {
        JsonValue::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

fn format_tests(tests: &[TestResult], script_error: Option<&str>, indent: &str, style: &Style) -> String {
    let mut output = String::new();
    for test in tests {
        if test.passed {
            output.push_str(&format!("{}{} {}\n", indent, style.success("✓"), test.name));
        } else {
            output.push_str(&format!(
                "{}{} {}: {}\n",
                indent,
                style.error("✗"),
                test.name,
                test.error.as_deref().unwrap_or("failed")
            ));
        }
    }
    if let Some(error) = script_error {
        output.push_str(&format!("{}{} {}\n", indent, style.warning("Script error:"), error));
    }
    output
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Render a run report grouped by folder path
pub fn format_run_report(report: &RunReport, style: &Style) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", HEAVY_RULE));
    output.push_str(&format!("  RUN RESULTS: {}\n", style.label(&report.collection_name)));
    output.push_str(&format!("{}\n", HEAVY_RULE));

    let mut by_folder: IndexMap<&str, Vec<&RunResult>> = IndexMap::new();
    for result in &report.results {
        by_folder.entry(result.folder_path.as_str()).or_default().push(result);
    }

    for (folder, results) in by_folder {
        output.push_str(&format!("\n  {}\n", style.label(folder)));
        for result in results {
            let icon = if result.fully_passed() {
                style.success("✓")
            } else {
                style.error("✗")
            };
            output.push_str(&format!(
                "    {} {} {} → {} {}\n",
                icon,
                style.http_method(result.method.as_str()),
                result.request_name,
                style.http_status(result.status, &format!("{} {}", result.status, result.status_text)),
                style.muted(&format!("({} ms, {})", result.time, format_size(result.size)))
            ));
            output.push_str(&format!("        {}\n", style.muted(&result.url)));
            if let Some(ref error) = result.error {
                output.push_str(&format!("        {} {}\n", style.error("Error:"), error));
            }
            output.push_str(&format_tests(
                &result.test_results,
                result.test_script_error.as_deref(),
                "        ",
                style,
            ));
        }
    }

    output.push_str(&format!("\n{}\n", LIGHT_RULE));
    output.push_str(&format!(
        "  Requests: {} | Passed: {} | Failed: {} | Tests failed: {} | Duration: {} ms\n",
        report.total_requests,
        style.success(&report.passed_requests.to_string()),
        if report.failed_requests > 0 {
            style.error(&report.failed_requests.to_string())
        } else {
            report.failed_requests.to_string()
        },
        report.tests_failed(),
        report.duration_ms()
    ));
    output.push_str(&format!("{}\n", HEAVY_RULE));

    output
}

/// Render a run report as JSON lines (one line per request plus a summary)
/// Suitable for CI/CD pipelines and log aggregation
pub fn format_run_report_json(report: &RunReport) -> String {
    let mut output = String::new();

    for result in &report.results {
        let line = json!({
            "level": if result.fully_passed() { "info" } else { "error" },
            "event": "request_result",
            "request_name": result.request_name,
            "folder_path": result.folder_path,
            "method": result.method,
            "url": result.url,
            "status": result.status,
            "duration_ms": result.time,
            "size": result.size,
            "success": result.success,
            "error": result.error,
            "tests_passed": result.test_results.iter().filter(|t| t.passed).count(),
            "tests_failed": result.test_results.iter().filter(|t| !t.passed).count(),
            "test_script_error": result.test_script_error,
        });
        output.push_str(&line.to_string());
        output.push('\n');
    }

    let summary = json!({
        "level": "info",
        "event": "run_summary",
        "collection": report.collection_name,
        "started_at": report.started_at.to_rfc3339(),
        "finished_at": report.finished_at.map(|t| t.to_rfc3339()),
        "status": report.status,
        "total": report.total_requests,
        "passed": report.passed_requests,
        "failed": report.failed_requests,
        "success": report.all_passed(),
    });
    output.push_str(&summary.to_string());
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestDefinition;

    fn report() -> RunReport {
        let ping = RequestDefinition::new("Ping", HttpMethod::Get, "http://x/ping");
        let login = RequestDefinition::new("Login", HttpMethod::Post, "http://x/login");
        let mut report = RunReport::start("API", 2);

        let mut ok = ExecutionResult::from_response(200, "OK", IndexMap::new(), json!({"ok": true}), 12);
        ok.test_results.push(TestResult::passed("is ok"));
        report.record(RunResult::new(&ping, "http://x/ping", "Root", ok));
        report.record(RunResult::new(
            &login,
            "http://x/login",
            "Auth",
            ExecutionResult::transport_failure("connection refused"),
        ));
        report.finish();
        report
    }

    #[test]
    fn test_run_report_grouped_by_folder() {
        let output = format_run_report(&report(), &Style::plain());
        let root = output.find("  Root\n").unwrap();
        let auth = output.find("  Auth\n").unwrap();
        assert!(root < auth);
        assert!(output.contains("✓ GET Ping → 200 OK"));
        assert!(output.contains("✗ POST Login → 0 Error"));
        assert!(output.contains("Error: connection refused"));
        assert!(output.contains("Requests: 2 | Passed: 1 | Failed: 1"));
    }

    #[test]
    fn test_run_report_json_lines() {
        let output = format_run_report_json(&report());
        let lines: Vec<JsonValue> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "request_result");
        assert_eq!(lines[1]["error"], "connection refused");
        assert_eq!(lines[2]["event"], "run_summary");
        assert_eq!(lines[2]["success"], false);
    }

    #[test]
    fn test_execution_result_rendering() {
        let mut result = ExecutionResult::from_response(201, "Created", IndexMap::new(), json!({"id": 1}), 5);
        result.test_results.push(TestResult::failed("has name", "missing name"));
        let output = format_execution_result("Create", HttpMethod::Post, "http://x", &result, &Style::plain());
        assert!(output.starts_with("POST Create http://x\n201 Created"));
        assert!(output.contains("\"id\": 1"));
        assert!(output.contains("✗ has name: missing name"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
    }
}
