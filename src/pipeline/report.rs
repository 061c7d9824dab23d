//! Report generation for collection runs
//!
//! Supports multiple output formats including JUnit XML for CI/CD integration.

use indexmap::IndexMap;
use junit_report::{Duration, Report, TestCase, TestSuite};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::errors::ProbestackError;
use crate::models::{RunReport, RunResult};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// JUnit XML format (for CI/CD systems)
    JUnit,
    /// JSON format
    Json,
    /// TAP (Test Anything Protocol) format
    Tap,
}

/// Where and how to write a report
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_path: PathBuf,
    pub format: ReportFormat,
}

impl ReportConfig {
    pub fn new(output_path: impl Into<PathBuf>, format: ReportFormat) -> Self {
        Self {
            output_path: output_path.into(),
            format,
        }
    }
}

/// Render a report and write it to the configured path
pub fn generate_report(report: &RunReport, config: &ReportConfig) -> Result<(), ProbestackError> {
    let content = match config.format {
        ReportFormat::JUnit => render_junit(report)?,
        ReportFormat::Json => render_json(report)?,
        ReportFormat::Tap => render_tap(report),
    };
    write_file(&config.output_path, &content)
}

fn write_file(path: &Path, content: &str) -> Result<(), ProbestackError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// JUnit XML with one test suite per folder path
pub fn render_junit(report: &RunReport) -> Result<String, ProbestackError> {
    let mut by_folder: IndexMap<&str, Vec<&RunResult>> = IndexMap::new();
    for result in &report.results {
        by_folder.entry(result.folder_path.as_str()).or_default().push(result);
    }

    let timestamp = OffsetDateTime::from_unix_timestamp(report.started_at.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    let mut junit = Report::new();
    for (folder, results) in by_folder {
        let mut suite = TestSuite::new(&format!("{} / {}", report.collection_name, folder));
        suite.set_timestamp(timestamp);
        let classname = sanitize_classname(&format!("{}.{}", report.collection_name, folder));
        for result in results {
            let mut tc = build_test_case(result);
            tc.set_classname(&classname);
            suite.add_testcase(tc);
        }
        junit.add_testsuite(suite);
    }

    let mut buffer = Vec::new();
    junit
        .write_xml(&mut buffer)
        .map_err(|e| ProbestackError::Report(format!("Failed to write JUnit XML: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ProbestackError::Report(format!("JUnit XML is not UTF-8: {}", e)))
}

/// Build a JUnit test case from one request's result
fn build_test_case(result: &RunResult) -> TestCase {
    let duration = Duration::milliseconds(result.time as i64);

    if let Some(ref error) = result.error {
        let message = format!("Request failed: {}\nRequest: {} {}", error, result.method, result.url);
        return TestCase::error(&result.request_name, duration, "TransportError", &message);
    }

    let mut failures: Vec<String> = result
        .test_results
        .iter()
        .filter(|t| !t.passed)
        .map(|t| format!("{}: {}", t.name, t.error.as_deref().unwrap_or("failed")))
        .collect();
    if let Some(ref script_error) = result.test_script_error {
        failures.push(format!("test script error: {}", script_error));
    }
    if !result.success {
        failures.insert(0, format!("Unexpected status {} {}", result.status, result.status_text));
    }

    if failures.is_empty() {
        TestCase::success(&result.request_name, duration)
    } else {
        let message = format!(
            "{}\n\nRequest: {} {}\nStatus: {}",
            failures.join("\n"),
            result.method,
            result.url,
            result.status
        );
        TestCase::failure(&result.request_name, duration, "AssertionFailure", &message)
    }
}

/// Sanitize a string for use as a JUnit classname
fn sanitize_classname(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Pretty JSON: a summary block followed by the full report
pub fn render_json(report: &RunReport) -> Result<String, ProbestackError> {
    let value = json!({
        "summary": {
            "collection": report.collection_name,
            "total": report.total_requests,
            "passed": report.passed_requests,
            "failed": report.failed_requests,
            "tests_failed": report.tests_failed(),
            "duration_ms": report.duration_ms(),
        },
        "report": report,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// TAP version 14, one test point per request
pub fn render_tap(report: &RunReport) -> String {
    let mut output = String::new();
    output.push_str("TAP version 14\n");
    output.push_str(&format!("1..{}\n", report.results.len()));

    for (i, result) in report.results.iter().enumerate() {
        let test_num = i + 1;
        let name = format!("{} / {}", result.folder_path, result.request_name);

        if result.fully_passed() {
            output.push_str(&format!("ok {} - {} # time={}ms\n", test_num, name, result.time));
            continue;
        }

        output.push_str(&format!("not ok {} - {}\n", test_num, name));
        output.push_str("  ---\n");
        output.push_str(&format!("  method: {}\n", result.method));
        output.push_str(&format!("  url: {}\n", result.url));
        output.push_str(&format!("  status: {}\n", result.status));
        if let Some(ref error) = result.error {
            output.push_str(&format!("  error: {}\n", error));
        }
        if let Some(ref error) = result.test_script_error {
            output.push_str(&format!("  script_error: {}\n", error));
        }

        let failed: Vec<_> = result.test_results.iter().filter(|t| !t.passed).collect();
        if !failed.is_empty() {
            output.push_str("  failures:\n");
            for t in failed {
                output.push_str(&format!("    - {}: {}\n", t.name, t.error.as_deref().unwrap_or("failed")));
            }
        }
        output.push_str("  ...\n");
    }

    output
}
