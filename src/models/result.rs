//! Execution result types
//!
//! These shapes are the stable contract consumed by history, insights and
//! report collaborators; field names serialize in camelCase.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::http::HttpMethod;

/// Outcome of one `pm.test(name, fn)` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
}

impl TestResult {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// Catastrophic failure of an execution (transport level)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub message: String,
    pub description: String,
}

/// Normalized outcome of sending one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// HTTP status code, 0 on transport failure
    pub status: u16,
    pub status_text: String,
    pub headers: IndexMap<String, String>,
    pub data: JsonValue,
    /// Elapsed time in milliseconds
    pub time: u64,
    /// Estimated payload size in bytes
    pub size: u64,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub test_script_error: Option<String>,
    #[serde(default)]
    pub error: Option<ExecutionError>,
}

/// Description attached to every transport failure
pub const TRANSPORT_FAILURE_DESCRIPTION: &str = "Could not connect to the server.";

impl ExecutionResult {
    /// Build the base result from a received response
    pub fn from_response(
        status: u16,
        status_text: impl Into<String>,
        headers: IndexMap<String, String>,
        data: JsonValue,
        time: u64,
    ) -> Self {
        let size = payload_size(&data, &headers);
        Self {
            status,
            status_text: status_text.into(),
            headers,
            data,
            time,
            size,
            test_results: Vec::new(),
            test_script_error: None,
            error: None,
        }
    }

    /// Build the result for a connection-level failure
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: "Error".to_string(),
            headers: IndexMap::new(),
            data: JsonValue::Null,
            time: 0,
            size: 0,
            test_results: Vec::new(),
            test_script_error: None,
            error: Some(ExecutionError {
                message: message.into(),
                description: TRANSPORT_FAILURE_DESCRIPTION.to_string(),
            }),
        }
    }

    /// Status in [200, 300)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn tests_passed(&self) -> usize {
        self.test_results.iter().filter(|t| t.passed).count()
    }

    pub fn tests_failed(&self) -> usize {
        self.test_results.len() - self.tests_passed()
    }

    /// 2xx response, every test passed and the test script ran cleanly
    pub fn fully_passed(&self) -> bool {
        checks_passed(self.is_success(), self.test_script_error.as_deref(), &self.test_results)
    }
}

pub(crate) fn checks_passed(success: bool, script_error: Option<&str>, tests: &[TestResult]) -> bool {
    success && script_error.is_none() && tests.iter().all(|t| t.passed)
}

/// Serialized body length plus serialized headers length
pub fn payload_size(data: &JsonValue, headers: &IndexMap<String, String>) -> u64 {
    let body_len = serde_json::to_string(data).map(|s| s.len()).unwrap_or(0);
    let headers_len = serde_json::to_string(headers).map(|s| s.len()).unwrap_or(0);
    (body_len + headers_len) as u64
}

/// One row of the request history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub method: HttpMethod,
    pub status: u16,
    pub size: u64,
    pub time: u64,
    pub error: bool,
    pub date: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_result(url: impl Into<String>, method: HttpMethod, result: &ExecutionResult) -> Self {
        Self {
            url: url.into(),
            method,
            status: result.status,
            size: result.size,
            time: result.time,
            error: result.error.is_some(),
            date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_size_is_deterministic() {
        let mut headers = IndexMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let data = json!({"id": 42});

        let result = ExecutionResult::from_response(200, "OK", headers.clone(), data.clone(), 12);
        let expected = r#"{"id":42}"#.len() + r#"{"content-type":"application/json"}"#.len();
        assert_eq!(result.size, expected as u64);
        assert_eq!(payload_size(&data, &headers), result.size);
    }

    #[test]
    fn test_transport_failure_shape() {
        let result = ExecutionResult::transport_failure("connection refused");
        assert_eq!(result.status, 0);
        assert_eq!(result.status_text, "Error");
        assert_eq!(result.time, 0);
        assert_eq!(result.size, 0);
        let error = result.error.unwrap();
        assert_eq!(error.message, "connection refused");
        assert_eq!(error.description, TRANSPORT_FAILURE_DESCRIPTION);
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = ExecutionResult::from_response(404, "Not Found", IndexMap::new(), json!("nope"), 3);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["statusText"], "Not Found");
        assert!(value.get("testResults").is_some());
        assert!(!result.is_success());
    }

    #[test]
    fn test_fully_passed_requires_clean_tests() {
        let mut result = ExecutionResult::from_response(200, "OK", IndexMap::new(), json!({}), 1);
        assert!(result.fully_passed());

        result.test_results.push(TestResult::failed("is 201", "wrong status"));
        assert!(!result.fully_passed());

        result.test_results.clear();
        result.test_script_error = Some("ReferenceError".to_string());
        assert!(!result.fully_passed());

        assert!(!ExecutionResult::from_response(500, "Internal Server Error", IndexMap::new(), json!({}), 1)
            .fully_passed());
        assert!(!ExecutionResult::transport_failure("down").fully_passed());
    }

    #[test]
    fn test_history_entry_from_failure() {
        let result = ExecutionResult::transport_failure("down");
        let entry = HistoryEntry::from_result("http://x", HttpMethod::Get, &result);
        assert!(entry.error);
        assert_eq!(entry.status, 0);
    }
}
