//! Collection tree and run report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::request::RequestDefinition;
use super::result::{checks_passed, ExecutionResult, TestResult};
use crate::http::HttpMethod;

// =============================================================================
// COLLECTION TREE
// =============================================================================

/// A folder containing requests and other folders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<CollectionNode>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: CollectionNode) -> Self {
        self.items.push(item);
        self
    }
}

/// A node in a collection tree: either a request leaf or a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CollectionNode {
    Request(RequestDefinition),
    Folder(Folder),
}

impl CollectionNode {
    pub fn name(&self) -> &str {
        match self {
            CollectionNode::Request(r) => &r.name,
            CollectionNode::Folder(f) => &f.name,
        }
    }
}

impl From<RequestDefinition> for CollectionNode {
    fn from(request: RequestDefinition) -> Self {
        CollectionNode::Request(request)
    }
}

impl From<Folder> for CollectionNode {
    fn from(folder: Folder) -> Self {
        CollectionNode::Folder(folder)
    }
}

/// A named, ordered tree of folders and requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub items: Vec<CollectionNode>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<CollectionNode>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Total number of requests in the tree
    pub fn request_count(&self) -> usize {
        fn count(items: &[CollectionNode]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    CollectionNode::Request(_) => 1,
                    CollectionNode::Folder(f) => count(&f.items),
                })
                .sum()
        }
        count(&self.items)
    }
}

// =============================================================================
// RUN REPORT
// =============================================================================

/// Lifecycle of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Per-request entry of a run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub request_id: Uuid,
    pub request_name: String,
    pub method: HttpMethod,
    pub url: String,
    pub folder_path: String,
    pub status: u16,
    pub status_text: String,
    pub time: u64,
    pub size: u64,
    pub data: JsonValue,
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub test_script_error: Option<String>,
}

impl RunResult {
    pub fn new(
        request: &RequestDefinition,
        url: impl Into<String>,
        folder_path: impl Into<String>,
        result: ExecutionResult,
    ) -> Self {
        let success = result.is_success();
        Self {
            request_id: request.id,
            request_name: request.name.clone(),
            method: request.method,
            url: url.into(),
            folder_path: folder_path.into(),
            status: result.status,
            status_text: result.status_text,
            time: result.time,
            size: result.size,
            data: result.data,
            success,
            error: result.error.map(|e| e.message),
            test_results: result.test_results,
            test_script_error: result.test_script_error,
        }
    }

    /// Request succeeded, every test passed and the test script ran cleanly
    pub fn fully_passed(&self) -> bool {
        checks_passed(self.success, self.test_script_error.as_deref(), &self.test_results)
    }
}

/// Aggregate outcome of a collection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub collection_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub total_requests: usize,
    pub passed_requests: usize,
    pub failed_requests: usize,
    pub results: Vec<RunResult>,
}

impl RunReport {
    /// Create a report for a run that is starting now
    pub fn start(collection_name: impl Into<String>, total_requests: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            total_requests,
            passed_requests: 0,
            failed_requests: 0,
            results: Vec::with_capacity(total_requests),
        }
    }

    /// Record one finished request
    pub fn record(&mut self, result: RunResult) {
        if result.success {
            self.passed_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        self.results.push(result);
    }

    /// Mark the run as completed
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.status = RunStatus::Completed;
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
            .unwrap_or(0)
    }

    pub fn tests_failed(&self) -> usize {
        self.results
            .iter()
            .flat_map(|r| r.test_results.iter())
            .filter(|t| !t.passed)
            .count()
    }

    /// Every request succeeded and every test passed
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(RunResult::fully_passed)
    }
}
