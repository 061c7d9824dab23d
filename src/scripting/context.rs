//! Script execution context
//!
//! The seed handed to the sandbox before each script run, and the outcome
//! collected from it afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::http::HttpMethod;
use crate::models::{ExecutionResult, TestResult};

/// Received response, visible to test scripts only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub status: u16,
    pub status_text: String,
    pub headers: IndexMap<String, String>,
    pub data: JsonValue,
}

impl ResponseView {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            status: result.status,
            status_text: result.status_text.clone(),
            headers: result.headers.clone(),
            data: result.data.clone(),
        }
    }

    /// Body parsed as JSON when it is a string, `{}` when that fails
    pub fn json(&self) -> JsonValue {
        match &self.data {
            JsonValue::String(s) => serde_json::from_str(s)
                .unwrap_or_else(|_| JsonValue::Object(serde_json::Map::new())),
            other => other.clone(),
        }
    }

    /// Body as text, stringifying structured values
    pub fn text(&self) -> String {
        match &self.data {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Ephemeral per-run seed for the sandbox
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptContext {
    pub url: String,
    pub method: HttpMethod,
    pub headers: IndexMap<String, String>,
    pub params: IndexMap<String, String>,
    pub body: Option<String>,
    pub response: Option<ResponseView>,
    /// Stored environment-scope values readable through `pm.environment.get`
    pub environment: IndexMap<String, String>,
    /// Stored values readable through `pm.variables.get`
    pub variables: IndexMap<String, String>,
}

impl ScriptContext {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: IndexMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    pub fn with_response(mut self, response: ResponseView) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_environment(mut self, environment: IndexMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_variables(mut self, variables: IndexMap<String, String>) -> Self {
        self.variables = variables;
        self
    }
}

/// Everything a script run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub test_results: Vec<TestResult>,
    /// Values set through `pm.environment.set`
    pub environment: IndexMap<String, String>,
    /// Values set through `pm.variables.set`
    pub variables: IndexMap<String, String>,
    pub unset_environment: Vec<String>,
    pub unset_variables: Vec<String>,
}

impl ScriptOutcome {
    /// Outcome of an empty script
    pub fn empty() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn has_mutations(&self) -> bool {
        !(self.environment.is_empty()
            && self.variables.is_empty()
            && self.unset_environment.is_empty()
            && self.unset_variables.is_empty())
    }
}
