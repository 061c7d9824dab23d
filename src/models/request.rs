//! Request definition types
//!
//! A `RequestDefinition` is the user-authored description of one HTTP call,
//! including its scripts and authentication.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ProbestackError;
use crate::http::HttpMethod;

// =============================================================================
// KEY/VALUE PAIRS
// =============================================================================

/// An ordered key/value pair as edited by the user (query param or header)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Convert an ordered pair list into a map, dropping entries with an empty key.
///
/// Later duplicates overwrite earlier ones but keep the first position.
pub fn pairs_to_map(pairs: &[KeyValue]) -> IndexMap<String, String> {
    pairs
        .iter()
        .filter(|p| !p.key.is_empty())
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

// =============================================================================
// BODY
// =============================================================================

/// Format hint for the raw body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Json,
    Text,
    None,
}

/// Raw request body with its format hint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub format: BodyFormat,
}

impl RequestBody {
    pub fn json(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            format: BodyFormat::Json,
        }
    }

    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            format: BodyFormat::Text,
        }
    }

    /// Whether there is anything to transmit
    pub fn is_present(&self) -> bool {
        self.format != BodyFormat::None && !self.raw.trim().is_empty()
    }
}

// =============================================================================
// AUTHENTICATION DESCRIPTOR
// =============================================================================

/// Where an API key is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    #[default]
    #[serde(other)]
    Query,
}

/// Authentication descriptor attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    #[default]
    None,
    Bearer {
        #[serde(default)]
        token: String,
    },
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    #[serde(rename = "apikey")]
    ApiKey {
        #[serde(default)]
        key: String,
        #[serde(default)]
        value: String,
        #[serde(default, rename = "addTo")]
        add_to: ApiKeyLocation,
    },
}

impl AuthConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, AuthConfig::None)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::ApiKey { .. } => "apikey",
        }
    }
}

// =============================================================================
// REQUEST DEFINITION
// =============================================================================

/// A single user-defined HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefinition {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// URL template, may contain `{{var}}` tokens
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub body: RequestBody,
    #[serde(default, skip_serializing_if = "AuthConfig::is_none")]
    pub auth: AuthConfig,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pre_request_script: String,
    #[serde(default, alias = "tests", skip_serializing_if = "String::is_empty")]
    pub test_script: String,
}

impl RequestDefinition {
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            method,
            url: url.into(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::default(),
            auth: AuthConfig::None,
            pre_request_script: String::new(),
            test_script: String::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push(KeyValue::new(key, value));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(KeyValue::new(key, value));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_pre_request_script(mut self, script: impl Into<String>) -> Self {
        self.pre_request_script = script.into();
        self
    }

    pub fn with_test_script(mut self, script: impl Into<String>) -> Self {
        self.test_script = script.into();
        self
    }

    /// The body to transmit, if any. GET requests never send one.
    pub fn effective_body(&self) -> Option<&str> {
        if self.method.sends_body() && self.body.is_present() {
            Some(self.body.raw.as_str())
        } else {
            None
        }
    }

    /// Check the required fields
    pub fn validate(&self) -> Result<(), ProbestackError> {
        if self.name.trim().is_empty() {
            return Err(ProbestackError::InvalidRequest {
                name: self.id.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.url.trim().is_empty() {
            return Err(ProbestackError::InvalidRequest {
                name: self.name.clone(),
                reason: "url must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
