//! HTTP client capability
//!
//! The pipeline talks to the network only through [`HttpClient`]. The
//! production adapter is [`ReqwestTransport`]; tests substitute scripted
//! fakes.

pub mod http;

pub use http::{ReqwestTransport, DEFAULT_TIMEOUT, USER_AGENT_STRING};

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::future::Future;
use thiserror::Error;

use crate::http::HttpMethod;

/// Fully prepared request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    /// Parsed JSON payload, `None` when nothing is sent
    pub body: Option<JsonValue>,
}

/// What the transport received
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: IndexMap<String, String>,
    /// JSON when the body parses as JSON, otherwise the raw text
    pub data: JsonValue,
    /// Elapsed milliseconds
    pub time: u64,
}

/// Connection-level failure. HTTP error statuses are not transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Port for sending HTTP requests.
///
/// Implementations must resolve with a response for every HTTP status and
/// fail only when no response was received.
pub trait HttpClient: Send + Sync {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
