//! HTTP transport backed by reqwest

use indexmap::IndexMap;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use super::{HttpClient, TransportError, TransportRequest, TransportResponse};
use crate::errors::ProbestackError;

pub const USER_AGENT_STRING: &str = concat!("ProbeStack/", env!("CARGO_PKG_VERSION"));

/// Default transport timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-based [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, ProbestackError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_STRING)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = build_url(&request.url, &request.params)?;

        let mut builder = self.client.request(request.method.into(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        let headers = flatten_headers(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let time = start.elapsed().as_millis() as u64;

        debug!(status = status.as_u16(), elapsed_ms = time, "response received");

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: parse_body(text),
            time,
        })
    }
}

/// Append params to the URL's existing query string
fn build_url(raw: &str, params: &IndexMap<String, String>) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw).map_err(|e| TransportError::new(format!("Invalid URL '{}': {}", raw, e)))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Lower-cased header names; repeated headers joined with `, `
fn flatten_headers(headers: &HeaderMap) -> IndexMap<String, String> {
    let mut flat: IndexMap<String, String> = IndexMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

fn parse_body(text: String) -> JsonValue {
    if text.is_empty() {
        return JsonValue::String(text);
    }
    serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_build_url_appends_params() {
        let mut params = IndexMap::new();
        params.insert("page".to_string(), "2".to_string());
        params.insert("q".to_string(), "a b".to_string());
        let url = build_url("https://api.example.com/users?sort=asc", &params).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/users?sort=asc&page=2&q=a+b");
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        let err = build_url("not a url", &IndexMap::new()).unwrap_err();
        assert!(err.message.contains("Invalid URL"));
    }

    #[test]
    fn test_flatten_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
        assert_eq!(flat.get("content-type").map(String::as_str), Some("text/plain"));
    }

    #[test]
    fn test_parse_body_falls_back_to_text() {
        assert_eq!(parse_body(r#"{"ok":true}"#.to_string()), json!({"ok": true}));
        assert_eq!(parse_body("hello".to_string()), json!("hello"));
        assert_eq!(parse_body(String::new()), json!(""));
    }
}
