//! Authentication middleware
//!
//! Provides authentication via enum variants rather than trait objects:
//! a finite set of methods built from a request's auth descriptor and
//! applied to its header and query-parameter maps.

mod apikey;
mod basic;
mod bearer;

pub use apikey::ApiKeyAuth;
pub use basic::BasicAuth;
pub use bearer::BearerAuth;

use indexmap::IndexMap;
use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::models::{ApiKeyLocation, AuthConfig};

/// Authentication error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// Authentication method enum - replaces trait objects with sum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP Basic Authentication (RFC 7617)
    Basic(BasicAuth),
    /// Bearer token authentication (RFC 6750)
    Bearer(BearerAuth),
    /// API key in a header or query parameter
    ApiKey(ApiKeyAuth),
}

impl Auth {
    /// Create Basic authentication
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic(BasicAuth::new(username, password))
    }

    /// Create Bearer token authentication
    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer(BearerAuth::new(token))
    }

    /// Create API Key authentication
    pub fn api_key(key: impl Into<String>, value: impl Into<String>, location: ApiKeyLocation) -> Self {
        Auth::ApiKey(ApiKeyAuth::new(key, value, location))
    }

    /// Build from a request's auth descriptor.
    ///
    /// Returns `None` for `none` and for descriptors with missing
    /// credentials (empty token, username or password, key or value).
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        match config {
            AuthConfig::None => None,
            AuthConfig::Bearer { token } if !token.is_empty() => Some(Auth::bearer(token)),
            AuthConfig::Basic { username, password }
                if !username.is_empty() && !password.is_empty() =>
            {
                Some(Auth::basic(username, password))
            }
            AuthConfig::ApiKey { key, value, add_to } if !key.is_empty() && !value.is_empty() => {
                Some(Auth::api_key(key, value, *add_to))
            }
            _ => None,
        }
    }

    /// Apply authentication to the request's headers and params
    pub fn apply(
        &self,
        headers: &mut IndexMap<String, String>,
        params: &mut IndexMap<String, String>,
    ) -> Result<(), AuthError> {
        match self {
            Auth::Basic(auth) => auth.apply(headers),
            Auth::Bearer(auth) => auth.apply(headers),
            Auth::ApiKey(auth) => auth.apply(headers, params),
        }
    }

    /// Authentication type name for display/debugging
    pub fn type_name(&self) -> &'static str {
        match self {
            Auth::Basic(_) => "basic",
            Auth::Bearer(_) => "bearer",
            Auth::ApiKey(_) => "apikey",
        }
    }
}

/// Insert a header, replacing any existing entry with the same name in any case
pub(crate) fn set_header(
    headers: &mut IndexMap<String, String>,
    name: &str,
    value: String,
) -> Result<(), AuthError> {
    HeaderName::try_from(name).map_err(|e| AuthError::InvalidHeaderName(e.to_string()))?;
    HeaderValue::from_str(&value).map_err(|e| AuthError::InvalidHeader(e.to_string()))?;

    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
    Ok(())
}
