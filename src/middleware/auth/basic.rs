//! HTTP Basic Authentication (RFC 7617)

use base64::Engine;
use indexmap::IndexMap;

use super::{set_header, AuthError};

/// HTTP Basic Authentication credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// Create new Basic auth with username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Basic <base64(username:password)>`
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {}", encoded)
    }

    /// Set the Authorization header
    pub fn apply(&self, headers: &mut IndexMap<String, String>) -> Result<(), AuthError> {
        set_header(headers, "Authorization", self.header_value())
    }
}
