//! Bearer Token Authentication (RFC 6750)

use indexmap::IndexMap;

use super::{set_header, AuthError};

/// Bearer token authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Create new Bearer auth with token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Set the Authorization header
    pub fn apply(&self, headers: &mut IndexMap<String, String>) -> Result<(), AuthError> {
        set_header(headers, "Authorization", format!("Bearer {}", self.token))
    }
}
