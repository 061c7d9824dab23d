//! API Key Authentication via header or query parameter

use indexmap::IndexMap;

use super::{set_header, AuthError};
use crate::models::ApiKeyLocation;

/// API key placed in a custom header or a query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyAuth {
    key: String,
    value: String,
    location: ApiKeyLocation,
}

impl ApiKeyAuth {
    pub fn new(key: impl Into<String>, value: impl Into<String>, location: ApiKeyLocation) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            location,
        }
    }

    pub fn location(&self) -> ApiKeyLocation {
        self.location
    }

    /// Add `<key>: <value>` to the headers or `<key>=<value>` to the params
    pub fn apply(
        &self,
        headers: &mut IndexMap<String, String>,
        params: &mut IndexMap<String, String>,
    ) -> Result<(), AuthError> {
        match self.location {
            ApiKeyLocation::Header => set_header(headers, &self.key, self.value.clone()),
            ApiKeyLocation::Query => {
                params.insert(self.key.clone(), self.value.clone());
                Ok(())
            }
        }
    }
}
