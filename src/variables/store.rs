//! Two-scope variable store and `{{name}}` resolver

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::persistence::VariablePersistence;
use crate::errors::Result;

/// Matches `{{identifier}}` where identifier is one or more word characters
static TEMPLATE_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Variable scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Environment,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Environment => f.write_str("environment"),
        }
    }
}

/// Global and environment-scoped string variables.
///
/// Lookups prefer the environment scope over the global scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    globals: IndexMap<String, String>,
    environment: IndexMap<String, String>,
    environment_name: Option<String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bound to a named environment
    pub fn with_environment(name: impl Into<String>) -> Self {
        Self {
            environment_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn environment_name(&self) -> Option<&str> {
        self.environment_name.as_deref()
    }

    fn scope(&self, scope: Scope) -> &IndexMap<String, String> {
        match scope {
            Scope::Global => &self.globals,
            Scope::Environment => &self.environment,
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut IndexMap<String, String> {
        match scope {
            Scope::Global => &mut self.globals,
            Scope::Environment => &mut self.environment,
        }
    }

    pub fn get(&self, scope: Scope, key: &str) -> Option<&str> {
        self.scope(scope).get(key).map(String::as_str)
    }

    pub fn set(&mut self, scope: Scope, key: impl Into<String>, value: impl Into<String>) {
        self.scope_mut(scope).insert(key.into(), value.into());
    }

    pub fn unset(&mut self, scope: Scope, key: &str) -> Option<String> {
        self.scope_mut(scope).shift_remove(key)
    }

    /// Snapshot of one scope
    pub fn to_object(&self, scope: Scope) -> IndexMap<String, String> {
        self.scope(scope).clone()
    }

    /// Look a key up in both scopes, environment first
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.environment
            .get(key)
            .or_else(|| self.globals.get(key))
            .map(String::as_str)
    }

    /// Replace every `{{name}}` with its resolved value.
    ///
    /// Unknown names keep their literal token.
    pub fn substitute(&self, text: &str) -> String {
        if text.trim().is_empty() || !text.contains("{{") {
            return text.to_string();
        }

        TEMPLATE_VAR_RE
            .replace_all(text, |caps: &Captures| match self.resolve(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Apply a batch of script mutations to one scope
    pub fn apply(&mut self, scope: Scope, set: &IndexMap<String, String>, unset: &[String]) {
        let map = self.scope_mut(scope);
        for key in unset {
            map.shift_remove(key);
        }
        for (key, value) in set {
            map.insert(key.clone(), value.clone());
        }
    }

    /// Persistence key for a scope: `globals` or `environment.<name>`
    pub fn scope_key(&self, scope: Scope) -> Option<String> {
        match scope {
            Scope::Global => Some("globals".to_string()),
            Scope::Environment => self
                .environment_name
                .as_ref()
                .map(|name| format!("environment.{}", name)),
        }
    }

    /// Seed both scopes from a persistence port
    pub fn load_from(&mut self, persistence: &dyn VariablePersistence) -> Result<()> {
        for scope in [Scope::Global, Scope::Environment] {
            if let Some(key) = self.scope_key(scope) {
                let loaded = persistence.load(&key)?;
                self.scope_mut(scope).extend(loaded);
            }
        }
        Ok(())
    }

    /// Write both scopes back to a persistence port
    pub fn save_to(&self, persistence: &dyn VariablePersistence) -> Result<()> {
        for scope in [Scope::Global, Scope::Environment] {
            if let Some(key) = self.scope_key(scope) {
                persistence.save(&key, self.scope(scope))?;
            }
        }
        Ok(())
    }
}
