//! Variable persistence port
//!
//! The store is seeded from and written back to an injected key/value
//! persistence capability keyed by scope name.

use indexmap::IndexMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::errors::{ProbestackError, Result};

/// Load/save a scope's variables by scope key
pub trait VariablePersistence {
    /// Missing scopes load as an empty map
    fn load(&self, scope_key: &str) -> Result<IndexMap<String, String>>;
    fn save(&self, scope_key: &str, vars: &IndexMap<String, String>) -> Result<()>;
}

/// One JSON object file per scope inside a directory
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    dir: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, scope_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", scope_key))
    }
}

impl VariablePersistence for JsonFilePersistence {
    fn load(&self, scope_key: &str) -> Result<IndexMap<String, String>> {
        let path = self.path_for(scope_key);
        if !path.exists() {
            return Ok(IndexMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ProbestackError::Persistence(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProbestackError::Persistence(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Atomic write: temp file in the same directory, then rename
    fn save(&self, scope_key: &str, vars: &IndexMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ProbestackError::Persistence(format!("Failed to create variables directory: {}", e))
        })?;

        let content = serde_json::to_string_pretty(vars)?;
        let path = self.path_for(scope_key);

        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| ProbestackError::Persistence(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| ProbestackError::Persistence(format!("Failed to write variables: {}", e)))?;
        temp.persist(&path)
            .map_err(|e| ProbestackError::Persistence(format!("Failed to save variables: {}", e)))?;

        Ok(())
    }
}

/// In-memory port, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    scopes: Mutex<IndexMap<String, IndexMap<String, String>>>,
}

impl VariablePersistence for MemoryPersistence {
    fn load(&self, scope_key: &str) -> Result<IndexMap<String, String>> {
        let scopes = self.scopes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(scopes.get(scope_key).cloned().unwrap_or_default())
    }

    fn save(&self, scope_key: &str, vars: &IndexMap<String, String>) -> Result<()> {
        let mut scopes = self.scopes.lock().unwrap_or_else(|e| e.into_inner());
        scopes.insert(scope_key.to_string(), vars.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let persistence = JsonFilePersistence::new(dir.path());
        assert!(persistence.load("globals").unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("vars"));

        let mut vars = IndexMap::new();
        vars.insert("token".to_string(), "abc".to_string());
        persistence.save("environment.dev", &vars).unwrap();

        assert!(dir.path().join("vars/environment.dev.json").exists());
        assert_eq!(persistence.load("environment.dev").unwrap(), vars);
    }

    #[test]
    fn test_malformed_file_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("globals.json"), "[1, 2").unwrap();
        let persistence = JsonFilePersistence::new(dir.path());
        assert!(matches!(
            persistence.load("globals"),
            Err(ProbestackError::Persistence(_))
        ));
    }
}
