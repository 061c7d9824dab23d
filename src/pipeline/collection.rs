//! Loading collections and single requests from disk
//!
//! JSON, YAML and TOML are accepted, chosen by file extension.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::errors::ProbestackError;
use crate::models::{Collection, CollectionNode, RequestDefinition};

/// Maximum accepted file size (1 MB)
const MAX_COLLECTION_FILE_SIZE: u64 = 1024 * 1024;

/// Load and validate a collection file
pub fn load_collection(path: &Path) -> Result<Collection, ProbestackError> {
    let collection: Collection = load_document(path, "collection")?;
    validate_collection(&collection)?;
    Ok(collection)
}

/// Load and validate a single request definition file
pub fn load_request(path: &Path) -> Result<RequestDefinition, ProbestackError> {
    let request: RequestDefinition = load_document(path, "request")?;
    request.validate()?;
    Ok(request)
}

fn load_document<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T, ProbestackError> {
    // Check file size before loading to prevent OOM
    let file_size = fs::metadata(path)?.len();
    if file_size > MAX_COLLECTION_FILE_SIZE {
        return Err(ProbestackError::Collection(format!(
            "{} file too large: {} bytes (max {} bytes)",
            kind, file_size, MAX_COLLECTION_FILE_SIZE
        )));
    }

    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let parsed: Result<T, String> = match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
        _ => {
            // Unknown extension: try JSON, then YAML, then TOML
            serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| e.to_string())
                .or_else(|_| toml::from_str(&content).map_err(|e| e.to_string()))
        }
    };

    parsed.map_err(|e| {
        ProbestackError::Collection(format!("Failed to parse {} {}: {}", kind, path.display(), e))
    })
}

/// Validate basic collection structure
fn validate_collection(collection: &Collection) -> Result<(), ProbestackError> {
    if collection.name.trim().is_empty() {
        return Err(ProbestackError::Collection("Collection must have a name".to_string()));
    }
    if collection.request_count() == 0 {
        return Err(ProbestackError::Collection(format!(
            "Collection '{}' contains no requests",
            collection.name
        )));
    }
    validate_nodes(&collection.items)
}

fn validate_nodes(nodes: &[CollectionNode]) -> Result<(), ProbestackError> {
    for node in nodes {
        match node {
            CollectionNode::Request(request) => request.validate()?,
            CollectionNode::Folder(folder) => {
                if folder.name.trim().is_empty() {
                    return Err(ProbestackError::Collection("Folder must have a name".to_string()));
                }
                validate_nodes(&folder.items)?;
            }
        }
    }
    Ok(())
}
