//! Error types for ProbeStack

use thiserror::Error;

/// Main error type for ProbeStack
///
/// Only loading, configuration and persistence surface this type. Request
/// execution downgrades every failure into an `ExecutionResult` instead.
#[derive(Error, Debug)]
pub enum ProbestackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Invalid request '{name}': {reason}")]
    InvalidRequest {
        name: String,
        reason: String,
    },

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Variable persistence error: {0}")]
    Persistence(String),

    #[error("Script engine error: {0}")]
    ScriptEngine(String),

    #[error("Report error: {0}")]
    Report(String),
}

impl From<rquickjs::Error> for ProbestackError {
    fn from(err: rquickjs::Error) -> Self {
        ProbestackError::ScriptEngine(format!("JavaScript error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ProbestackError>;
