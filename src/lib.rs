//! ProbeStack library interface
//!
//! Request execution and scripting engine for HTTP API collections.
//!
//! # Module Organization
//!
//! - [`models`] - Request definitions, results, collections and run reports
//! - [`variables`] - Variable store, `{{name}}` resolution and persistence
//! - [`scripting`] - Sandboxed pre-request and test scripts
//! - [`pipeline`] - Request execution, collection runner and reports
//! - [`client`] - HTTP client capability and its reqwest adapter
//! - [`errors`] - Error types (ProbestackError, Result)
//! - [`status`] - Exit status codes (ExitStatus)
//! - [`core`] - Command dispatch for the binary

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod errors;
pub mod http;
pub mod middleware;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scripting;
pub mod status;
pub mod variables;

pub use errors::{ProbestackError, Result};
pub use status::ExitStatus;
