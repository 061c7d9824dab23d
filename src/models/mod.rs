//! Domain data types
//!
//! Request definitions, execution results, collection trees and run reports.

pub mod collection;
pub mod request;
pub mod result;

pub use collection::{Collection, CollectionNode, Folder, RunReport, RunResult, RunStatus};
pub use request::{
    pairs_to_map, ApiKeyLocation, AuthConfig, BodyFormat, KeyValue, RequestBody, RequestDefinition,
};
pub use result::{payload_size, ExecutionError, ExecutionResult, HistoryEntry, TestResult};
