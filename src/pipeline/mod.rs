//! Request execution pipeline and collection runner

pub mod collection;
pub mod executor;
pub mod report;
pub mod runner;

pub use collection::{load_collection, load_request};
pub use executor::{PreparedRequest, RequestExecutor};
pub use report::{generate_report, ReportConfig, ReportFormat};
pub use runner::{flatten, CollectionRunner, FlatRequest, RunProgress, ROOT_FOLDER};
